use super::*;

fn s(v: &str) -> String {
    v.to_string()
}

/// Two agents, but only three of the four move combinations are legal.
fn constrained() -> TableGame {
    TableGame::builder(["p", "q"])
        .transition("start", ["left", "left"], "a")
        .transition("start", ["left", "right"], "b")
        .transition("start", ["right", "left"], "c")
        .terminal("a", [100, 0])
        .terminal("b", [50, 50])
        .terminal("c", [0, 100])
        .goals("start", [40, 60])
        .build()
        .unwrap()
}

#[test]
fn test_builder_defaults_initial_state_to_first_source() {
    let game = constrained();
    assert_eq!(game.initial_state(), "start");
    assert!(!game.is_terminal(&s("start")));
    assert!(game.is_terminal(&s("a")));
}

#[test]
fn test_legal_moves_follow_table_order() {
    let game = constrained();
    assert_eq!(
        game.legal_moves(&s("start"), &s("p")).unwrap(),
        vec![s("left"), s("right")]
    );
    assert_eq!(
        game.legal_moves(&s("start"), &s("q")).unwrap(),
        vec![s("left"), s("right")]
    );
    assert!(game.legal_moves(&s("a"), &s("p")).unwrap().is_empty());
}

#[test]
fn test_joint_moves_respect_constraints() {
    let game = constrained();
    // "right" for p only combines with "left" for q
    let joints = game
        .legal_joint_moves(&s("start"), &s("p"), &s("right"))
        .unwrap();
    assert_eq!(joints, vec![vec![s("right"), s("left")]]);

    let joints = game
        .legal_joint_moves(&s("start"), &s("q"), &s("left"))
        .unwrap();
    assert_eq!(joints.len(), 2);
}

#[test]
fn test_next_state_and_goals() {
    let game = constrained();
    let next = game
        .next_state(&s("start"), &[s("left"), s("right")])
        .unwrap();
    assert_eq!(next, "b");
    assert_eq!(game.goal(&next, &s("q")).unwrap(), 50);
    assert_eq!(game.goal(&s("start"), &s("p")).unwrap(), 40);

    let err = game
        .next_state(&s("start"), &[s("right"), s("right")])
        .unwrap_err();
    assert!(matches!(err, DefinitionError::Transition(_)));
}

#[test]
fn test_unknown_agent_and_missing_goal_are_definition_errors() {
    let game = constrained();
    assert!(matches!(
        game.legal_moves(&s("start"), &s("nobody")),
        Err(DefinitionError::Move(_))
    ));

    let game = TableGame::builder(["solo"])
        .transition("x", ["go"], "y")
        .build()
        .unwrap();
    assert!(matches!(
        game.goal(&s("y"), &s("solo")),
        Err(DefinitionError::Goal { .. })
    ));
}

#[test]
fn test_random_joint_move_only_picks_listed_combinations() {
    let game = constrained();
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    for _ in 0..100 {
        let joint = game.random_joint_move(&s("start"), &mut rng).unwrap();
        assert_ne!(joint, vec![s("right"), s("right")]);
        assert!(game.next_state(&s("start"), &joint).is_ok());
    }
    assert!(matches!(
        game.random_joint_move(&s("a"), &mut rng),
        Err(DefinitionError::NoLegalMoves { .. })
    ));
}

#[test]
fn test_build_rejects_malformed_tables() {
    let err = TableGame::builder(Vec::<String>::new()).build().unwrap_err();
    assert_eq!(err, TableError::NoAgents);

    let err = TableGame::builder(["a"]).build().unwrap_err();
    assert_eq!(err, TableError::NoInitialState);

    let err = TableGame::builder(["a", "b"])
        .transition("x", ["m"], "y")
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::JointArity { expected: 2, actual: 1, .. }));

    let err = TableGame::builder(["a"])
        .transition("x", ["m"], "y")
        .transition("x", ["m"], "z")
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::DuplicateTransition { .. }));

    let err = TableGame::builder(["a", "b"])
        .transition("x", ["m", "n"], "y")
        .terminal("y", [1])
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::GoalArity { .. }));

    let err = TableGame::builder(["a"])
        .transition("x", ["m"], "y")
        .terminal("x", [0])
        .build()
        .unwrap_err();
    assert_eq!(err, TableError::TerminalWithMoves(s("x")));
}

#[test]
fn test_random_tree_shape() {
    let game = TableGame::random_tree(11, 2, 3, 2);
    let root = game.initial_state();

    assert_eq!(game.agents().len(), 2);
    assert_eq!(game.joint_moves(&root).count(), 9);
    assert_eq!(game.legal_moves(&root, &s("agent1")).unwrap().len(), 3);
    assert_eq!(game.terminal_states().count(), 81);

    for leaf in game.terminal_states() {
        let first = game.goal(leaf, &s("agent0")).unwrap();
        let second = game.goal(leaf, &s("agent1")).unwrap();
        assert!((0..=100).contains(&first));
        assert_eq!(first + second, 100);
    }
}

#[test]
fn test_random_tree_is_reproducible() {
    let a = TableGame::random_tree(5, 1, 2, 3);
    let b = TableGame::random_tree(5, 1, 2, 3);
    for leaf in a.terminal_states() {
        assert_eq!(
            a.goal(leaf, &s("agent0")).unwrap(),
            b.goal(leaf, &s("agent0")).unwrap()
        );
    }
}

#[test]
fn test_playouts_reach_leaves_of_random_tree() {
    let game = TableGame::random_tree(8, 3, 2, 4);
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let charge = game
        .depth_charge(&game.initial_state(), &s("agent2"), &mut rng)
        .unwrap();
    assert_eq!(charge.depth, 4);
}
