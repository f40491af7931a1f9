use bankers_core::{
    safety::{is_safe, replay_sequence},
    scenario::ScenarioGenerator,
    state::SystemState,
    types::Units,
};

/// The textbook five-process, three-resource example.
fn textbook() -> SystemState {
    SystemState::new(
        vec![3, 3, 2],
        vec![
            vec![7, 5, 3],
            vec![3, 2, 2],
            vec![9, 0, 2],
            vec![2, 2, 2],
            vec![4, 3, 3],
        ],
        vec![
            vec![0, 1, 0],
            vec![2, 0, 0],
            vec![3, 0, 2],
            vec![2, 1, 1],
            vec![0, 0, 2],
        ],
    )
    .expect("textbook state")
}

#[test]
fn textbook_state_is_safe_with_every_process_once() {
    let state = textbook();
    assert_eq!(
        state.need,
        vec![
            vec![7, 4, 3],
            vec![1, 2, 2],
            vec![6, 0, 0],
            vec![0, 1, 1],
            vec![4, 3, 1],
        ]
    );

    let report = state.check_safety();
    assert!(report.safe);
    assert_eq!(report.sequence, vec![1, 3, 4, 0, 2]);

    let mut seen = report.sequence.clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert!(replay_sequence(&state.available, &state.allocation, &state.need, &report.sequence));
}

#[test]
fn no_processes_is_trivially_safe() {
    let none: Vec<Vec<Units>> = vec![];
    let report = is_safe(&[4, 4], &none, &none);
    assert!(report.safe);
    assert!(report.sequence.is_empty());
}

#[test]
fn no_resource_types_finishes_everyone_in_index_order() {
    let rows: Vec<Vec<Units>> = vec![vec![]; 4];
    let report = is_safe(&[], &rows, &rows);
    assert!(report.safe);
    assert_eq!(report.sequence, vec![0, 1, 2, 3]);
    assert_eq!(report.passes, 2);
}

#[test]
fn check_is_deterministic_and_leaves_inputs_alone() {
    let state = textbook();
    let before = state.clone();
    let first = state.check_safety();
    let second = state.check_safety();
    assert_eq!(first, second);
    assert_eq!(state, before);
}

#[test]
fn unsatisfiable_need_is_unsafe() {
    let state = SystemState::new(
        vec![1, 0],
        vec![vec![1, 0], vec![3, 3]],
        vec![vec![0, 0], vec![1, 1]],
    )
    .expect("state");
    let report = state.check_safety();
    assert!(!report.safe);
    assert_eq!(report.sequence, vec![0]);
}

#[test]
fn states_with_a_planted_order_are_always_found_safe() {
    for seed in 0..200u64 {
        let mut generator = ScenarioGenerator::new(seed);
        let processes = (seed % 7) as usize;
        let resources = (seed % 5) as usize;
        let (state, planted) = generator.safe_state(processes, resources);

        assert!(
            replay_sequence(&state.available, &state.allocation, &state.need, &planted),
            "seed {seed}: planted order does not replay"
        );

        let report = state.check_safety();
        assert!(report.safe, "seed {seed}: planted-safe state reported unsafe");
        assert_eq!(report.sequence.len(), processes, "seed {seed}");
        assert!(
            replay_sequence(&state.available, &state.allocation, &state.need, &report.sequence),
            "seed {seed}: reported sequence does not replay"
        );
    }
}

#[test]
fn reported_sequence_of_any_safe_state_replays() {
    let mut generator = ScenarioGenerator::new(0xBA4C_E125);
    for _ in 0..300 {
        let case = generator.random_case();
        let report = case.state.check_safety();
        if report.safe {
            assert!(replay_sequence(
                &case.state.available,
                &case.state.allocation,
                &case.state.need,
                &report.sequence
            ));
        } else {
            assert!(report.sequence.len() < case.state.processes());
        }
    }
}
