// tests/execution_state.rs

use proptest::prelude::*;

use termexec::command::{ExecutionCommand, ExecutionRequest, ExecutionState};

const ALL: [ExecutionState; 5] = [
    ExecutionState::PreExecution,
    ExecutionState::Executing,
    ExecutionState::Executed,
    ExecutionState::Success,
    ExecutionState::Failed,
];

#[test]
fn states_are_ordered_with_failed_last() {
    let mut sorted = ALL;
    sorted.reverse();
    sorted.sort();
    assert_eq!(sorted, ALL);
    assert!(ExecutionState::Success < ExecutionState::Failed);
}

#[test]
fn success_is_a_dead_end() {
    for next in ALL {
        assert!(
            !ExecutionState::Success.can_transition_to(next),
            "Success -> {next} should be rejected"
        );
    }
}

#[test]
fn failed_only_accepts_failed() {
    for next in ALL {
        assert_eq!(
            ExecutionState::Failed.can_transition_to(next),
            next == ExecutionState::Failed
        );
    }
}

#[test]
fn rejected_transition_leaves_state_untouched() {
    let cmd = ExecutionCommand::new(ExecutionRequest::default());
    assert!(cmd.set_state(ExecutionState::Executed));
    assert!(!cmd.set_state(ExecutionState::Executing));

    assert_eq!(cmd.current_state(), ExecutionState::Executed);
    assert_eq!(cmd.previous_state(), ExecutionState::PreExecution);
}

#[test]
fn display_names() {
    assert_eq!(ExecutionState::PreExecution.to_string(), "Pre-Execution");
    assert_eq!(ExecutionState::Failed.to_string(), "Failed");
    assert!(ExecutionState::Success.is_terminal());
    assert!(!ExecutionState::Executed.is_terminal());
}

fn state_strategy() -> impl Strategy<Value = ExecutionState> {
    prop::sample::select(ALL.to_vec())
}

proptest! {
    #[test]
    fn observed_states_never_go_backwards(requests in prop::collection::vec(state_strategy(), 0..32)) {
        let cmd = ExecutionCommand::new(ExecutionRequest::default());
        let mut last = cmd.current_state();

        for next in requests {
            let was = cmd.current_state();
            let accepted = cmd.set_state(next);
            let now = cmd.current_state();

            prop_assert!(now >= last);
            prop_assert_eq!(accepted, was.can_transition_to(next));
            if was == ExecutionState::Success {
                prop_assert_eq!(now, ExecutionState::Success);
            }
            last = now;
        }
    }
}
