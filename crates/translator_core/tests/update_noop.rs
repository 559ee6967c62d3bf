use translator_core::{update_submission, SubmissionState, SubmitMsg};

#[test]
fn update_is_noop() {
    let state = SubmissionState::new();
    let (next, effects) = update_submission(state.clone(), SubmitMsg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
