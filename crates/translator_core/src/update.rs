use crate::{
    JobHandle, JobPhase, ProgressEffect, ProgressMsg, ProgressState, SubmissionState, SubmitEffect,
    SubmitMsg, SubmitPhase,
};

const UPLOAD_FALLBACK: &str = "Upload failed";
const START_FALLBACK: &str = "Failed to start translation";

/// Pure update function for the submission controller.
pub fn update_submission(
    mut state: SubmissionState,
    msg: SubmitMsg,
) -> (SubmissionState, Vec<SubmitEffect>) {
    // The handoff is final; nothing on this side matters afterwards.
    if state.has_navigated() {
        return (state, Vec::new());
    }

    let effects = match msg {
        // Edits are locked while the upload/start sequence is in flight so both
        // requests see the same snapshot.
        SubmitMsg::FileChosen(_)
        | SubmitMsg::FileCleared
        | SubmitMsg::ProviderChanged(_)
        | SubmitMsg::ModelChanged(_)
        | SubmitMsg::ApiKeyEdited(_)
            if state.is_busy() =>
        {
            Vec::new()
        }
        SubmitMsg::FileChosen(file) => match file.validate() {
            Ok(()) => {
                state.select_file(file);
                Vec::new()
            }
            Err(err) => {
                let message = err.to_string();
                state.set_error(message.clone());
                vec![SubmitEffect::ShowError { message }]
            }
        },
        SubmitMsg::FileCleared => {
            state.clear_file();
            Vec::new()
        }
        SubmitMsg::ProviderChanged(provider_id) => {
            state.change_provider(&provider_id);
            Vec::new()
        }
        SubmitMsg::ModelChanged(model_id) => {
            state.change_model(&model_id);
            Vec::new()
        }
        SubmitMsg::ApiKeyEdited(api_key) => {
            state.set_api_key(api_key);
            Vec::new()
        }
        SubmitMsg::SubmitClicked => {
            if state.is_busy() || !state.is_submittable() {
                Vec::new()
            } else {
                match state.begin_upload() {
                    Some(file) => vec![SubmitEffect::Upload { file }],
                    None => Vec::new(),
                }
            }
        }
        SubmitMsg::UploadFinished(result) => {
            if *state.phase() != SubmitPhase::Uploading {
                return (state, Vec::new());
            }
            match result {
                Ok(file_id) if !file_id.trim().is_empty() => {
                    match state.begin_start_job(file_id) {
                        Some(request) => vec![SubmitEffect::StartJob(request)],
                        None => abort(&mut state, None, UPLOAD_FALLBACK),
                    }
                }
                Ok(_) => abort(
                    &mut state,
                    Some("server returned no file id".to_string()),
                    UPLOAD_FALLBACK,
                ),
                Err(reason) => abort(&mut state, reason, UPLOAD_FALLBACK),
            }
        }
        SubmitMsg::StartJobFinished(result) => {
            if *state.phase() != SubmitPhase::StartingJob {
                return (state, Vec::new());
            }
            match result {
                Ok(task_id) => match JobHandle::parse(&task_id) {
                    Some(job) => {
                        state.navigate(job.clone());
                        vec![SubmitEffect::Navigate { job }]
                    }
                    None => abort(
                        &mut state,
                        Some(format!("server returned an unusable task id {task_id:?}")),
                        START_FALLBACK,
                    ),
                },
                Err(reason) => abort(&mut state, reason, START_FALLBACK),
            }
        }
        SubmitMsg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn abort(
    state: &mut SubmissionState,
    reason: Option<String>,
    fallback: &str,
) -> Vec<SubmitEffect> {
    let message = reason
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    state.abort_submission(message.clone());
    vec![SubmitEffect::ShowError { message }]
}

/// Pure update function for the progress controller.
pub fn update_progress(
    mut state: ProgressState,
    msg: ProgressMsg,
) -> (ProgressState, Vec<ProgressEffect>) {
    let effects = match msg {
        ProgressMsg::Start { task_id } => {
            if state.is_started() {
                return (state, Vec::new());
            }
            match JobHandle::parse(&task_id) {
                None => {
                    state.mark_invalid_task();
                    Vec::new()
                }
                Some(job) => {
                    state.begin_polling(job.clone());
                    let seq = state.next_seq();
                    vec![
                        ProgressEffect::FetchStatus { job, seq },
                        ProgressEffect::StartTimer {
                            interval: state.poll_interval(),
                        },
                    ]
                }
            }
        }
        ProgressMsg::Tick => {
            if !state.is_polling() {
                Vec::new()
            } else if state.attempts_exhausted() {
                state.time_out();
                vec![ProgressEffect::StopTimer]
            } else {
                match state.job().cloned() {
                    Some(job) => {
                        let seq = state.next_seq();
                        vec![ProgressEffect::FetchStatus { job, seq }]
                    }
                    None => Vec::new(),
                }
            }
        }
        ProgressMsg::StatusReceived { seq, result } => {
            // Late responses after a terminal phase or time-out are dropped.
            if !state.is_polling() {
                return (state, Vec::new());
            }
            match result {
                Err(_) => {
                    state.record_poll_failure();
                    Vec::new()
                }
                Ok(_) if !state.accepts(seq) => Vec::new(),
                Ok(status) => {
                    let phase = status.phase;
                    state.apply_status(seq, status);
                    if !phase.is_terminal() {
                        Vec::new()
                    } else {
                        // Stop first: the terminal render and the cancellation
                        // leave this update together.
                        let mut effects = vec![ProgressEffect::StopTimer];
                        if phase == JobPhase::Completed {
                            if let Some(job) = state.job().cloned() {
                                state.begin_preview();
                                effects.push(ProgressEffect::FetchPreview { job });
                            }
                        }
                        effects
                    }
                }
            }
        }
        ProgressMsg::PreviewLoaded(result) => {
            if state.preview_pending() {
                state.finish_preview(result.as_deref().ok());
            }
            Vec::new()
        }
        ProgressMsg::NoOp => Vec::new(),
    };

    (state, effects)
}
