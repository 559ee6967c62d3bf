use std::path::PathBuf;

use client_logging::{client_debug, client_info, client_warn};
use translator_core::{JobHandle, ProgressEffect, ProgressMsg, SubmitEffect, SubmitMsg};
use translator_engine::{DownloadError, EngineEvent, EngineHandle};

/// Hands core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Executes the network effects and returns the ones the session must
    /// act on itself (errors and the navigation handoff).
    pub fn run_submit(&self, effects: Vec<SubmitEffect>) -> Vec<SubmitEffect> {
        let mut handoff = Vec::new();
        for effect in effects {
            match effect {
                SubmitEffect::Upload { file } => self.engine.upload(file),
                SubmitEffect::StartJob(request) => self.engine.start_translation(request),
                other @ (SubmitEffect::ShowError { .. } | SubmitEffect::Navigate { .. }) => {
                    handoff.push(other)
                }
            }
        }
        handoff
    }

    pub fn run_progress(&self, effects: Vec<ProgressEffect>) {
        for effect in effects {
            match effect {
                ProgressEffect::FetchStatus { job, seq } => {
                    client_debug!("Polling status of {} (seq {})", job, seq);
                    self.engine.poll_status(job, seq);
                }
                ProgressEffect::StartTimer { interval } => self.engine.start_timer(interval),
                ProgressEffect::StopTimer => self.engine.stop_timer(),
                ProgressEffect::FetchPreview { job } => self.engine.fetch_preview(job),
            }
        }
    }

    /// Blocks until an event relevant to the submission arrives.
    /// `None` once the engine has stopped.
    pub fn next_submit_msg(&self) -> Option<SubmitMsg> {
        loop {
            if let Some(msg) = submit_msg(self.engine.recv()?) {
                return Some(msg);
            }
        }
    }

    /// Blocks until an event relevant to progress tracking arrives.
    pub fn next_progress_msg(&self) -> Option<ProgressMsg> {
        loop {
            if let Some(msg) = progress_msg(self.engine.recv()?) {
                return Some(msg);
            }
        }
    }

    /// Downloads the artifact and waits for the result, discarding stray
    /// progress events still in flight.
    pub fn download(&self, job: JobHandle, dir: PathBuf) -> Option<Result<PathBuf, DownloadError>> {
        self.engine.download(job, dir);
        loop {
            match self.engine.recv()? {
                EngineEvent::Downloaded(result) => return Some(result),
                other => client_debug!("Ignoring {:?} while downloading", other),
            }
        }
    }
}

pub fn submit_msg(event: EngineEvent) -> Option<SubmitMsg> {
    match event {
        EngineEvent::Uploaded(result) => Some(SubmitMsg::UploadFinished(result.map_err(|err| {
            client_warn!("Upload failed: {}", err);
            err.reason()
        }))),
        EngineEvent::TranslationStarted(result) => {
            Some(SubmitMsg::StartJobFinished(result.map_err(|err| {
                client_warn!("Start translation failed: {}", err);
                err.reason()
            })))
        }
        other => {
            client_debug!("Ignoring {:?} during submission", other);
            None
        }
    }
}

pub fn progress_msg(event: EngineEvent) -> Option<ProgressMsg> {
    match event {
        EngineEvent::PollTick => Some(ProgressMsg::Tick),
        EngineEvent::StatusPolled { seq, result } => Some(ProgressMsg::StatusReceived {
            seq,
            result: result.map_err(|err| err.to_string()),
        }),
        EngineEvent::PreviewFetched(result) => Some(ProgressMsg::PreviewLoaded(
            result.map_err(|err| {
                client_info!("Preview unavailable: {}", err);
                err.to_string()
            }),
        )),
        other => {
            client_debug!("Ignoring {:?} during progress tracking", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use translator_core::{JobPhase, JobStatus};
    use translator_engine::{ApiError, ClientSettings, ReqwestApi};

    #[test]
    fn ticks_and_statuses_map_to_progress_messages() {
        assert_eq!(progress_msg(EngineEvent::PollTick), Some(ProgressMsg::Tick));

        let status = JobStatus::new(JobPhase::Processing, 40, "Translating");
        assert_eq!(
            progress_msg(EngineEvent::StatusPolled {
                seq: 3,
                result: Ok(status.clone())
            }),
            Some(ProgressMsg::StatusReceived {
                seq: 3,
                result: Ok(status)
            })
        );
    }

    #[test]
    fn submission_events_are_not_progress_messages() {
        assert_eq!(progress_msg(EngineEvent::Uploaded(Ok("abc".into()))), None);
        assert_eq!(submit_msg(EngineEvent::PollTick), None);
    }

    #[test]
    fn upload_success_carries_file_id() {
        assert_eq!(
            submit_msg(EngineEvent::Uploaded(Ok("abc".into()))),
            Some(SubmitMsg::UploadFinished(Ok("abc".into())))
        );
    }

    #[test]
    fn setup_failure_leaves_reason_to_fallback() {
        // ApiError has no public constructor; build one from a real bad URL.
        let err: ApiError = ReqwestApi::new(ClientSettings {
            base_url: "not a url".into(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        let reason = err.reason();
        match submit_msg(EngineEvent::TranslationStarted(Err(err))) {
            Some(SubmitMsg::StartJobFinished(Err(mapped))) => {
                assert_eq!(mapped, reason);
                assert_eq!(mapped, None);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
