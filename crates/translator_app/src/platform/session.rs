//! Single-threaded drivers for the two controllers.
//!
//! Each loop blocks on the next engine event, feeds it to the core as a
//! message, renders when the state is dirty and hands the resulting effects
//! back to the engine.

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use client_logging::{client_info, client_warn};
use translator_core::{
    update_progress, update_submission, JobHandle, ProgressMsg, ProgressOutcome, ProgressState,
    SelectedFile, SubmissionState, SubmissionView, SubmitEffect, SubmitMsg, SubmitPhase,
};

use super::effects::EffectRunner;
use super::render::Renderer;

/// What the user would have entered into the submission form.
pub struct SubmitForm {
    pub file: SelectedFile,
    pub provider: String,
    pub model: Option<String>,
    pub api_key: String,
}

impl SubmitForm {
    fn into_messages(self) -> VecDeque<SubmitMsg> {
        let mut inbox = VecDeque::from([
            SubmitMsg::FileChosen(self.file),
            SubmitMsg::ProviderChanged(self.provider),
        ]);
        if let Some(model) = self.model {
            inbox.push_back(SubmitMsg::ModelChanged(model));
        }
        inbox.push_back(SubmitMsg::ApiKeyEdited(self.api_key));
        inbox.push_back(SubmitMsg::SubmitClicked);
        inbox
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Navigated(JobHandle),
    Rejected(String),
}

pub struct WatchOptions {
    pub poll_interval: Duration,
    pub max_poll_attempts: Option<u32>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct WatchReport {
    pub outcome: Option<ProgressOutcome>,
    pub polls_issued: u64,
    pub saved: Option<PathBuf>,
}

/// Runs the upload/start sequence. Ends at the navigation handoff or at the
/// first error the controller surfaces.
pub fn run_submit<W: Write>(
    runner: &EffectRunner,
    form: SubmitForm,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<SubmitOutcome> {
    let mut state = SubmissionState::new();
    let mut inbox = form.into_messages();

    loop {
        let msg = match inbox.pop_front() {
            Some(msg) => msg,
            // The form is exhausted and submit did not start anything.
            None if *state.phase() == SubmitPhase::Editing => {
                return Ok(SubmitOutcome::Rejected(incomplete_reason(&state.view())));
            }
            None => runner
                .next_submit_msg()
                .context("engine stopped before the submission finished")?,
        };

        let (next, effects) = update_submission(state, msg);
        state = next;
        if state.consume_dirty() {
            renderer.submission(&state.view())?;
        }

        for effect in runner.run_submit(effects) {
            match effect {
                SubmitEffect::ShowError { message } => {
                    client_warn!("Submission stopped: {}", message);
                    return Ok(SubmitOutcome::Rejected(message));
                }
                SubmitEffect::Navigate { job } => {
                    client_info!("Translation task {} created", job);
                    renderer.navigated(&job)?;
                    return Ok(SubmitOutcome::Navigated(job));
                }
                SubmitEffect::Upload { .. } | SubmitEffect::StartJob(_) => {}
            }
        }
    }
}

fn incomplete_reason(view: &SubmissionView) -> String {
    if view.file.is_none() {
        "Choose a file to translate".to_string()
    } else if view.provider_id.is_none() {
        "Choose a provider".to_string()
    } else if view.selected_model.is_none() {
        "Choose a model".to_string()
    } else {
        "Enter an API key".to_string()
    }
}

/// Follows a job until it settles, then optionally saves the artifact.
pub fn run_watch<W: Write>(
    runner: &EffectRunner,
    task_id: &str,
    options: WatchOptions,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<WatchReport> {
    let mut state = ProgressState::new()
        .with_poll_interval(options.poll_interval)
        .with_max_poll_attempts(options.max_poll_attempts);
    let mut msg = ProgressMsg::Start {
        task_id: task_id.to_string(),
    };

    loop {
        let (next, effects) = update_progress(state, msg);
        state = next;
        if state.consume_dirty() {
            renderer.progress(&state.view())?;
        }
        runner.run_progress(effects);

        if state.is_settled() {
            break;
        }
        msg = runner
            .next_progress_msg()
            .context("engine stopped while following the job")?;
    }

    let outcome = state.view().outcome;
    let mut saved = None;
    if let (Some(ProgressOutcome::Succeeded), Some(dir), Some(job)) =
        (outcome, options.download_dir, state.job().cloned())
    {
        let path = runner
            .download(job, dir)
            .context("engine stopped during the download")?
            .context("failed to save the translated file")?;
        renderer.saved(&path)?;
        saved = Some(path);
    }

    Ok(WatchReport {
        outcome,
        polls_issued: state.polls_issued(),
        saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;
    use translator_engine::{ClientSettings, EngineHandle};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FAST_POLL: Duration = Duration::from_millis(200);

    fn runner_for(server: &MockServer) -> EffectRunner {
        let engine = EngineHandle::new(ClientSettings {
            base_url: server.uri(),
            ..ClientSettings::default()
        })
        .unwrap();
        EffectRunner::new(engine)
    }

    fn form() -> SubmitForm {
        SubmitForm {
            file: SelectedFile::new("paper.md", b"# Title\n\nBody".to_vec()),
            provider: "openai".into(),
            model: Some("gpt-4o".into()),
            api_key: "sk-test-key".into(),
        }
    }

    fn watch_options() -> WatchOptions {
        WatchOptions {
            poll_interval: FAST_POLL,
            max_poll_attempts: None,
            download_dir: None,
        }
    }

    async fn status_requests(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().starts_with("/api/status/"))
            .count()
    }

    fn status_body(status: &str, progress: i64, message: &str) -> serde_json::Value {
        json!({
            "task_id": "xyz",
            "status": status,
            "progress": progress,
            "message": message,
            "result_file": null
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_upload_never_starts_a_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "too large"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "xyz"})))
            .expect(0)
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, form(), &mut renderer)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected("too large".into()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn successful_submission_navigates_to_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": "abc"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/translate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"task_id": "xyz", "status": "pending"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, form(), &mut renderer)).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Navigated(JobHandle::parse("xyz").unwrap())
        );
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Task xyz started (/translate/xyz)"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_upload_reply_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "xyz"})))
            .expect(0)
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, form(), &mut renderer)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected("Upload failed".into()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_failure_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": "abc"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/translate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, form(), &mut renderer)).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected("Failed to start translation".into())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unsupported_file_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let bad_form = SubmitForm {
            file: SelectedFile::new("slides.pptx", b"x".to_vec()),
            ..form()
        };
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, bad_form, &mut renderer)).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected(message) if message.contains("slides.pptx")));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_api_key_is_not_submitted() {
        let server = MockServer::start().await;
        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let keyless = SubmitForm {
            api_key: "   ".into(),
            ..form()
        };
        let outcome =
            tokio::task::block_in_place(|| run_submit(&runner, keyless, &mut renderer)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected("Enter an API key".into()));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completed_job_stops_polling_and_loads_preview_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/xyz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(status_body("processing", 40, "Translating")),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("completed", 100, "Done")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/xyz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("# Translated\n\nHello", "text/markdown; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let report = tokio::task::block_in_place(|| {
            run_watch(&runner, "xyz", watch_options(), &mut renderer)
        })
        .unwrap();

        assert_eq!(report.outcome, Some(ProgressOutcome::Succeeded));
        assert_eq!(report.polls_issued, 2);

        // No poll may follow the terminal status.
        tokio::time::sleep(FAST_POLL * 3).await;
        assert_eq!(status_requests(&server).await, 2);

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Translating... [####------] 40% Translating"));
        assert!(out.contains("Translation complete [##########] 100% Done"));
        assert!(out.contains("# Translated\n\nHello"));
        assert!(out.contains("/api/download/xyz"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_job_fetches_no_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/xyz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(status_body("failed", 30, "Provider rejected key")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let options = WatchOptions {
            download_dir: Some(PathBuf::from("unused")),
            ..watch_options()
        };
        let report =
            tokio::task::block_in_place(|| run_watch(&runner, "xyz", options, &mut renderer))
                .unwrap();
        assert_eq!(report.outcome, Some(ProgressOutcome::Failed));
        assert_eq!(report.saved, None);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Translation failed"));
        assert!(out.contains("Provider rejected key"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn attempt_ceiling_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("pending", 0, "Queued")))
            .mount(&server)
            .await;

        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let options = WatchOptions {
            max_poll_attempts: Some(2),
            ..watch_options()
        };
        let report =
            tokio::task::block_in_place(|| run_watch(&runner, "xyz", options, &mut renderer))
                .unwrap();
        assert_eq!(report.outcome, Some(ProgressOutcome::TimedOut));
        assert_eq!(report.polls_issued, 2);

        tokio::time::sleep(FAST_POLL * 2).await;
        assert_eq!(status_requests(&server).await, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unusable_task_id_makes_no_requests() {
        let server = MockServer::start().await;
        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let report = tokio::task::block_in_place(|| {
            run_watch(&runner, "  ", watch_options(), &mut renderer)
        })
        .unwrap();
        assert_eq!(report.outcome, Some(ProgressOutcome::InvalidTask));
        assert_eq!(report.polls_issued, 0);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completed_job_is_saved_when_requested() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body("completed", 100, "Done")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("# Saved", "text/markdown"))
            .expect(2)
            .mount(&server)
            .await;

        let out_dir = TempDir::new().unwrap();
        let runner = runner_for(&server);
        let mut renderer = Renderer::new(Vec::new(), server.uri());
        let options = WatchOptions {
            download_dir: Some(out_dir.path().join("downloads")),
            ..watch_options()
        };
        let report =
            tokio::task::block_in_place(|| run_watch(&runner, "xyz", options, &mut renderer))
                .unwrap();

        let expected = out_dir.path().join("downloads").join("translated_xyz.md");
        assert_eq!(report.saved.as_deref(), Some(expected.as_path()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "# Saved");
    }
}
