use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use client_logging::{client_debug, client_error, client_info, client_warn};
use tokio_util::sync::CancellationToken;
use translator_core::{JobHandle, SelectedFile, StartJobRequest};

use crate::client::{ClientSettings, ReqwestApi, TranslationApi};
use crate::decode::decode_text;
use crate::filename::artifact_filename;
use crate::persist::AtomicFileWriter;
use crate::{ApiError, DownloadError, EngineEvent, FailureKind};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("http client setup failed: {0}")]
    Client(#[from] ApiError),
}

enum EngineCommand {
    Upload { file: SelectedFile },
    StartTranslation { request: StartJobRequest },
    PollStatus { job: JobHandle, seq: u64 },
    FetchPreview { job: JobHandle },
    Download { job: JobHandle, dir: PathBuf },
    StartTimer { interval: Duration },
    StopTimer,
}

/// Executes network work on a background runtime and reports results as events.
///
/// Every request command runs as its own task, so status polls may overlap when
/// the server is slower than the poll interval.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let api = ReqwestApi::new(settings)?;
        Ok(Self::with_api(Arc::new(api)))
    }

    pub fn with_api(api: Arc<dyn TranslationApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    // Dropping event_tx here closes the event channel for the caller.
                    client_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };

            let mut timer: Option<CancellationToken> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartTimer { interval } => {
                        if let Some(previous) = timer.take() {
                            previous.cancel();
                        }
                        let token = CancellationToken::new();
                        runtime.spawn(run_timer(interval, token.clone(), event_tx.clone()));
                        timer = Some(token);
                        client_debug!("Poll timer armed every {:?}", interval);
                    }
                    EngineCommand::StopTimer => {
                        if let Some(token) = timer.take() {
                            token.cancel();
                            client_debug!("Poll timer cancelled");
                        }
                    }
                    command => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), command, event_tx).await;
                        });
                    }
                }
            }

            if let Some(token) = timer.take() {
                token.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn upload(&self, file: SelectedFile) {
        self.send(EngineCommand::Upload { file });
    }

    pub fn start_translation(&self, request: StartJobRequest) {
        self.send(EngineCommand::StartTranslation { request });
    }

    pub fn poll_status(&self, job: JobHandle, seq: u64) {
        self.send(EngineCommand::PollStatus { job, seq });
    }

    pub fn fetch_preview(&self, job: JobHandle) {
        self.send(EngineCommand::FetchPreview { job });
    }

    pub fn download(&self, job: JobHandle, dir: PathBuf) {
        self.send(EngineCommand::Download { job, dir });
    }

    /// Arms the repeating poll timer; the first tick comes one interval from now.
    /// Re-arming replaces any running timer.
    pub fn start_timer(&self, interval: Duration) {
        self.send(EngineCommand::StartTimer { interval });
    }

    pub fn stop_timer(&self) {
        self.send(EngineCommand::StopTimer);
    }

    /// Blocks until the next event. `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            client_warn!("Engine thread stopped; command dropped");
        }
    }
}

async fn run_timer(interval: Duration, token: CancellationToken, event_tx: mpsc::Sender<EngineEvent>) {
    let start = tokio::time::Instant::now() + interval;
    let mut ticker = tokio::time::interval_at(start, interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if event_tx.send(EngineEvent::PollTick).is_err() {
                    break;
                }
            }
        }
    }
}

async fn handle_command(
    api: &dyn TranslationApi,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Upload { file } => {
            client_info!(
                "Uploading name={} size={}",
                file.name(),
                file.size_bytes()
            );
            EngineEvent::Uploaded(api.upload(&file).await)
        }
        EngineCommand::StartTranslation { request } => {
            client_info!(
                "Starting translation file_id={} provider={} model={} key={}",
                request.file_id,
                request.provider,
                request.model,
                client_logging::redact_secret(&request.api_key)
            );
            EngineEvent::TranslationStarted(api.start_translation(&request).await)
        }
        EngineCommand::PollStatus { job, seq } => {
            let result = api.status(&job).await;
            if let Err(err) = &result {
                client_warn!("Status poll {} for {} failed: {}", seq, job, err);
            }
            EngineEvent::StatusPolled { seq, result }
        }
        EngineCommand::FetchPreview { job } => {
            EngineEvent::PreviewFetched(fetch_preview(api, &job).await)
        }
        EngineCommand::Download { job, dir } => {
            EngineEvent::Downloaded(download_to(api, &job, dir).await)
        }
        EngineCommand::StartTimer { .. } | EngineCommand::StopTimer => return,
    };
    let _ = event_tx.send(event);
}

async fn fetch_preview(api: &dyn TranslationApi, job: &JobHandle) -> Result<String, ApiError> {
    let download = api.download(job).await?;
    decode_text(&download.bytes, download.content_type.as_deref())
        .map(|decoded| decoded.text)
        .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

async fn download_to(
    api: &dyn TranslationApi,
    job: &JobHandle,
    dir: PathBuf,
) -> Result<PathBuf, DownloadError> {
    let download = api.download(job).await?;
    let filename = artifact_filename(job, download.content_type.as_deref());
    let path = AtomicFileWriter::new(dir).write(&filename, &download.bytes)?;
    client_info!("Saved artifact for {} to {:?}", job, path);
    Ok(path)
}
