use std::time::Duration;

use crate::view_model::{
    FileSummary, ModelChoice, ProgressOutcome, ProgressView, SubmissionView, MODEL_PLACEHOLDER,
};
use crate::{
    find_provider, format_file_size, truncate_preview, JobHandle, JobPhase, JobStatus,
    ProviderEntry, SelectedFile, StartJobRequest,
};

pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Editing,
    Uploading,
    StartingJob,
    Navigated(JobHandle),
}

/// Submission controller state. Created empty; every field changes only through
/// `update_submission`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionState {
    selected_file: Option<SelectedFile>,
    provider: Option<&'static ProviderEntry>,
    model_id: Option<&'static str>,
    api_key: String,
    uploaded_file_id: Option<String>,
    phase: SubmitPhase,
    last_error: Option<String>,
    dirty: bool,
}

impl SubmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a file is selected, a provider is chosen and the trimmed key is non-empty.
    pub fn is_submittable(&self) -> bool {
        self.selected_file.is_some()
            && self.provider.is_some()
            && !self.api_key.trim().is_empty()
    }

    pub fn phase(&self) -> &SubmitPhase {
        &self.phase
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn uploaded_file_id(&self) -> Option<&str> {
        self.uploaded_file_id.as_deref()
    }

    pub fn view(&self) -> SubmissionView {
        let (model_choices, model_placeholder) = match self.provider {
            Some(provider) => (
                provider
                    .models
                    .iter()
                    .map(|model| ModelChoice {
                        id: model.id,
                        label: model.display_name,
                    })
                    .collect(),
                None,
            ),
            None => (Vec::new(), Some(MODEL_PLACEHOLDER)),
        };
        let navigate_to = match &self.phase {
            SubmitPhase::Navigated(job) => Some(job.progress_route()),
            _ => None,
        };

        SubmissionView {
            file: self.selected_file.as_ref().map(|file| FileSummary {
                name: file.name().to_string(),
                size_label: format_file_size(file.size_bytes()),
            }),
            provider_id: self.provider.map(|provider| provider.id),
            model_choices,
            selected_model: self.model_id,
            model_select_enabled: self.provider.is_some(),
            model_placeholder,
            submit_enabled: !self.is_busy() && self.is_submittable(),
            submitting: self.is_busy(),
            error: self.last_error.clone(),
            navigate_to,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_busy(&self) -> bool {
        matches!(self.phase, SubmitPhase::Uploading | SubmitPhase::StartingJob)
    }

    pub(crate) fn has_navigated(&self) -> bool {
        matches!(self.phase, SubmitPhase::Navigated(_))
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
        self.uploaded_file_id = None;
        self.last_error = None;
        self.dirty = true;
    }

    pub(crate) fn clear_file(&mut self) {
        self.selected_file = None;
        self.uploaded_file_id = None;
        self.dirty = true;
    }

    pub(crate) fn change_provider(&mut self, provider_id: &str) {
        self.provider = find_provider(provider_id.trim());
        self.model_id = self
            .provider
            .and_then(ProviderEntry::default_model)
            .map(|model| model.id);
        self.dirty = true;
    }

    /// Returns false when the model is not offered by the current provider.
    pub(crate) fn change_model(&mut self, model_id: &str) -> bool {
        let Some(model) = self
            .provider
            .and_then(|provider| provider.models.iter().find(|m| m.id == model_id))
        else {
            return false;
        };
        self.model_id = Some(model.id);
        self.dirty = true;
        true
    }

    pub(crate) fn set_api_key(&mut self, api_key: String) {
        self.api_key = api_key;
        self.dirty = true;
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.dirty = true;
    }

    /// Enters the uploading phase and returns the file to send.
    pub(crate) fn begin_upload(&mut self) -> Option<SelectedFile> {
        let file = self.selected_file.clone()?;
        self.phase = SubmitPhase::Uploading;
        self.uploaded_file_id = None;
        self.last_error = None;
        self.dirty = true;
        Some(file)
    }

    /// Records the uploaded file id and builds the start-job request.
    pub(crate) fn begin_start_job(&mut self, file_id: String) -> Option<StartJobRequest> {
        let provider = self.provider?;
        let model = self.model_id?;
        self.uploaded_file_id = Some(file_id.clone());
        self.phase = SubmitPhase::StartingJob;
        self.dirty = true;
        Some(StartJobRequest {
            file_id,
            provider: provider.id.to_string(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
        })
    }

    pub(crate) fn abort_submission(&mut self, message: String) {
        self.phase = SubmitPhase::Editing;
        self.uploaded_file_id = None;
        self.set_error(message);
    }

    pub(crate) fn navigate(&mut self, job: JobHandle) {
        self.phase = SubmitPhase::Navigated(job);
        self.dirty = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Lifecycle {
    #[default]
    Idle,
    InvalidTask,
    Polling,
    Terminal(JobPhase),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum PreviewState {
    #[default]
    NotRequested,
    Loading,
    Loaded(String),
    Unavailable,
}

/// Progress controller state for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    job: Option<JobHandle>,
    lifecycle: Lifecycle,
    status: Option<JobStatus>,
    poll_interval: Duration,
    max_poll_attempts: Option<u32>,
    polls_issued: u64,
    newest_applied_seq: Option<u64>,
    consecutive_poll_failures: u32,
    preview: PreviewState,
    dirty: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            job: None,
            lifecycle: Lifecycle::Idle,
            status: None,
            poll_interval: POLL_INTERVAL,
            max_poll_attempts: None,
            polls_issued: 0,
            newest_applied_seq: None,
            consecutive_poll_failures: 0,
            preview: PreviewState::NotRequested,
            dirty: false,
        }
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Caps the number of status queries. `None` polls until a terminal phase.
    pub fn with_max_poll_attempts(mut self, max: Option<u32>) -> Self {
        self.max_poll_attempts = max;
        self
    }

    pub fn job(&self) -> Option<&JobHandle> {
        self.job.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.lifecycle == Lifecycle::Polling
    }

    /// True once nothing further can happen: terminal or given up, with the
    /// preview (if any) settled.
    pub fn is_settled(&self) -> bool {
        match self.lifecycle {
            Lifecycle::Idle | Lifecycle::Polling => false,
            Lifecycle::InvalidTask | Lifecycle::TimedOut => true,
            Lifecycle::Terminal(_) => self.preview != PreviewState::Loading,
        }
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued
    }

    pub fn view(&self) -> ProgressView {
        let progress_percent = self.status.as_ref().map_or(0, |s| s.progress_percent);
        let status_message = self
            .status
            .as_ref()
            .map(|s| s.message.clone())
            .unwrap_or_default();

        let (headline, message, outcome) = match &self.lifecycle {
            Lifecycle::Idle => ("Initializing...", String::new(), None),
            Lifecycle::InvalidTask => (
                "Error",
                "Invalid task id".to_string(),
                Some(ProgressOutcome::InvalidTask),
            ),
            Lifecycle::Polling => match self.status.as_ref().map(|s| s.phase) {
                None => ("Initializing...", status_message, None),
                Some(phase) => (phase_headline(phase), status_message, None),
            },
            Lifecycle::Terminal(phase) => {
                let outcome = if *phase == JobPhase::Completed {
                    ProgressOutcome::Succeeded
                } else {
                    ProgressOutcome::Failed
                };
                (phase_headline(*phase), status_message, Some(outcome))
            }
            Lifecycle::TimedOut => (
                "Timed out",
                format!("Stopped waiting after {} status checks", self.polls_issued),
                Some(ProgressOutcome::TimedOut),
            ),
        };

        let succeeded = outcome == Some(ProgressOutcome::Succeeded);
        ProgressView {
            headline,
            message,
            progress_percent,
            outcome,
            download_path: self
                .job
                .as_ref()
                .filter(|_| succeeded)
                .map(JobHandle::download_path),
            show_download: succeeded,
            show_return: outcome.is_some(),
            preview: match &self.preview {
                PreviewState::Loaded(text) => Some(text.clone()),
                _ => None,
            },
            polling: self.is_polling(),
            consecutive_poll_failures: self.consecutive_poll_failures,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_started(&self) -> bool {
        self.lifecycle != Lifecycle::Idle
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(crate) fn mark_invalid_task(&mut self) {
        self.lifecycle = Lifecycle::InvalidTask;
        self.dirty = true;
    }

    pub(crate) fn begin_polling(&mut self, job: JobHandle) {
        self.job = Some(job);
        self.lifecycle = Lifecycle::Polling;
        self.dirty = true;
    }

    pub(crate) fn attempts_exhausted(&self) -> bool {
        self.max_poll_attempts
            .is_some_and(|max| self.polls_issued >= u64::from(max))
    }

    /// Allocates the sequence number for the next status query.
    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.polls_issued;
        self.polls_issued += 1;
        seq
    }

    pub(crate) fn record_poll_failure(&mut self) {
        self.consecutive_poll_failures = self.consecutive_poll_failures.saturating_add(1);
        self.dirty = true;
    }

    /// Responses older than the newest applied one are stale.
    pub(crate) fn accepts(&self, seq: u64) -> bool {
        self.newest_applied_seq.map_or(true, |newest| seq > newest)
    }

    pub(crate) fn apply_status(&mut self, seq: u64, status: JobStatus) {
        if status.phase.is_terminal() {
            self.lifecycle = Lifecycle::Terminal(status.phase);
        }
        self.newest_applied_seq = Some(seq);
        self.consecutive_poll_failures = 0;
        self.status = Some(status);
        self.dirty = true;
    }

    pub(crate) fn time_out(&mut self) {
        self.lifecycle = Lifecycle::TimedOut;
        self.dirty = true;
    }

    pub(crate) fn begin_preview(&mut self) {
        self.preview = PreviewState::Loading;
    }

    pub(crate) fn preview_pending(&self) -> bool {
        self.preview == PreviewState::Loading
    }

    pub(crate) fn finish_preview(&mut self, text: Option<&str>) {
        self.preview = match text {
            Some(text) => PreviewState::Loaded(truncate_preview(text)),
            None => PreviewState::Unavailable,
        };
        self.dirty = true;
    }
}

fn phase_headline(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Pending => "Preparing...",
        JobPhase::Processing => "Translating...",
        JobPhase::Completed => "Translation complete",
        JobPhase::Failed => "Translation failed",
    }
}
