use std::fmt;
use std::time::Duration;

use crate::{JobHandle, SelectedFile};

/// Body of the start-job request.
#[derive(Clone, PartialEq, Eq)]
pub struct StartJobRequest {
    pub file_id: String,
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for StartJobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartJobRequest")
            .field("file_id", &self.file_id)
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitEffect {
    Upload { file: SelectedFile },
    StartJob(StartJobRequest),
    ShowError { message: String },
    /// Irreversible handoff to the progress view.
    Navigate { job: JobHandle },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEffect {
    FetchStatus { job: JobHandle, seq: u64 },
    StartTimer { interval: Duration },
    StopTimer,
    FetchPreview { job: JobHandle },
}
