//! Translator core: pure submission/progress state machines and view-model helpers.
mod catalog;
mod effect;
mod file;
mod job;
mod msg;
mod preview;
mod state;
mod update;
mod view_model;

pub use catalog::{find_provider, ModelEntry, ProviderEntry, PROVIDERS};
pub use effect::{ProgressEffect, StartJobRequest, SubmitEffect};
pub use file::{
    extension_of, format_file_size, validate_candidate, SelectedFile, ValidationError,
    ALLOWED_EXTENSIONS, MAX_FILE_BYTES,
};
pub use job::{JobHandle, JobPhase, JobStatus, ParsePhaseError};
pub use msg::{ProgressMsg, SubmitMsg};
pub use preview::{truncate_preview, PREVIEW_CHAR_LIMIT, PREVIEW_TRUNCATION_NOTICE};
pub use state::{ProgressState, SubmissionState, SubmitPhase, POLL_INTERVAL};
pub use update::{update_progress, update_submission};
pub use view_model::{
    FileSummary, ModelChoice, ProgressOutcome, ProgressView, SubmissionView,
    MODEL_PLACEHOLDER,
};
