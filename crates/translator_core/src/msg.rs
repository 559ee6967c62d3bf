use crate::{JobStatus, SelectedFile};

/// Inputs to the submission controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMsg {
    /// User picked or dropped a file.
    FileChosen(SelectedFile),
    /// User removed the current file. Must not reopen the picker.
    FileCleared,
    /// User chose a provider; an empty or unknown id clears the choice.
    ProviderChanged(String),
    /// User chose a model from the current provider's list.
    ModelChanged(String),
    /// API key field edited (raw, untrimmed text).
    ApiKeyEdited(String),
    /// User pressed submit.
    SubmitClicked,
    /// Upload finished: the server's file id, or its reason for refusing.
    UploadFinished(Result<String, Option<String>>),
    /// Start-job finished: the task id, or the server's reason for refusing.
    StartJobFinished(Result<String, Option<String>>),
    /// Fallback for placeholder wiring.
    NoOp,
}

/// Inputs to the progress controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMsg {
    /// Progress view opened for the given (unvalidated) task id.
    Start { task_id: String },
    /// Poll timer fired.
    Tick,
    /// A status query issued with sequence number `seq` completed.
    StatusReceived {
        seq: u64,
        result: Result<JobStatus, String>,
    },
    /// Preview fetch completed with the artifact text or an error description.
    PreviewLoaded(Result<String, String>),
    /// Fallback for placeholder wiring.
    NoOp,
}
