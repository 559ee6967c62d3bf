/// Shown in the model selector while no provider is chosen.
pub const MODEL_PLACEHOLDER: &str = "Select a provider first";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChoice {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionView {
    pub file: Option<FileSummary>,
    pub provider_id: Option<&'static str>,
    pub model_choices: Vec<ModelChoice>,
    pub selected_model: Option<&'static str>,
    pub model_select_enabled: bool,
    pub model_placeholder: Option<&'static str>,
    pub submit_enabled: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub navigate_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    Succeeded,
    Failed,
    TimedOut,
    InvalidTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub headline: &'static str,
    pub message: String,
    pub progress_percent: u8,
    pub outcome: Option<ProgressOutcome>,
    pub download_path: Option<String>,
    pub show_download: bool,
    pub show_return: bool,
    pub preview: Option<String>,
    pub polling: bool,
    pub consecutive_poll_failures: u32,
}
