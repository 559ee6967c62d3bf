use std::fmt;
use std::str::FromStr;

/// Opaque server-side task identifier, addressable as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    /// Accepts a trimmed, non-empty id free of path and query delimiters.
    /// `.` and `..` are rejected since URL normalisation drops them as segments.
    pub fn parse(raw: &str) -> Option<Self> {
        let id = raw.trim();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '?', '#']) {
            return None;
        }
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the progress view for this job.
    pub fn progress_route(&self) -> String {
        format!("/translate/{}", self.0)
    }

    /// Address of the produced artifact.
    pub fn download_path(&self) -> String {
        format!("/api/download/{}", self.0)
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        match self {
            JobPhase::Pending | JobPhase::Processing => false,
            JobPhase::Completed | JobPhase::Failed => true,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            JobPhase::Pending => "pending",
            JobPhase::Processing => "processing",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job phase {0:?}")]
pub struct ParsePhaseError(pub String);

impl FromStr for JobPhase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobPhase::Pending),
            "processing" => Ok(JobPhase::Processing),
            "completed" => Ok(JobPhase::Completed),
            "failed" => Ok(JobPhase::Failed),
            other => Err(ParsePhaseError(other.to_string())),
        }
    }
}

/// Server-reported job status. The client only renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub phase: JobPhase,
    pub progress_percent: u8,
    pub message: String,
}

impl JobStatus {
    /// Builds a status, clamping the reported progress into 0..=100.
    pub fn new(phase: JobPhase, progress: i64, message: impl Into<String>) -> Self {
        Self {
            phase,
            progress_percent: progress.clamp(0, 100) as u8,
            message: message.into(),
        }
    }
}
