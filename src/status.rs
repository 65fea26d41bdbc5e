// Job status as reported by the training service, plus the human-readable
// label every front-end shows for it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a training job or of a single model inside it.
///
/// Parsing never fails: values outside the known set are kept verbatim in
/// `Unknown` so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Unknown(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Unknown(raw) => raw,
        }
    }

    /// Completed and failed jobs will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobState::Unknown(_))
    }

    /// Label used by the CLI and the console menu.
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Completed => "✅ Completed",
            JobState::Running => "⏩ Running",
            JobState::Pending => "⏸️ Queued or paused",
            JobState::Failed => "❌ Failed",
            JobState::Unknown(_) => "⚠️ Unknown status",
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Unknown("unknown".into())
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => JobState::Pending,
            "running" => JobState::Running,
            "completed" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Unknown(raw),
        }
    }
}

impl From<&str> for JobState {
    fn from(raw: &str) -> Self {
        JobState::from(raw.to_string())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
