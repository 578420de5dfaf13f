//! Per-job execution summary and its invariants.

use serde::{Deserialize, Serialize};

/// Hard cap for the short-message field persisted alongside the full message.
pub const SHORT_MESSAGE_MAX: usize = 255;

/// Outcome summary of one job execution.
///
/// Invariants, enforced by [`finish`](JobSummary::finish):
/// - `completed` is true exactly when `message` is empty;
/// - `passed` requires both the operation's pass flag and `completed`;
/// - `exec_time_ms` is strictly positive (`end - start + 1`, so a
///   zero-duration job is distinguishable from one with no time recorded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub completed: bool,
    pub passed: bool,
    pub message: String,
    pub started_at_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_time_ms: Option<i64>,
}

impl JobSummary {
    /// Start a summary now, not yet completed, not yet passed.
    #[must_use]
    pub fn start() -> Self {
        Self::start_at(chrono::Utc::now().timestamp_millis())
    }

    /// Start a summary at an explicit epoch-millisecond timestamp.
    #[must_use]
    pub fn start_at(started_at_ms: i64) -> Self {
        Self {
            completed: false,
            passed: false,
            message: String::new(),
            started_at_ms,
            ended_at_ms: None,
            exec_time_ms: None,
        }
    }

    /// Append a failure message. A non-empty message marks the job as not
    /// completed once [`finish`](Self::finish) runs.
    pub fn fail(&mut self, message: impl AsRef<str>) {
        self.message.push_str(message.as_ref());
    }

    /// Close the summary: recompute `completed`, `passed`, and timing.
    ///
    /// `passed_hint` is the operation's own pass flag; `None` counts as
    /// failed.
    pub fn finish(&mut self, passed_hint: Option<bool>) {
        self.finish_at(passed_hint, chrono::Utc::now().timestamp_millis());
    }

    /// [`finish`](Self::finish) with an explicit end timestamp.
    pub fn finish_at(&mut self, passed_hint: Option<bool>, ended_at_ms: i64) {
        self.completed = self.message.is_empty();
        self.passed = passed_hint.unwrap_or(false) && self.completed;
        self.ended_at_ms = Some(ended_at_ms);
        self.exec_time_ms = Some(ended_at_ms - self.started_at_ms + 1);
    }

    /// The message truncated to [`SHORT_MESSAGE_MAX`] characters.
    #[must_use]
    pub fn short_message(&self) -> String {
        self.message.chars().take(SHORT_MESSAGE_MAX).collect()
    }
}
