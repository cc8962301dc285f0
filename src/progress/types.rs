//! Value types produced by the progress engine.

use serde::{Deserialize, Serialize};

/// Result of interpreting one line of translator output.
///
/// `fraction` is a best-effort estimate in `[0, 1]`. The engine does not
/// enforce monotonicity across samples; see [`crate::job::JobSnapshot`] for
/// the clamping rule applied by the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub fraction: f64,
    /// Short status, e.g. `"12/50"`, `"42%"` or `"Page 3/10"`
    pub label: String,
    /// Remaining-time text taken from the line, empty when absent
    #[serde(default)]
    pub eta: String,
}

impl ProgressSample {
    pub fn new(fraction: f64, label: impl Into<String>, eta: impl Into<String>) -> Self {
        Self {
            fraction,
            label: label.into(),
            eta: eta.into(),
        }
    }

    /// Sample published when a job finishes successfully.
    pub fn complete() -> Self {
        Self::new(1.0, "100%", "")
    }

    /// Sample published when a job fails.
    pub fn reset() -> Self {
        Self::new(0.0, "", "")
    }

    pub fn is_complete(&self) -> bool {
        self.fraction >= 1.0
    }
}

/// How a raw line is treated by the display filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineClassification {
    /// Looks like a progress line; feeds the bar but is not logged
    Progress,
    ErrorMessage,
    WarningMessage,
    SuccessMessage,
    InformationalMessage,
    /// Noise or blank; never surfaced
    Suppressed,
}

impl LineClassification {
    /// Log prefix for lines that are shown, `None` for hidden ones.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            LineClassification::ErrorMessage => Some("[Error]"),
            LineClassification::WarningMessage => Some("[Warning]"),
            LineClassification::SuccessMessage => Some("[Success]"),
            LineClassification::InformationalMessage => Some("[Message]"),
            LineClassification::Progress | LineClassification::Suppressed => None,
        }
    }

    pub fn is_visible(self) -> bool {
        self.prefix().is_some()
    }
}

/// What the engine produced for one complete line.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LineOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<ProgressSample>,
    /// Formatted entry to append to the visible log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_entry: Option<String>,
    /// `[Success]` entry added when the success phrase first shows up on a
    /// line displayed under another prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_entry: Option<String>,
}

impl LineOutcome {
    pub fn is_empty(&self) -> bool {
        self.sample.is_none() && self.log_entry.is_none() && self.success_entry.is_none()
    }

    /// Log entries in the order they should be appended.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.log_entry
            .iter()
            .chain(self.success_entry.iter())
            .map(String::as_str)
    }
}

/// Which pipe a chunk of output came from. Each gets its own line buffer so
/// interleaved chunks never splice two half-lines together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    #[default]
    Stdout,
    Stderr,
}

/// Process termination as reported by the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    LaunchFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_only_for_visible_classes() {
        assert_eq!(LineClassification::ErrorMessage.prefix(), Some("[Error]"));
        assert_eq!(
            LineClassification::InformationalMessage.prefix(),
            Some("[Message]")
        );
        assert!(!LineClassification::Progress.is_visible());
        assert!(!LineClassification::Suppressed.is_visible());
    }

    #[test]
    fn test_complete_and_reset_samples() {
        assert!(ProgressSample::complete().is_complete());
        let reset = ProgressSample::reset();
        assert_eq!(reset.fraction, 0.0);
        assert!(reset.label.is_empty());
    }
}
