//! Display filtering: which lines reach the visible log, and with what prefix.
//!
//! Independent of progress extraction. A tqdm line moves the bar without
//! being logged, an error line is logged whether or not it moves the bar.

use super::types::LineClassification;
use serde::{Deserialize, Serialize};

/// Phrase the translator prints once the output PDFs are written.
pub const DEFAULT_SUCCESS_PHRASE: &str = "Translation completed";

/// urllib3 warning emitted on every run under LibreSSL Pythons.
pub const DEFAULT_NOISE_MARKERS: &[&str] = &["NotOpenSSLWarning"];

/// Characters that mark a line as progress output rather than a message.
const PROGRESS_CHARS: [char; 3] = ['%', '/', '|'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRules {
    pub success_phrase: String,
    pub noise_markers: Vec<String>,
}

impl Default for DisplayRules {
    fn default() -> Self {
        Self {
            success_phrase: DEFAULT_SUCCESS_PHRASE.to_string(),
            noise_markers: DEFAULT_NOISE_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DisplayRules {
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise_markers
            .iter()
            .any(|marker| !marker.is_empty() && line.contains(marker.as_str()))
    }

    pub fn is_success(&self, line: &str) -> bool {
        !self.success_phrase.is_empty() && line.contains(self.success_phrase.as_str())
    }

    /// Classify a complete line. Rules apply in order; the first hit wins.
    pub fn classify(&self, line: &str) -> LineClassification {
        if self.is_noise(line) || line.trim().is_empty() {
            return LineClassification::Suppressed;
        }

        let lower = line.to_lowercase();
        if lower.contains("error") {
            LineClassification::ErrorMessage
        } else if lower.contains("warning") {
            LineClassification::WarningMessage
        } else if self.is_success(line) {
            LineClassification::SuccessMessage
        } else if line.contains(PROGRESS_CHARS) {
            LineClassification::Progress
        } else {
            LineClassification::InformationalMessage
        }
    }

    /// The log entry for `line`, or `None` if it should stay hidden.
    pub fn format(&self, line: &str) -> Option<String> {
        format_entry(self.classify(line), line)
    }
}

/// Prefix a line for the log according to its classification.
pub fn format_entry(class: LineClassification, line: &str) -> Option<String> {
    class
        .prefix()
        .map(|prefix| format!("{} {}", prefix, line.trim()))
}
