//! Published job state and its transitions.
//!
//! ```text
//! Idle ──[start]──► Starting ──[spawned]──► Running ──[exit 0 / success]──► Succeeded
//!                           ──[launch error]──► Failed        ──[exit != 0]──► Failed
//!                                               Running ──[cancel]──► Cancelled
//! Succeeded | Failed | Cancelled ──[start]──► Starting
//! ```

use crate::progress::{LineOutcome, ProgressSample, TerminalOutcome};
use crate::translator::{JobId, OutputArtifacts};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    #[default]
    Idle,
    Starting,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobPhase::Succeeded | JobPhase::Failed | JobPhase::Cancelled
        )
    }

    /// A job is in flight and a new one may not start.
    pub fn is_active(self) -> bool {
        matches!(self, JobPhase::Starting | JobPhase::Running)
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Starting => "starting",
            JobPhase::Running => "running",
            JobPhase::Succeeded => "succeeded",
            JobPhase::Failed => "failed",
            JobPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Everything the UI needs to draw the current job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job_id: Option<JobId>,
    pub phase: JobPhase,
    pub fraction: f64,
    pub label: String,
    pub eta: String,
    /// Visible log, one prefixed entry per line
    pub log: Vec<String>,
    pub processing: bool,
    pub input: Option<PathBuf>,
    pub artifacts: Option<OutputArtifacts>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// Fresh state for a job about to launch. The previous job's log is dropped.
    pub fn starting(job_id: JobId, input: PathBuf) -> Self {
        Self {
            job_id: Some(job_id),
            phase: JobPhase::Starting,
            processing: true,
            input: Some(input),
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn mark_running(&mut self) {
        if self.phase == JobPhase::Starting {
            self.phase = JobPhase::Running;
        }
    }

    /// Apply a progress sample, ignoring regressions once complete.
    pub fn apply_sample(&mut self, sample: &ProgressSample) {
        if self.fraction >= 1.0 && sample.fraction < self.fraction {
            return;
        }
        self.fraction = sample.fraction;
        self.label = sample.label.clone();
        self.eta = sample.eta.clone();
    }

    pub fn push_log(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    /// Apply one line's outcome. Returns `true` if anything changed.
    pub fn apply_line(&mut self, outcome: &LineOutcome) -> bool {
        if let Some(ref sample) = outcome.sample {
            self.apply_sample(sample);
        }
        for entry in outcome.entries() {
            self.push_log(entry);
        }
        !outcome.is_empty()
    }

    /// Apply the terminal outcome and move to `Succeeded` or `Failed`.
    ///
    /// A failure resets the fraction to zero unconditionally, even after a
    /// mid-stream success.
    pub fn finish(&mut self, outcome: &TerminalOutcome, artifacts: Option<OutputArtifacts>) {
        for line in &outcome.flushed {
            self.apply_line(line);
        }
        if let Some(ref entry) = outcome.log_entry {
            self.push_log(entry.clone());
        }
        if outcome.succeeded {
            if let Some(ref sample) = outcome.sample {
                self.apply_sample(sample);
            }
            self.phase = JobPhase::Succeeded;
            self.artifacts = artifacts;
        } else {
            if let Some(ref sample) = outcome.sample {
                self.fraction = sample.fraction;
                self.label = sample.label.clone();
                self.eta = sample.eta.clone();
            }
            self.phase = JobPhase::Failed;
        }
        self.processing = false;
        self.finished_at = Some(Utc::now());
    }

    /// Reset to idle values after a user-initiated stop.
    pub fn cancelled(job_id: Option<JobId>) -> Self {
        Self {
            job_id,
            phase: JobPhase::Cancelled,
            finished_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        Some(self.finished_at.unwrap_or_else(Utc::now) - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn running() -> JobSnapshot {
        let mut snapshot = JobSnapshot::starting(Uuid::new_v4(), PathBuf::from("a.pdf"));
        snapshot.mark_running();
        snapshot
    }

    fn terminal(succeeded: bool, sample: Option<ProgressSample>, entry: &str) -> TerminalOutcome {
        TerminalOutcome {
            flushed: Vec::new(),
            sample,
            log_entry: Some(entry.to_string()),
            succeeded,
        }
    }

    #[test]
    fn test_phase_predicates() {
        assert!(JobPhase::Running.is_active());
        assert!(JobPhase::Starting.is_active());
        assert!(!JobPhase::Idle.is_active());
        assert!(JobPhase::Cancelled.is_terminal());
        assert!(!JobPhase::Running.is_terminal());
        assert_eq!(JobPhase::Succeeded.to_string(), "succeeded");
    }

    #[test]
    fn test_starting_then_running() {
        let snapshot = running();
        assert_eq!(snapshot.phase, JobPhase::Running);
        assert!(snapshot.processing);
        assert!(snapshot.started_at.is_some());
    }

    #[test]
    fn test_mark_running_only_from_starting() {
        let mut snapshot = JobSnapshot::cancelled(None);
        snapshot.mark_running();
        assert_eq!(snapshot.phase, JobPhase::Cancelled);
    }

    #[test]
    fn test_samples_may_regress_before_completion() {
        let mut snapshot = running();
        snapshot.apply_sample(&ProgressSample::new(0.6, "60%", ""));
        snapshot.apply_sample(&ProgressSample::new(0.2, "2/10", "00:08"));
        assert_eq!(snapshot.fraction, 0.2);
        assert_eq!(snapshot.eta, "00:08");
    }

    #[test]
    fn test_samples_clamped_after_completion() {
        let mut snapshot = running();
        snapshot.apply_sample(&ProgressSample::complete());
        snapshot.apply_sample(&ProgressSample::new(0.3, "30%", ""));
        assert_eq!(snapshot.fraction, 1.0);
        assert_eq!(snapshot.label, "100%");
    }

    #[test]
    fn test_finish_success_keeps_log_and_sets_artifacts() {
        let mut snapshot = running();
        snapshot.push_log("[Message] Loading");
        let artifacts = OutputArtifacts::resolve(
            std::path::Path::new("a.pdf"),
            std::path::Path::new("."),
        );
        snapshot.finish(
            &terminal(true, Some(ProgressSample::complete()), "[Success] done"),
            Some(artifacts.clone()),
        );
        assert_eq!(snapshot.phase, JobPhase::Succeeded);
        assert_eq!(snapshot.fraction, 1.0);
        assert!(!snapshot.processing);
        assert_eq!(snapshot.log, vec!["[Message] Loading", "[Success] done"]);
        assert_eq!(snapshot.artifacts, Some(artifacts));
    }

    #[test]
    fn test_finish_failure_zeroes_progress_even_after_completion() {
        let mut snapshot = running();
        snapshot.apply_sample(&ProgressSample::complete());
        snapshot.finish(
            &terminal(false, Some(ProgressSample::reset()), "[Error] exit code: 2"),
            None,
        );
        assert_eq!(snapshot.phase, JobPhase::Failed);
        assert_eq!(snapshot.fraction, 0.0);
        assert!(snapshot.label.is_empty());
    }

    #[test]
    fn test_launch_failure_leaves_progress_alone() {
        let mut snapshot = JobSnapshot::starting(Uuid::new_v4(), PathBuf::from("a.pdf"));
        snapshot.finish(&terminal(false, None, "[Error] Failed to start"), None);
        assert_eq!(snapshot.phase, JobPhase::Failed);
        assert_eq!(snapshot.fraction, 0.0);
        assert_eq!(snapshot.log.len(), 1);
    }

    #[test]
    fn test_cancelled_resets_everything() {
        let id = Uuid::new_v4();
        let snapshot = JobSnapshot::cancelled(Some(id));
        assert_eq!(snapshot.phase, JobPhase::Cancelled);
        assert_eq!(snapshot.fraction, 0.0);
        assert!(snapshot.log.is_empty());
        assert!(snapshot.label.is_empty());
        assert!(!snapshot.processing);
        assert_eq!(snapshot.job_id, Some(id));
    }
}
