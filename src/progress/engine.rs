//! The per-job progress engine: chunks in, samples and log entries out.

use super::buffer::LineBuffer;
use super::display::{DisplayRules, format_entry};
use super::patterns::extract_progress_named;
use super::types::{LineClassification, LineOutcome, OutputStream, ProgressSample, Termination};
use crate::errors::JobError;
use tracing::{debug, warn};

/// Mutable state for one in-flight job.
#[derive(Debug)]
struct StreamState {
    stdout: LineBuffer,
    stderr: LineBuffer,
    last_sample: Option<ProgressSample>,
    succeeded: bool,
}

/// Final result of a job as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalOutcome {
    /// Outcomes for the unterminated remainder flushed at exit
    pub flushed: Vec<LineOutcome>,
    pub sample: Option<ProgressSample>,
    /// Closing log entry, `None` when success was already logged mid-stream
    pub log_entry: Option<String>,
    pub succeeded: bool,
}

/// Turns translator output into [`ProgressSample`]s and log entries.
///
/// Holds at most one stream at a time. Input arriving while no stream is
/// active (after cancellation, for instance) is ignored.
#[derive(Debug)]
pub struct ProgressEngine {
    rules: DisplayRules,
    split_carriage_returns: bool,
    state: Option<StreamState>,
}

impl Default for ProgressEngine {
    fn default() -> Self {
        Self::new(DisplayRules::default(), false)
    }
}

impl ProgressEngine {
    pub fn new(rules: DisplayRules, split_carriage_returns: bool) -> Self {
        Self {
            rules,
            split_carriage_returns,
            state: None,
        }
    }

    pub fn rules(&self) -> &DisplayRules {
        &self.rules
    }

    /// Open a fresh stream for a new job.
    ///
    /// Refuses while another stream is active; the active one is left untouched.
    pub fn begin(&mut self) -> Result<(), JobError> {
        if self.state.is_some() {
            warn!("progress stream already active, refusing to start another");
            return Err(JobError::AlreadyRunning);
        }
        self.state = Some(StreamState {
            stdout: LineBuffer::with_carriage_returns(self.split_carriage_returns),
            stderr: LineBuffer::with_carriage_returns(self.split_carriage_returns),
            last_sample: None,
            succeeded: false,
        });
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn has_succeeded(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.succeeded)
    }

    pub fn last_sample(&self) -> Option<&ProgressSample> {
        self.state.as_ref().and_then(|s| s.last_sample.as_ref())
    }

    /// Feed a raw stdout chunk; returns one outcome per completed line that
    /// produced something.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<LineOutcome> {
        self.feed_stream(OutputStream::Stdout, chunk)
    }

    /// Feed a raw chunk from the given pipe.
    pub fn feed_stream(&mut self, stream: OutputStream, chunk: &[u8]) -> Vec<LineOutcome> {
        let Some(state) = self.state.as_mut() else {
            debug!(bytes = chunk.len(), "ignoring output with no active stream");
            return Vec::new();
        };
        let buffer = match stream {
            OutputStream::Stdout => &mut state.stdout,
            OutputStream::Stderr => &mut state.stderr,
        };
        let lines: Vec<String> = buffer.push(chunk).collect();
        lines
            .iter()
            .map(|line| process_line(&self.rules, state, line))
            .filter(|outcome| !outcome.is_empty())
            .collect()
    }

    /// Process one already-complete line.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        match self.state.as_mut() {
            Some(state) => process_line(&self.rules, state, line),
            None => LineOutcome::default(),
        }
    }

    /// Close the stream with the process's fate.
    ///
    /// Returns `None` when no stream is active, so a late exit event for a
    /// cancelled job is a no-op.
    pub fn finish(&mut self, termination: Termination) -> Option<TerminalOutcome> {
        let mut state = self.state.take()?;

        let mut flushed = Vec::new();
        let remainders = [state.stdout.flush(), state.stderr.flush()];
        for rest in remainders.into_iter().flatten() {
            let outcome = process_line(&self.rules, &mut state, &rest);
            if !outcome.is_empty() {
                flushed.push(outcome);
            }
        }

        let outcome = match termination {
            Termination::Exited(0) => {
                let log_entry = (!state.succeeded)
                    .then(|| format!("[Success] {}", self.rules.success_phrase));
                TerminalOutcome {
                    flushed,
                    sample: Some(ProgressSample::complete()),
                    log_entry,
                    succeeded: true,
                }
            }
            Termination::Exited(code) => TerminalOutcome {
                flushed,
                sample: Some(ProgressSample::reset()),
                log_entry: Some(format!(
                    "[Error] Translation failed with exit code: {}",
                    code
                )),
                succeeded: false,
            },
            Termination::LaunchFailed(reason) => TerminalOutcome {
                flushed,
                sample: None,
                log_entry: Some(format!("[Error] Failed to start translator: {}", reason)),
                succeeded: false,
            },
        };
        Some(outcome)
    }

    /// Drop the active stream without producing a terminal outcome.
    pub fn abandon(&mut self) {
        if self.state.take().is_some() {
            debug!("progress stream abandoned");
        }
    }
}

fn process_line(rules: &DisplayRules, state: &mut StreamState, line: &str) -> LineOutcome {
    let class = rules.classify(line);
    if class == LineClassification::Suppressed {
        return LineOutcome::default();
    }

    let mut sample = extract_progress_named(line).map(|(matcher, sample)| {
        debug!(matcher, fraction = sample.fraction, label = %sample.label, "progress");
        sample
    });
    let mut log_entry = format_entry(class, line);
    let mut success_entry = None;

    if rules.is_success(line) {
        sample = Some(ProgressSample::complete());
        if state.succeeded {
            if class == LineClassification::SuccessMessage {
                log_entry = None;
            }
        } else {
            debug!("success phrase seen before exit");
            state.succeeded = true;
            // the exit-0 entry is skipped once the flag is set
            if class != LineClassification::SuccessMessage {
                success_entry = Some(format!("[Success] {}", rules.success_phrase));
            }
        }
    }

    if let Some(ref s) = sample {
        state.last_sample = Some(s.clone());
    }
    LineOutcome {
        sample,
        log_entry,
        success_entry,
    }
}
