//! Progress extraction from translator console output.
//!
//! The translator (pdf2zh and friends) prints a mix of tqdm bars, bare
//! percentages, page counters and free-form log text. This module turns
//! that stream into:
//!
//! - [`ProgressSample`]s - fraction, short label and optional ETA
//! - prefixed log entries (`[Error]`, `[Warning]`, `[Success]`, `[Message]`)
//! - a terminal outcome once the process exits
//!
//! [`LineBuffer`] reassembles lines across chunk boundaries, the matchers in
//! [`patterns`] are pure functions over one line, and [`ProgressEngine`]
//! ties both to the per-job success guard.

mod buffer;
mod display;
mod engine;
pub mod patterns;
mod types;

pub use buffer::{LineBuffer, Lines};
pub use display::{DEFAULT_NOISE_MARKERS, DEFAULT_SUCCESS_PHRASE, DisplayRules, format_entry};
pub use engine::{ProgressEngine, TerminalOutcome};
pub use patterns::extract_progress;
pub use types::{LineClassification, LineOutcome, OutputStream, ProgressSample, Termination};
