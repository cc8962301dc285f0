//! Terminal rendering of job snapshots.
//!
//! Supports three output modes:
//! - `full`: a progress bar with the colored log printed above it
//! - `minimal`: plain log lines, one per entry
//! - `json`: one serialized snapshot per update, for machine consumption

use crate::job::{JobPhase, JobSnapshot};
use crate::ui::icons::{CHECK, CLOCK, CROSS, FILE, SPARKLE, STOP, WARN};
use console::{Term, style};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Bar resolution; fractions are rendered in tenths of a percent.
const BAR_LENGTH: u64 = 1000;

/// Output mode for the terminal UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// Progress bar and colored log
    #[default]
    Full,
    /// Log lines only
    Minimal,
    /// JSON snapshots
    Json,
}

impl std::str::FromStr for UiMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "minimal" => Self::Minimal,
            _ => Self::Full,
        })
    }
}

impl UiMode {
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Renders successive [`JobSnapshot`]s of one job.
///
/// Only log entries not yet printed are written on each update, so the same
/// snapshot can be rendered twice without duplicating output.
pub struct TranslateUI {
    mode: UiMode,
    multi: MultiProgress,
    bar: ProgressBar,
    term: Term,
    printed: usize,
    last_json: Option<String>,
}

impl TranslateUI {
    pub fn new(mode: UiMode) -> Self {
        let multi = match mode {
            UiMode::Full => MultiProgress::new(),
            _ => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };

        let bar_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let bar = multi.add(ProgressBar::new(BAR_LENGTH));
        bar.set_style(bar_style);
        if mode == UiMode::Full {
            bar.enable_steady_tick(Duration::from_millis(200));
        }

        Self {
            mode,
            multi,
            bar,
            term: Term::stdout(),
            printed: 0,
            last_json: None,
        }
    }

    /// Print a line above the bar, falling back to `eprintln!` if the terminal is gone.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn render(&mut self, snapshot: &JobSnapshot) {
        if snapshot.log.len() < self.printed {
            // a new job or a cancellation replaced the log
            self.printed = 0;
        }
        match self.mode {
            UiMode::Json => self.render_json(snapshot),
            UiMode::Minimal => self.render_minimal(snapshot),
            UiMode::Full => self.render_full(snapshot),
        }
        self.printed = snapshot.log.len();
    }

    fn render_json(&mut self, snapshot: &JobSnapshot) {
        let Ok(json) = serde_json::to_string(snapshot) else {
            return;
        };
        if self.last_json.as_deref() != Some(json.as_str()) {
            let _ = writeln!(&self.term, "{}", json);
            self.last_json = Some(json);
        }
    }

    fn render_minimal(&self, snapshot: &JobSnapshot) {
        for entry in &snapshot.log[self.printed..] {
            let _ = writeln!(&self.term, "{}", entry);
        }
    }

    fn render_full(&self, snapshot: &JobSnapshot) {
        for entry in &snapshot.log[self.printed..] {
            self.print_line(styled_entry(entry));
        }
        self.bar.set_prefix(snapshot.phase.to_string());
        self.bar.set_position(bar_position(snapshot.fraction));
        self.bar
            .set_message(progress_message(&snapshot.label, &snapshot.eta));
    }

    /// Render the terminal snapshot and close the bar.
    pub fn finish(&mut self, snapshot: &JobSnapshot) {
        self.render(snapshot);
        if self.mode != UiMode::Full {
            return;
        }
        self.bar.finish_and_clear();

        let elapsed = snapshot
            .elapsed()
            .and_then(|d| d.to_std().ok())
            .map(format_elapsed)
            .unwrap_or_default();
        match snapshot.phase {
            JobPhase::Succeeded => {
                self.print_line(format!(
                    "\n{} {} {}",
                    CHECK,
                    style("Translation finished").green().bold(),
                    style(format!("({})", elapsed)).dim()
                ));
                if let Some(ref artifacts) = snapshot.artifacts {
                    for path in artifacts.existing() {
                        self.print_line(format!("    {} {}", FILE, path.display()));
                    }
                }
            }
            JobPhase::Failed => {
                self.print_line(format!(
                    "\n{} {} {}",
                    CROSS,
                    style("Translation failed").red().bold(),
                    style(format!("({})", elapsed)).dim()
                ));
            }
            JobPhase::Cancelled => {
                self.print_line(format!("\n{} {}", STOP, style("Translation cancelled").yellow()));
            }
            _ => {}
        }
    }
}

fn bar_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

/// The label, followed by the ETA when the tool reported one.
pub fn progress_message(label: &str, eta: &str) -> String {
    if eta.is_empty() {
        label.to_string()
    } else {
        format!("{} {} {}", label, CLOCK, style(format!("ETA {}", eta)).dim())
    }
}

/// Color a log entry by its prefix.
pub fn styled_entry(entry: &str) -> String {
    if entry.starts_with("[Error]") {
        format!("{} {}", CROSS, style(entry).red())
    } else if entry.starts_with("[Warning]") {
        format!("{} {}", WARN, style(entry).yellow())
    } else if entry.starts_with("[Success]") {
        format!("{} {}", SPARKLE, style(entry).green().bold())
    } else {
        format!("   {}", style(entry).dim())
    }
}

/// `Xs` below a minute, `Xm Ys` above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
