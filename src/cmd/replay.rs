//! `pdftrans replay`: feed a captured translator log through the progress engine.
//!
//! Useful for checking how a tool's output will be parsed without running a
//! translation. Every outcome is printed in arrival order: progress samples
//! as `progress <percent> <label> [eta]` and log entries as-is.

use anyhow::{Context, Result};
use pdftrans::config::Settings;
use pdftrans::progress::{LineOutcome, ProgressEngine, ProgressSample, Termination};
use pdftrans::ui::UiMode;
use std::io::{Read, Write};

pub fn cmd_replay(
    settings: &Settings,
    source: &str,
    exit_code: Option<i32>,
    mode: UiMode,
) -> Result<()> {
    let input = read_source(source)?;

    let mut engine = ProgressEngine::new(
        settings.display_rules(),
        settings.output.split_carriage_returns,
    );
    engine.begin()?;

    let mut outcomes = engine.feed(&input);
    match exit_code {
        Some(code) => {
            if let Some(terminal) = engine.finish(Termination::Exited(code)) {
                outcomes.extend(terminal.flushed);
                outcomes.push(LineOutcome {
                    sample: terminal.sample,
                    log_entry: terminal.log_entry,
                    success_entry: None,
                });
            }
        }
        None => {
            if !input.is_empty() && !input.ends_with(b"\n") {
                outcomes.extend(engine.feed(b"\n"));
            }
            engine.abandon();
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for outcome in outcomes.iter().filter(|o| !o.is_empty()) {
        match mode {
            UiMode::Json => writeln!(out, "{}", serde_json::to_string(outcome)?)?,
            _ => write_outcome(&mut out, outcome)?,
        }
    }
    Ok(())
}

fn read_source(source: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if source == "-" {
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read log from stdin")?;
    } else {
        buf = std::fs::read(source).with_context(|| format!("Failed to read {}", source))?;
    }
    Ok(buf)
}

fn write_outcome(out: &mut impl Write, outcome: &LineOutcome) -> std::io::Result<()> {
    if let Some(ref sample) = outcome.sample {
        writeln!(out, "{}", describe_sample(sample))?;
    }
    for entry in outcome.entries() {
        writeln!(out, "{}", entry)?;
    }
    Ok(())
}

fn describe_sample(sample: &ProgressSample) -> String {
    let mut line = format!("progress {:.1}% {}", sample.fraction * 100.0, sample.label);
    if !sample.eta.is_empty() {
        line.push_str(&format!(" eta {}", sample.eta));
    }
    line
}
