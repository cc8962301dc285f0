//! Progress extraction from a single line of translator output.
//!
//! Each pattern family is an independent matcher. [`extract_progress`] tries
//! them in priority order and returns the first hit, so a rich tqdm line is
//! never shadowed by the bare percentage it also contains. A bare fraction
//! anywhere in the line outranks the bracketed form, so `match_bracketed`
//! only fires on its own.
//!
//! A line holding several `\r`-separated redraws is matched on its final
//! frame.
//!
//! | Priority | Matcher              | Example                                   |
//! |----------|----------------------|-------------------------------------------|
//! | 1        | `match_tqdm_bar`     | ` 4%|▍    | 2/52 [00:00<00:15, 3.27it/s]` |
//! | 2        | `match_percentage`   | `15%`                                     |
//! | 3        | `match_fraction`     | `Translating 4/46`                        |
//! | 4        | `match_bracketed`    | `| 3/10 [00:04<00:09]`                    |
//! | 5        | `match_page_counter` | `Processing page 5 of 10`                 |

use super::types::ProgressSample;
use regex::Regex;
use std::sync::LazyLock;

static TQDM_BAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)%\|[^|]*\|\s*(\d+)/(\d+)\s*\[([^\]]*)\]").unwrap()
});

static PERCENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());

static FRACTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap());

static BRACKETED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|?\s*(\d+)/(\d+)\s*\[([^\]]*)\]").unwrap());

static PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Processing page (\d+) of (\d+)").unwrap());

/// A single pattern family.
pub type Matcher = fn(&str) -> Option<ProgressSample>;

/// All matchers, highest priority first.
pub const MATCHERS: [(&str, Matcher); 5] = [
    ("tqdm_bar", match_tqdm_bar),
    ("percentage", match_percentage),
    ("fraction", match_fraction),
    ("bracketed", match_bracketed),
    ("page_counter", match_page_counter),
];

/// Run the matchers in priority order and return the first sample found.
pub fn extract_progress(line: &str) -> Option<ProgressSample> {
    let frame = final_frame(line);
    MATCHERS.iter().find_map(|(_, matcher)| matcher(frame))
}

/// Like [`extract_progress`] but also reports which matcher fired.
pub fn extract_progress_named(line: &str) -> Option<(&'static str, ProgressSample)> {
    let frame = final_frame(line);
    MATCHERS
        .iter()
        .find_map(|(name, matcher)| matcher(frame).map(|sample| (*name, sample)))
}

/// The last non-blank segment after a `\r`; tqdm redraws in place, so
/// earlier segments are stale.
fn final_frame(line: &str) -> &str {
    line.rsplit('\r')
        .find(|frame| !frame.trim().is_empty())
        .unwrap_or(line)
}

/// `<pct>%|<bar>|<cur>/<total> [<info>]`; the fraction comes from the percent.
pub fn match_tqdm_bar(line: &str) -> Option<ProgressSample> {
    let caps = TQDM_BAR_REGEX.captures(line)?;
    let percent = parse_number(caps.get(1)?.as_str())?;
    let current = caps.get(2)?.as_str();
    let total = caps.get(3)?.as_str();
    let info = caps.get(4).map_or("", |m| m.as_str());

    Some(ProgressSample::new(
        percent / 100.0,
        format!("{}/{}", current, total),
        eta_from_info(info),
    ))
}

/// Any `<digits>%` in the line.
pub fn match_percentage(line: &str) -> Option<ProgressSample> {
    let caps = PERCENT_REGEX.captures(line)?;
    let raw = caps.get(1)?.as_str();
    let percent = parse_number(raw)?;
    Some(ProgressSample::new(percent / 100.0, format!("{}%", raw), ""))
}

/// `<cur>/<total>` anywhere in the line, spaces allowed around the slash.
pub fn match_fraction(line: &str) -> Option<ProgressSample> {
    let caps = FRACTION_REGEX.captures(line)?;
    let current = caps.get(1)?.as_str();
    let total = caps.get(2)?.as_str();
    let fraction = ratio(current, total)?;
    Some(ProgressSample::new(
        fraction,
        format!("{}/{}", current, total),
        "",
    ))
}

/// `[|] <cur>/<total> [<info>]` without the full bar decoration.
pub fn match_bracketed(line: &str) -> Option<ProgressSample> {
    let caps = BRACKETED_REGEX.captures(line)?;
    let current = caps.get(1)?.as_str();
    let total = caps.get(2)?.as_str();
    let fraction = ratio(current, total)?;
    let info = caps.get(3).map_or("", |m| m.as_str());
    Some(ProgressSample::new(
        fraction,
        format!("{}/{}", current, total),
        eta_from_info(info),
    ))
}

/// `Processing page N of M`.
pub fn match_page_counter(line: &str) -> Option<ProgressSample> {
    let caps = PAGE_REGEX.captures(line)?;
    let page = caps.get(1)?.as_str();
    let pages = caps.get(2)?.as_str();
    let fraction = ratio(page, pages)?;
    Some(ProgressSample::new(
        fraction,
        format!("Page {}/{}", page, pages),
        "",
    ))
}

/// Remaining time inside a tqdm bracket: the text after `<` up to the next comma.
fn eta_from_info(info: &str) -> String {
    let Some((_, after)) = info.split_once('<') else {
        return String::new();
    };
    let eta = after.split(',').next().unwrap_or(after);
    eta.trim().to_string()
}

fn parse_number(digits: &str) -> Option<f64> {
    digits.parse::<f64>().ok()
}

/// `current / total`, or `None` when the denominator is zero.
fn ratio(current: &str, total: &str) -> Option<f64> {
    let current = parse_number(current)?;
    let total = parse_number(total)?;
    if total <= 0.0 {
        return None;
    }
    Some(current / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tqdm_bar_line() {
        let sample = extract_progress(" 4%|▍         | 2/52 [00:00<00:15,  3.27it/s]").unwrap();
        assert!(approx(sample.fraction, 0.04));
        assert_eq!(sample.label, "2/52");
        assert_eq!(sample.eta, "00:15");
    }

    #[test]
    fn test_tqdm_bar_wins_over_bare_percentage() {
        let (name, _) =
            extract_progress_named("100%|██████████| 52/52 [00:16<00:00,  3.21it/s]").unwrap();
        assert_eq!(name, "tqdm_bar");
    }

    #[test]
    fn test_tqdm_bar_without_eta_delimiter() {
        let sample = match_tqdm_bar(" 50%|█████     | 5/10 [elapsed 00:03]").unwrap();
        assert!(approx(sample.fraction, 0.5));
        assert_eq!(sample.eta, "");
    }

    #[test]
    fn test_tqdm_bar_eta_without_comma_runs_to_bracket_end() {
        let sample = match_tqdm_bar(" 10%|█         | 1/10 [00:01<00:09]").unwrap();
        assert_eq!(sample.eta, "00:09");
    }

    #[test]
    fn test_bare_percentage() {
        let sample = extract_progress("15%").unwrap();
        assert!(approx(sample.fraction, 0.15));
        assert_eq!(sample.label, "15%");
        assert_eq!(sample.eta, "");
    }

    #[test]
    fn test_percentage_above_hundred_passes_through() {
        let sample = match_percentage("150%").unwrap();
        assert!(approx(sample.fraction, 1.5));
    }

    #[test]
    fn test_bare_fraction() {
        let sample = extract_progress("4/46").unwrap();
        assert!(approx(sample.fraction, 4.0 / 46.0));
        assert!(sample.fraction > 0.0869 && sample.fraction < 0.0870);
        assert_eq!(sample.label, "4/46");
        assert_eq!(sample.eta, "");
    }

    #[test]
    fn test_bare_fraction_tolerates_whitespace() {
        let sample = match_fraction("  3 / 12 ").unwrap();
        assert!(approx(sample.fraction, 0.25));
        assert_eq!(sample.label, "3/12");
    }

    #[test]
    fn test_fraction_embedded_in_text() {
        let sample = extract_progress("Translating 3/10").unwrap();
        assert!(approx(sample.fraction, 0.3));
        assert_eq!(sample.label, "3/10");

        let (name, sample) = extract_progress_named("Loading pages 4 / 46 done").unwrap();
        assert_eq!(name, "fraction");
        assert_eq!(sample.label, "4/46");
    }

    #[test]
    fn test_zero_denominator_is_no_match() {
        assert!(extract_progress("4/0").is_none());
        assert!(match_bracketed("| 4/0 [00:01<00:02]").is_none());
        assert!(match_page_counter("Processing page 1 of 0").is_none());
    }

    #[test]
    fn test_bracketed_fraction_with_eta() {
        let sample = match_bracketed("| 3/10 [00:04<00:09, 1.2s/it]").unwrap();
        assert!(approx(sample.fraction, 0.3));
        assert_eq!(sample.label, "3/10");
        assert_eq!(sample.eta, "00:09");
    }

    #[test]
    fn test_fraction_outranks_bracketed() {
        let (name, sample) = extract_progress_named("| 3/10 [00:04<00:09, 1.2s/it]").unwrap();
        assert_eq!(name, "fraction");
        assert_eq!(sample.label, "3/10");
        assert_eq!(sample.eta, "");
    }

    #[test]
    fn test_redrawn_bar_uses_final_frame() {
        let line = "  0%|          | 0/52 [00:00<?, ?it/s]\r 50%|█████     | 26/52 [00:08<00:08,  3.10it/s]\r";
        let (name, sample) = extract_progress_named(line).unwrap();
        assert_eq!(name, "tqdm_bar");
        assert!(approx(sample.fraction, 0.5));
        assert_eq!(sample.label, "26/52");
        assert_eq!(sample.eta, "00:08");
    }

    #[test]
    fn test_page_counter() {
        let sample = extract_progress("Processing page 5 of 10").unwrap();
        assert!(approx(sample.fraction, 0.5));
        assert_eq!(sample.label, "Page 5/10");
        assert_eq!(sample.eta, "");
    }

    #[test]
    fn test_plain_log_lines_carry_no_progress() {
        assert!(extract_progress("Loading layout model").is_none());
        assert!(extract_progress("").is_none());
        assert!(extract_progress("see /usr/share/fonts").is_none());
    }

    #[test]
    fn test_error_line_still_yields_percentage() {
        let sample = extract_progress("Error while rendering, at 50%").unwrap();
        assert!(approx(sample.fraction, 0.5));
    }
}
