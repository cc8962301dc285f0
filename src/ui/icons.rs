//! Emoji used by the terminal UI, with plain fallbacks for dumb terminals.

use console::Emoji;

// Job outcome
pub static CHECK: Emoji<'_, '_> = Emoji("\u{2705} ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("\u{274c} ", "[ERR]");
pub static STOP: Emoji<'_, '_> = Emoji("\u{23f9}\u{fe0f}  ", "[STOP]");

// Log entries
pub static WARN: Emoji<'_, '_> = Emoji("\u{26a0}\u{fe0f}  ", "!");
pub static SPARKLE: Emoji<'_, '_> = Emoji("\u{2728} ", "*");

// Artifacts
pub static FILE: Emoji<'_, '_> = Emoji("\u{1f4c4} ", "-");
pub static CLOCK: Emoji<'_, '_> = Emoji("\u{23f1}\u{fe0f}  ", "[T]");
