//! Test utilities for rendered output
//!
//! Colored console lines are compared against their plain rendering after the
//! escape sequences are removed.

use regex::Regex;
use std::sync::LazyLock;

/// CSI sequences (colors, attributes, resets) and simple `ESC <letter>` escapes
static ANSI_ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]|\x1b[A-Za-z]").expect("ANSI regex pattern is valid")
});

/// Remove ANSI escape sequences, leaving the visible text.
pub fn strip_ansi_codes(input: &str) -> String {
    ANSI_ESCAPE_PATTERN.replace_all(input, "").into_owned()
}

/// True when `input` carries any ANSI escape sequence.
pub fn contains_ansi_codes(input: &str) -> bool {
    ANSI_ESCAPE_PATTERN.is_match(input)
}
