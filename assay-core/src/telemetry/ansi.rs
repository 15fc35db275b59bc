//! ANSI escape-sequence stripping.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// CSI sequences, OSC strings (BEL or ST terminated), charset designators and
/// two-byte escapes (Fp and Fe), in that order of preference.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-?]*[ -/]*[@-~]",
        r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)",
        r"|\x1b[()][0-9A-Za-z]",
        r"|\x1b[0-_]",
    ))
    .expect("ANSI escape pattern is valid")
});

/// Remove terminal escape sequences from `text`.
///
/// Borrows when there is nothing to strip.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    ANSI_ESCAPE.replace_all(text, "")
}
