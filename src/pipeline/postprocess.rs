//! Post-processing: deterministic cleanup of model-generated text.
//!
//! Vision models answer in loose Markdown even when nobody asked for it. The
//! formatter only understands a handful of plain-text markers, so this module
//! reduces the answer to plain text before anything else sees it.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`.
//! Markdown bullets are rewritten before emphasis stripping, otherwise the
//! `*` bullet marker would be deleted along with the emphasis.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to a raw model answer.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip code fences, including a language tag on an opening fence
/// 3. Rewrite `* ` / `+ ` bullets as `-` bullets
/// 4. Strip `**` and `*` emphasis markers
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 6. Trim trailing whitespace per line
/// 7. Collapse blank-line runs so no blank lines remain
/// 8. Trim the whole text
pub fn clean_response(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_code_fences(&s);
    let s = normalise_bullets(&s);
    let s = strip_emphasis(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip code fences ────────────────────────────────────────────────

static RE_FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[\w-]*[ \t]*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    let without_lines = RE_FENCE_LINE.replace_all(input, "");
    without_lines.replace("```", "")
}

// ── Rule 3: Markdown bullets ─────────────────────────────────────────────────

static RE_STAR_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[*+][ \t]+").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_STAR_BULLET.replace_all(input, "-").to_string()
}

// ── Rule 4: Emphasis ─────────────────────────────────────────────────────────

fn strip_emphasis(input: &str) -> String {
    input.replace("**", "").replace('*', "")
}

// ── Rule 5: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 6: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 7: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n").to_string()
}
