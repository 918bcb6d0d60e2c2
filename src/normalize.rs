//! Markdown normalisation for README and description text.
//!
//! Two flavours: a word-capped excerpt of the first paragraph, and a fully
//! cleaned long form with all markup stripped. Both are deterministic and
//! make no external calls.

use lazy_static::lazy_static;
use regex::Regex;

/// Default word cap for excerpts
pub const DEFAULT_EXCERPT_WORDS: usize = 500;

lazy_static! {
    /// Image / badge lines, e.g. `![build](badge.svg)` - dropped entirely
    static ref IMAGE_LINE: Regex = Regex::new(r"!\[.*\]\(.*\)").unwrap();
    /// `[text](url)` -> `text`
    static ref LINK: Regex = Regex::new(r"\[(.*?)\]\(.*?\)").unwrap();
    /// Fenced code blocks, possibly spanning lines
    static ref FENCE: Regex = Regex::new(r"(?s)`{3}.*?`{3}").unwrap();
    /// Inline code span, content kept
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();
    /// Any backtick span, content dropped (excerpt mode)
    static ref CODE_SPAN: Regex = Regex::new(r"`{1,3}.*?`{1,3}").unwrap();
    /// Leading heading markers on a line
    static ref HEADING: Regex = Regex::new(r"^#+\s*").unwrap();
    /// Heading markers anywhere in the full document
    static ref HEADING_LINE: Regex = Regex::new(r"(?m)^\s*#+\s*").unwrap();
}

/// Return a short excerpt from the first real paragraph of `text`.
///
/// Image lines are dropped, then the first maximal run of non-blank lines is
/// taken (falling back to the whole remaining text), markdown links and code
/// spans are stripped and the result is capped at `word_limit` words.
pub fn excerpt(text: &str, word_limit: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .filter(|ln| !IMAGE_LINE.is_match(ln))
        .collect();

    let mut para: Vec<String> = Vec::new();
    for ln in &lines {
        if !ln.trim().is_empty() {
            para.push(HEADING.replace(ln.trim(), "").into_owned());
        } else if !para.is_empty() {
            break;
        }
    }

    let raw = if para.is_empty() {
        lines
            .iter()
            .map(|ln| HEADING.replace(ln.trim(), "").into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        para.join(" ")
    };

    let raw = LINK.replace_all(&raw, "$1");
    let raw = CODE_SPAN.replace_all(&raw, "");

    raw.split_whitespace()
        .take(word_limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove common markdown noise but keep the full text.
///
/// Drops image lines and fenced code blocks, rewrites `[text](url)` to
/// `text`, unwraps inline code and strips heading markers.
pub fn clean_markdown(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|ln| !IMAGE_LINE.is_match(ln))
        .collect();
    let raw = kept.join("\n");

    let raw = LINK.replace_all(&raw, "$1");
    let raw = FENCE.replace_all(&raw, "");
    let raw = INLINE_CODE.replace_all(&raw, "$1");
    let raw = HEADING_LINE.replace_all(&raw, "");

    raw.trim().to_string()
}
