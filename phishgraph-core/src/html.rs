// Pre-check deciding whether a document is worth turning into a graph

use serde::Serialize;
use std::fmt;

/// Documents shorter than this (in characters) with no angle bracket are
/// treated as plain text.
const MIN_MARKUP_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    Empty,
    NotMarkup,
    XmlDocument,
    /// No start, end or declaration tag anywhere in the text.
    NoElements,
}

/// Outcome of inspecting the HTML handed to the pipeline.
///
/// Only `Usable` documents are parsed. The other verdicts still produce a
/// full-size (all-zero) graph encoding, they are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "reason")]
pub enum HtmlVerdict {
    Usable,
    Absent,
    Degenerate(DegenerateReason),
}

impl HtmlVerdict {
    pub fn is_usable(&self) -> bool {
        matches!(self, HtmlVerdict::Usable)
    }
}

impl fmt::Display for HtmlVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtmlVerdict::Usable => write!(f, "usable"),
            HtmlVerdict::Absent => write!(f, "absent"),
            HtmlVerdict::Degenerate(DegenerateReason::Empty) => write!(f, "degenerate (empty)"),
            HtmlVerdict::Degenerate(DegenerateReason::NotMarkup) => {
                write!(f, "degenerate (not markup)")
            }
            HtmlVerdict::Degenerate(DegenerateReason::XmlDocument) => {
                write!(f, "degenerate (xml document)")
            }
            HtmlVerdict::Degenerate(DegenerateReason::NoElements) => {
                write!(f, "degenerate (no elements)")
            }
        }
    }
}

pub fn check_html(html: &str) -> HtmlVerdict {
    let trimmed = html.trim();
    if trimmed.is_empty() {
        return HtmlVerdict::Degenerate(DegenerateReason::Empty);
    }
    if !html.contains(['<', '>']) && html.chars().count() < MIN_MARKUP_LEN {
        return HtmlVerdict::Degenerate(DegenerateReason::NotMarkup);
    }
    if trimmed.starts_with("<?xml") {
        return HtmlVerdict::Degenerate(DegenerateReason::XmlDocument);
    }
    // The parser would invent html/head/body around bare text
    if !has_tag(html) {
        return HtmlVerdict::Degenerate(DegenerateReason::NoElements);
    }
    HtmlVerdict::Usable
}

/// True if some `<` opens a tag, end tag, comment or doctype.
fn has_tag(html: &str) -> bool {
    html.as_bytes().windows(2).any(|pair| {
        pair[0] == b'<' && (pair[1].is_ascii_alphabetic() || matches!(pair[1], b'!' | b'/'))
    })
}
