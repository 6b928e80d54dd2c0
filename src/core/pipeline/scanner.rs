//! Segment scanner: locate `<special>`, `<chartjs>` and legacy `||...||` blocks in assistant
//! text and replace each one with a unique placeholder token.

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

/// Which delimiter family produced a chart segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartDelimiter {
    /// `<chartjs>...</chartjs>`
    Tag,
    /// `||...||`
    Pipes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Annotation,
    Chart(ChartDelimiter),
}

/// A delimited region of the raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    /// Byte span of the whole match (delimiters included) in the raw message.
    pub start: usize,
    pub end: usize,
    /// Text between the delimiters, untrimmed.
    pub payload: &'a str,
    /// Token standing in for this segment in [`ScanResult::text`].
    pub token: String,
    /// The payload contains the other delimiter family (nested or overlapping blocks).
    pub nested: bool,
}

/// Output of [`scan`]: placeholder-bearing text plus the segments in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult<'a> {
    pub text: String,
    pub segments: Vec<Segment<'a>>,
}

const TOKEN_PREFIX: &str = "GDSEG";

static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();

fn segment_regex() -> &'static Regex {
    SEGMENT_RE.get_or_init(|| {
        Regex::new(
            r"(?s)<special>(?P<special>.*?)</special>|<chartjs>(?P<chart>.*?)</chartjs>|\|\|(?P<pipes>.*?)\|\|",
        )
        .expect("segment pattern is valid")
    })
}

/// Pick a token nonce that does not occur anywhere in `text`.
fn token_nonce(text: &str) -> String {
    loop {
        let nonce = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        if !text.contains(&format!("{}{}", TOKEN_PREFIX, nonce)) {
            return nonce;
        }
    }
}

/// Placeholder tokens use only ASCII letters and digits, so markdown and HTML escaping
/// leave them intact. The trailing `X` keeps token 1 from being a prefix of token 10.
fn placeholder(nonce: &str, index: usize) -> String {
    format!("{}{}X{}X", TOKEN_PREFIX, nonce, index)
}

fn contains_foreign_delimiter(kind: SegmentKind, payload: &str) -> bool {
    match kind {
        SegmentKind::Annotation => {
            payload.contains("<chartjs>")
                || payload.contains("</chartjs>")
                || payload.matches("||").count() >= 2
        }
        SegmentKind::Chart(_) => payload.contains("<special>") || payload.contains("</special>"),
    }
}

/// Scan `raw` left to right. Every match is replaced in place by its token; all other
/// bytes are copied through unchanged. Unterminated delimiters never match and stay as text.
pub fn scan(raw: &str) -> ScanResult<'_> {
    let re = segment_regex();
    if !re.is_match(raw) {
        return ScanResult {
            text: raw.to_string(),
            segments: Vec::new(),
        };
    }

    let nonce = token_nonce(raw);
    let mut text = String::with_capacity(raw.len());
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let (kind, payload) = if let Some(m) = caps.name("special") {
            (SegmentKind::Annotation, m.as_str())
        } else if let Some(m) = caps.name("chart") {
            (SegmentKind::Chart(ChartDelimiter::Tag), m.as_str())
        } else if let Some(m) = caps.name("pipes") {
            (SegmentKind::Chart(ChartDelimiter::Pipes), m.as_str())
        } else {
            continue;
        };

        let token = placeholder(&nonce, segments.len() + 1);
        let nested = contains_foreign_delimiter(kind, payload);
        log::debug!(
            "Segment {} {:?} at {}..{}{}",
            segments.len() + 1,
            kind,
            whole.start(),
            whole.end(),
            if nested { " (nested)" } else { "" }
        );

        text.push_str(&raw[last..whole.start()]);
        text.push_str(&token);
        last = whole.end();

        segments.push(Segment {
            kind,
            start: whole.start(),
            end: whole.end(),
            payload,
            token,
            nested,
        });
    }
    text.push_str(&raw[last..]);

    ScanResult { text, segments }
}
