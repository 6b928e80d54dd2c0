//! Heuristic syntax checks run before JSON parsing, so the usual mistakes in model-written
//! chart configs get a specific message instead of an opaque parser error.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxIssue {
    SingleQuotedString,
    FunctionLiteral,
    UnbalancedBraces { open: usize, close: usize },
    TrailingComma,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxIssue::SingleQuotedString => {
                write!(f, "single-quoted strings (JSON requires double quotes)")
            }
            SyntaxIssue::FunctionLiteral => {
                write!(f, "function literals (chart data must be plain JSON)")
            }
            SyntaxIssue::UnbalancedBraces { open, close } => {
                write!(f, "unbalanced braces ({} opening, {} closing)", open, close)
            }
            SyntaxIssue::TrailingComma => {
                write!(f, "trailing comma before a closing brace or bracket")
            }
        }
    }
}

static FUNCTION_RE: OnceLock<Regex> = OnceLock::new();
static TRAILING_COMMA_RE: OnceLock<Regex> = OnceLock::new();

fn function_regex() -> &'static Regex {
    FUNCTION_RE.get_or_init(|| {
        Regex::new(r"\bfunction\s*[\w$]*\s*\(|=>").expect("function pattern is valid")
    })
}

fn trailing_comma_regex() -> &'static Regex {
    TRAILING_COMMA_RE
        .get_or_init(|| Regex::new(r",\s*[}\]]").expect("trailing comma pattern is valid"))
}

/// Blank out the contents of double-quoted strings so apostrophes, braces and commas
/// inside string values are not mistaken for structure. Quotes themselves are kept.
fn strip_strings(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in payload.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                out.push('"');
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

/// Return every detected issue, in a fixed order. Empty means the payload looks like JSON.
pub fn check(payload: &str) -> Vec<SyntaxIssue> {
    let code = strip_strings(payload);
    let mut issues = Vec::new();

    if code.contains('\'') {
        issues.push(SyntaxIssue::SingleQuotedString);
    }
    if function_regex().is_match(&code) {
        issues.push(SyntaxIssue::FunctionLiteral);
    }
    let open = code.matches('{').count();
    let close = code.matches('}').count();
    if open != close {
        issues.push(SyntaxIssue::UnbalancedBraces { open, close });
    }
    if trailing_comma_regex().is_match(&code) {
        issues.push(SyntaxIssue::TrailingComma);
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_has_no_issues() {
        let payload = r#"{"type":"bar","data":{"labels":["A","B"],"datasets":[]}}"#;
        assert!(check(payload).is_empty());
    }

    #[test]
    fn apostrophe_inside_string_is_fine() {
        let payload = r#"{"type":"bar","options":{"title":"Bob's {savings}, [2024]"}}"#;
        assert!(check(payload).is_empty());
    }

    #[test]
    fn escaped_quote_inside_string() {
        let payload = r#"{"label":"say \"hi\" ',}"}"#;
        assert!(check(payload).is_empty());
    }

    #[test]
    fn detects_single_quotes() {
        assert_eq!(
            check("{'type': 'bar'}"),
            vec![SyntaxIssue::SingleQuotedString]
        );
    }

    #[test]
    fn detects_function_literals() {
        let issues = check(r#"{"callback": function(v) { return v + "%"; }}"#);
        assert!(issues.contains(&SyntaxIssue::FunctionLiteral));
        let issues = check(r#"{"callback": (v) => v}"#);
        assert!(issues.contains(&SyntaxIssue::FunctionLiteral));
    }

    #[test]
    fn function_word_inside_string_is_fine() {
        assert!(check(r#"{"label":"function(x) => y"}"#).is_empty());
    }

    #[test]
    fn detects_unbalanced_braces() {
        assert_eq!(
            check(r#"{"type":"bar","data":{"labels":[]}"#),
            vec![SyntaxIssue::UnbalancedBraces { open: 2, close: 1 }]
        );
    }

    #[test]
    fn detects_trailing_commas() {
        assert_eq!(check(r#"{"a":[1,2,],}"#), vec![SyntaxIssue::TrailingComma]);
        assert_eq!(check("{\"a\":1,\n}"), vec![SyntaxIssue::TrailingComma]);
    }

    #[test]
    fn reports_every_issue_in_order() {
        let issues = check("{'a': function() {},");
        assert_eq!(
            issues,
            vec![
                SyntaxIssue::SingleQuotedString,
                SyntaxIssue::FunctionLiteral,
                SyntaxIssue::UnbalancedBraces { open: 2, close: 1 },
            ]
        );
    }

    #[test]
    fn display_is_human_readable() {
        let s = SyntaxIssue::UnbalancedBraces { open: 3, close: 1 }.to_string();
        assert_eq!(s, "unbalanced braces (3 opening, 1 closing)");
    }
}
