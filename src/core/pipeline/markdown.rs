//! Markdown renderer for assistant text: **bold**, *italic*, paragraphs, line breaks and
//! `- ` bullet lists, emitted as HTML. Input is escaped first, so the output is safe to
//! inject.

use std::sync::OnceLock;

use regex::Regex;

/// Escape text for use in HTML element content and quoted attribute values.
pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static ITALIC_RE: OnceLock<Regex> = OnceLock::new();

fn bold_regex() -> &'static Regex {
    // `***x***` is bold italic; it must win over `**` so the stars pair up.
    BOLD_RE.get_or_init(|| {
        Regex::new(r"\*\*\*([^*\n]+?)\*\*\*|\*\*(.+?)\*\*").expect("bold pattern is valid")
    })
}

fn italic_regex() -> &'static Regex {
    // No whitespace just inside the markers: `5 * 3 * 2` is arithmetic, not emphasis.
    ITALIC_RE.get_or_init(|| {
        Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").expect("italic pattern is valid")
    })
}

fn italic(text: &str, out: &mut String) {
    out.push_str(&italic_regex().replace_all(text, "<em>$1</em>"));
}

/// Bold spans are cut out first and italic runs separately inside and between them, so
/// emphasis never crosses a `<strong>` boundary.
fn render_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 16);
    let mut last = 0;
    for caps in bold_regex().captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        italic(&line[last..whole.start()], &mut out);
        if let Some(inner) = caps.get(1) {
            out.push_str("<strong><em>");
            out.push_str(inner.as_str());
            out.push_str("</em></strong>");
        } else if let Some(inner) = caps.get(2) {
            out.push_str("<strong>");
            italic(inner.as_str(), &mut out);
            out.push_str("</strong>");
        }
        last = whole.end();
    }
    italic(&line[last..], &mut out);
    out
}

fn bullet_item(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("- ")
}

enum Run<'a> {
    Text(Vec<&'a str>),
    List(Vec<&'a str>),
    Block(&'a str),
}

/// Split one blank-line-delimited block into text, list and block-token runs. A line that
/// is exactly a block token always stands alone.
fn runs<'a>(lines: &[&'a str], block_tokens: &[&str]) -> Vec<Run<'a>> {
    let mut out: Vec<Run<'a>> = Vec::new();
    for &line in lines {
        let trimmed = line.trim();
        if block_tokens.contains(&trimmed) {
            out.push(Run::Block(trimmed));
            continue;
        }
        match (bullet_item(line), out.last_mut()) {
            (Some(item), Some(Run::List(items))) => items.push(item),
            (Some(item), _) => out.push(Run::List(vec![item])),
            (None, Some(Run::Text(text))) => text.push(line),
            (None, _) => out.push(Run::Text(vec![line])),
        }
    }
    out
}

/// Render markdown `text` to HTML.
///
/// Paragraphs are separated by blank lines, single newlines become `<br>`, and each run of
/// consecutive bullet lines becomes one `<ul>`. A line consisting of nothing but one of
/// `block_tokens` is emitted bare between paragraphs, since it will be replaced by
/// block-level markup.
pub fn render(text: &str, block_tokens: &[&str]) -> String {
    let escaped = escape_html(&text.replace("\r\n", "\n"));
    let mut out = String::with_capacity(escaped.len() + 32);
    let mut block: Vec<&str> = Vec::new();

    let mut lines = escaped.split('\n').peekable();
    while let Some(line) = lines.next() {
        let blank = line.trim().is_empty();
        if !blank {
            block.push(line.trim_end());
        }
        if (blank || lines.peek().is_none()) && !block.is_empty() {
            render_block(&block, block_tokens, &mut out);
            block.clear();
        }
    }
    out
}

fn render_block(lines: &[&str], block_tokens: &[&str], out: &mut String) {
    for run in runs(lines, block_tokens) {
        match run {
            Run::List(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    out.push_str(&render_inline(item.trim()));
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
            Run::Block(token) => out.push_str(token),
            Run::Text(text) => {
                let body = text
                    .iter()
                    .map(|line| render_inline(line))
                    .collect::<Vec<_>>()
                    .join("<br>");
                out.push_str("<p>");
                out.push_str(&body);
                out.push_str("</p>");
            }
        }
    }
}

/// Replace each placeholder token with its fragment. Tokens are unique, so each is
/// replaced at most once.
pub fn substitute(markup: &str, fragments: &[(String, String)]) -> String {
    let mut out = markup.to_string();
    for (token, fragment) in fragments {
        out = out.replacen(token.as_str(), fragment, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render("", &[]), "");
        assert_eq!(render("\n\n  \n", &[]), "");
    }

    #[test]
    fn plain_line_is_wrapped_in_paragraph() {
        assert_eq!(render("Hello", &[]), "<p>Hello</p>");
    }

    #[test]
    fn bold_and_italic() {
        assert_eq!(
            render("**big** and *small* and **two** words", &[]),
            "<p><strong>big</strong> and <em>small</em> and <strong>two</strong> words</p>"
        );
    }

    #[test]
    fn triple_stars_are_bold_italic() {
        assert_eq!(
            render("***Save*** now", &[]),
            "<p><strong><em>Save</em></strong> now</p>"
        );
    }

    #[test]
    fn italic_never_crosses_bold() {
        assert_eq!(
            render("**a *b** c*", &[]),
            "<p><strong>a *b</strong> c*</p>"
        );
        assert_eq!(
            render("**bold *inner* text** and *out*", &[]),
            "<p><strong>bold <em>inner</em> text</strong> and <em>out</em></p>"
        );
    }

    #[test]
    fn arithmetic_stars_are_not_italic() {
        assert_eq!(render("5 * 3 * 2", &[]), "<p>5 * 3 * 2</p>");
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(render("a **b", &[]), "<p>a **b</p>");
    }

    #[test]
    fn newlines_and_paragraphs() {
        assert_eq!(
            render("one\ntwo\n\nthree", &[]),
            "<p>one<br>two</p><p>three</p>"
        );
        assert_eq!(render("a\r\n\r\nb", &[]), "<p>a</p><p>b</p>");
    }

    #[test]
    fn bullet_list_single_container() {
        assert_eq!(
            render("- one\n- **two**\n  - three", &[]),
            "<ul><li>one</li><li><strong>two</strong></li><li>three</li></ul>"
        );
    }

    #[test]
    fn text_then_list_in_same_block() {
        assert_eq!(
            render("Options:\n- a\n- b\nThat's it", &[]),
            "<p>Options:</p><ul><li>a</li><li>b</li></ul><p>That&#39;s it</p>"
        );
    }

    #[test]
    fn separate_bullet_runs_get_separate_lists() {
        assert_eq!(
            render("- a\n- b\nthen\n- c\n\n- d", &[]),
            "<ul><li>a</li><li>b</li></ul><p>then</p><ul><li>c</li></ul><ul><li>d</li></ul>"
        );
    }

    #[test]
    fn dash_without_space_is_not_a_bullet() {
        assert_eq!(render("-5 dollars", &[]), "<p>-5 dollars</p>");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            render("<script>alert(\"x\")</script> & more", &[]),
            "<p>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn standalone_block_token_is_not_wrapped() {
        let token = "GDSEGABCX1X";
        let text = format!("Intro\n\n{}\n\nOutro", token);
        assert_eq!(
            render(&text, &[token]),
            "<p>Intro</p>GDSEGABCX1X<p>Outro</p>"
        );
        // Inline use stays inside the paragraph.
        let text = format!("See {} here", token);
        assert_eq!(render(&text, &[token]), "<p>See GDSEGABCX1X here</p>");
    }

    #[test]
    fn block_token_line_splits_paragraph() {
        let token = "GDSEGABCX1X";
        let text = format!("Intro:\n{}\nMore", token);
        assert_eq!(
            render(&text, &[token]),
            "<p>Intro:</p>GDSEGABCX1X<p>More</p>"
        );
        let text = format!("- a\n{}\n- b", token);
        assert_eq!(
            render(&text, &[token]),
            "<ul><li>a</li></ul>GDSEGABCX1X<ul><li>b</li></ul>"
        );
    }

    #[test]
    fn tokens_survive_markdown() {
        let token = "GDSEG0F3AX12X";
        let out = render(&format!("**{}** and *{}*", token, token), &[]);
        assert_eq!(out.matches(token).count(), 2);
    }

    #[test]
    fn substitute_replaces_exact_tokens() {
        let markup = "<p>AX1X and AX10X</p>";
        let fragments = vec![
            ("AX1X".to_string(), "<b>one</b>".to_string()),
            ("AX10X".to_string(), "<b>ten</b>".to_string()),
        ];
        assert_eq!(
            substitute(markup, &fragments),
            "<p><b>one</b> and <b>ten</b></p>"
        );
    }
}
