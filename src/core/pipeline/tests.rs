//! End-to-end pipeline tests.

use std::thread;

use super::{
    ChartId, PipelineSettings, RenderFormat, RenderSession, Role, SharedSession, render_for_role,
    render_message,
};

const BAR_BLOCK: &str = r#"<chartjs>{"type":"bar","data":{"labels":["A"],"datasets":[{"label":"x","data":[1]}]}}</chartjs>"#;

fn session() -> RenderSession {
    RenderSession::new(PipelineSettings::default())
}

fn assert_no_tokens(markup: &str) {
    assert!(!markup.contains("GDSEG"), "placeholder left in: {}", markup);
}

#[test]
fn plain_text_renders_markdown_only() {
    let mut s = session();
    let plan = render_message(&mut s, "Hello **there**\nfriend");
    assert_eq!(plan.format, RenderFormat::Markup);
    assert_eq!(plan.markup, "<p>Hello <strong>there</strong><br>friend</p>");
    assert!(plan.chart_refs.is_empty());
    assert!(s.registry().is_empty());
}

#[test]
fn scenario_a_bold_paragraph_and_list() {
    let mut s = session();
    let plan = render_message(&mut s, "Spending: **$50** saved.\n\n- Item one\n- Item two");
    assert_eq!(
        plan.markup,
        "<p>Spending: <strong>$50</strong> saved.</p><ul><li>Item one</li><li>Item two</li></ul>"
    );
    assert_eq!(plan.markup.matches("<ul>").count(), 1);
}

#[test]
fn scenario_b_single_chart() {
    let mut s = session();
    let plan = render_message(&mut s, &format!("Here you go:\n\n{}", BAR_BLOCK));
    assert_eq!(plan.chart_refs.len(), 1);
    let id = plan.chart_refs[0];
    assert_eq!(s.registry().len(), 1);
    assert_eq!(s.registry().get(id).map(|c| c.chart_type.as_str()), Some("bar"));
    assert!(!plan.markup.contains("gd-chart-error"));
    assert!(plan.markup.contains("<canvas id=\"gd-chart-1\"></canvas>"));
    // The container is block-level, so it is not wrapped in a paragraph.
    assert!(plan.markup.starts_with("<p>Here you go:</p><div class=\"gd-chart-container\""));
    assert_no_tokens(&plan.markup);
}

#[test]
fn scenario_c_invalid_json_is_visible_error() {
    let mut s = session();
    let plan = render_message(&mut s, r#"Chart: <chartjs>{type: "bar"}</chartjs> done"#);
    assert!(plan.chart_refs.is_empty());
    assert!(s.registry().is_empty());
    assert_eq!(plan.markup.matches("class=\"gd-chart-error\"").count(), 1);
    assert!(
        plan.markup.contains("data-error-kind=\"ParseError\"")
            || plan.markup.contains("data-error-kind=\"SyntaxIssue\"")
    );
    assert!(plan.markup.contains(" done"));
    assert_no_tokens(&plan.markup);
}

#[test]
fn scenario_d_two_charts_in_source_order() {
    let mut s = session();
    let line = r#"<chartjs>{"type":"line","data":{"labels":[],"datasets":[]}}</chartjs>"#;
    let plan = render_message(&mut s, &format!("{}\n\nand\n\n{}", BAR_BLOCK, line));
    assert_eq!(plan.chart_refs.len(), 2);
    assert!(plan.chart_refs[0] < plan.chart_refs[1]);
    let charts = s.charts_for(&plan);
    assert_eq!(charts[0].1.chart_type, "bar");
    assert_eq!(charts[1].1.chart_type, "line");
    let first = plan.markup.find("gd-chart-1").unwrap();
    let second = plan.markup.find("gd-chart-2").unwrap();
    assert!(first < second);
}

#[test]
fn ids_keep_increasing_across_messages_until_clear() {
    let mut s = session();
    let a = render_message(&mut s, BAR_BLOCK);
    let b = render_message(&mut s, BAR_BLOCK);
    assert_eq!(a.chart_refs[0].get(), 1);
    assert_eq!(b.chart_refs[0].get(), 2);
    s.clear();
    assert!(s.registry().is_empty());
    let c = render_message(&mut s, BAR_BLOCK);
    assert_eq!(c.chart_refs[0].get(), 1);
}

#[test]
fn failed_chart_does_not_consume_an_id() {
    let mut s = session();
    let plan = render_message(
        &mut s,
        &format!("<chartjs>{{'bad': 1}}</chartjs>\n\n{}", BAR_BLOCK),
    );
    assert_eq!(plan.chart_refs.len(), 1);
    assert_eq!(plan.chart_refs[0].get(), 1);
    assert!(plan.markup.contains("data-error-kind=\"SyntaxIssue\""));
    assert!(plan.markup.contains("gd-chart-1"));
}

#[test]
fn every_referenced_chart_is_registered() {
    let mut s = session();
    let text = format!(
        "{}\n<special>note</special>\n||{{\"type\":\"pie\",\"data\":{{}}}}||\n<chartjs>nope</chartjs>",
        BAR_BLOCK
    );
    let plan = render_message(&mut s, &text);
    assert_eq!(plan.chart_refs.len(), 2);
    for id in &plan.chart_refs {
        assert!(s.registry().contains(*id));
        assert!(plan.markup.contains(&s.element_id(*id)));
    }
    assert!(plan.markup.contains("data-error-kind=\"MalformedEnvelope\""));
    assert_no_tokens(&plan.markup);
}

#[test]
fn annotation_renders_inline() {
    let mut s = session();
    let plan = render_message(&mut s, "Tip: <special> Cut **dining** </special> now");
    assert_eq!(
        plan.markup,
        "<p>Tip: <span class=\"gd-special\">Cut **dining**</span> now</p>"
    );
}

#[test]
fn legacy_pipes_chart_is_migrated() {
    let mut s = session();
    let plan = render_message(
        &mut s,
        r#"||{"type":"bar","data":{"labels":["Jan"],"datasets":[{"data":[5]}]},"options":{"scales":{"yAxes":[{"scaleLabel":{"display":true,"labelString":"USD"}}]}}}||"#,
    );
    let charts = s.charts_for(&plan);
    assert_eq!(charts.len(), 1);
    let scales = &charts[0].1.options.scales;
    assert!(!scales.contains_key("yAxes"));
    assert_eq!(scales["y"]["title"]["text"], serde_json::json!("USD"));
}

#[test]
fn nested_segments_are_rejected() {
    let mut s = session();
    let plan = render_message(
        &mut s,
        &format!("<special>look {}</special>", BAR_BLOCK),
    );
    assert!(plan.chart_refs.is_empty());
    assert!(s.registry().is_empty());
    assert!(plan.markup.contains("data-error-kind=\"NestedSegment\""));
}

#[test]
fn legacy_pipes_inside_annotation_are_rejected() {
    let mut s = session();
    let plan = render_message(
        &mut s,
        r#"<special>See ||{"type":"bar","data":{"labels":[],"datasets":[]}}||</special>"#,
    );
    assert!(plan.chart_refs.is_empty());
    assert!(plan.markup.contains("data-error-kind=\"NestedSegment\""));
    assert!(!plan.markup.contains("gd-special"));
}

#[test]
fn chart_on_its_own_line_is_not_inside_a_paragraph() {
    let mut s = session();
    let plan = render_message(&mut s, &format!("Here is your chart:\n{}\nNice.", BAR_BLOCK));
    assert_no_tokens(&plan.markup);
    assert_eq!(plan.chart_refs.len(), 1);
    assert_eq!(plan.chart_refs[0].get(), 1);
    assert!(plan.markup.starts_with("<p>Here is your chart:</p><div class=\"gd-chart-container\""));
    assert!(plan.markup.ends_with("</div><p>Nice.</p>"));
    assert!(!plan.markup.contains("<br>"));
}

#[test]
fn unterminated_delimiters_stay_as_text() {
    let mut s = session();
    let plan = render_message(&mut s, "Broken <chartjs>{\"type\":\"bar\"}");
    assert_eq!(
        plan.markup,
        "<p>Broken &lt;chartjs&gt;{&quot;type&quot;:&quot;bar&quot;}</p>"
    );
}

#[test]
fn user_content_cannot_forge_markup() {
    let mut s = session();
    let plan = render_message(&mut s, "<img src=x onerror=alert(1)> <special><b>hi</b></special>");
    assert!(!plan.markup.contains("<img"));
    assert!(!plan.markup.contains("<b>"));
}

#[test]
fn non_assistant_roles_are_plain_text() {
    let mut s = session();
    let raw = "**not bold** <chartjs>{\"type\":\"bar\",\"data\":{}}</chartjs>";
    for role in [Role::User, Role::System] {
        let plan = render_for_role(&mut s, role, raw);
        assert_eq!(plan.format, RenderFormat::PlainText);
        assert_eq!(plan.markup, raw);
        assert!(plan.chart_refs.is_empty());
    }
    assert!(s.registry().is_empty());
}

#[test]
fn role_parse_defaults_to_system() {
    assert_eq!(Role::parse("Assistant"), Role::Assistant);
    assert_eq!(Role::parse(" user "), Role::User);
    assert_eq!(Role::parse("bot"), Role::System);
}

#[test]
fn custom_prefix_and_preview_len() {
    let mut s = RenderSession::new(PipelineSettings {
        preview_len: 5,
        chart_id_prefix: "chart_".to_string(),
    });
    let plan = render_message(&mut s, &format!("{}\n\n<chartjs>abcdefghij</chartjs>", BAR_BLOCK));
    assert!(plan.markup.contains("id=\"chart_1\""));
    assert!(plan.markup.contains("<pre>abcde…</pre>"));
}

#[test]
fn shared_session_assigns_unique_ids_across_threads() {
    let shared = SharedSession::new(session());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                (0..5)
                    .flat_map(|_| shared.render(Role::Assistant, BAR_BLOCK).chart_refs)
                    .collect::<Vec<ChartId>>()
            })
        })
        .collect();
    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("render thread"))
        .map(ChartId::get)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=40).collect::<Vec<u64>>());
    assert_eq!(shared.with(|s| s.registry().len()), 40);
    shared.clear();
    assert!(shared.with(|s| s.registry().is_empty()));
}
