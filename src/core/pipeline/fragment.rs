//! HTML fragments substituted for segment placeholders.

use super::chart::ChartFailure;
use super::markdown::escape_html;

/// Styled inline block around the trimmed annotation text.
pub fn annotation(payload: &str) -> String {
    let body = escape_html(payload.trim()).replace('\n', "<br>");
    format!("<span class=\"gd-special\">{}</span>", body)
}

/// Container the charting library renders into, with expand/export actions keyed by the
/// same id.
pub fn chart_container(element_id: &str) -> String {
    let id = escape_html(element_id);
    format!(
        "<div class=\"gd-chart-container\" data-chart-id=\"{id}\">\
         <div class=\"gd-chart-actions\">\
         <button type=\"button\" class=\"gd-chart-expand\" data-action=\"expand\" data-chart-id=\"{id}\" title=\"Open in expanded view\">Expand</button>\
         <button type=\"button\" class=\"gd-chart-export\" data-action=\"export\" data-chart-id=\"{id}\" title=\"Export as PDF\">Export</button>\
         </div>\
         <canvas id=\"{id}\"></canvas>\
         </div>"
    )
}

/// Visible, debuggable replacement for a chart block that could not be rendered.
pub fn chart_error(failure: &ChartFailure) -> String {
    let mut out = format!(
        "<div class=\"gd-chart-error\" data-error-kind=\"{}\"><strong>⚠️ {}</strong>",
        escape_html(failure.kind),
        escape_html(&failure.message)
    );
    if !failure.issues.is_empty() {
        out.push_str("<ul class=\"gd-chart-error-issues\">");
        for issue in &failure.issues {
            out.push_str("<li>");
            out.push_str(&escape_html(issue));
            out.push_str("</li>");
        }
        out.push_str("</ul>");
    }
    out.push_str("<details class=\"gd-chart-debug\"><summary>Debug info</summary><pre>");
    out.push_str(&escape_html(&failure.preview));
    out.push_str("</pre></details></div>");
    out
}
