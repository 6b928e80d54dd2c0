//! Message content pipeline: turn one raw assistant reply into sanitized markup plus the
//! charts it must realize.
//!
//! raw text → [`scanner`] (segments become placeholder tokens) → chart payloads through
//! [`chart`] → [`markdown`] over the placeholder-bearing text → placeholders replaced by
//! [`fragment`] markup.

pub mod chart;
pub mod fragment;
pub mod markdown;
pub mod scanner;
mod session;

pub use chart::{ChartError, ChartFailure, ChartSpec};
pub use session::{ChartId, ChartRegistry, PipelineSettings, RenderSession, SharedSession};

use serde::{Deserialize, Serialize};

use scanner::SegmentKind;

/// Sender of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
    System,
}

impl Role {
    /// Parse a sender name; anything unrecognized is treated as `system`.
    pub fn parse(s: &str) -> Role {
        match s.trim().to_ascii_lowercase().as_str() {
            "assistant" => Role::Assistant,
            "user" => Role::User,
            _ => Role::System,
        }
    }
}

/// How the DOM collaborator must treat [`RenderPlan::markup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    /// Sanitized HTML, inject as markup.
    Markup,
    /// Literal text, set as text content.
    PlainText,
}

/// Final markup for one message plus the charts it references, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub format: RenderFormat,
    pub markup: String,
    pub chart_refs: Vec<ChartId>,
}

impl RenderPlan {
    fn plain(text: &str) -> Self {
        Self {
            format: RenderFormat::PlainText,
            markup: text.to_string(),
            chart_refs: Vec::new(),
        }
    }
}

/// Render a message from `role`. Only assistant messages go through the pipeline.
pub fn render_for_role(session: &mut RenderSession, role: Role, raw: &str) -> RenderPlan {
    match role {
        Role::Assistant => render_message(session, raw),
        Role::User | Role::System => RenderPlan::plain(raw),
    }
}

/// Run the full pipeline on one assistant message.
pub fn render_message(session: &mut RenderSession, raw: &str) -> RenderPlan {
    let scan = scanner::scan(raw);
    let preview_len = session.settings().preview_len;

    let mut fragments = Vec::with_capacity(scan.segments.len());
    let mut block_tokens = Vec::new();
    let mut chart_refs = Vec::new();

    for segment in &scan.segments {
        let fragment = if segment.nested {
            log::warn!("Rejecting nested segment at {}..{}", segment.start, segment.end);
            block_tokens.push(segment.token.as_str());
            let raw_block = &raw[segment.start..segment.end];
            fragment::chart_error(&chart::ChartFailure::nested(raw_block, preview_len))
        } else {
            match segment.kind {
                SegmentKind::Annotation => fragment::annotation(segment.payload),
                SegmentKind::Chart(_) => {
                    block_tokens.push(segment.token.as_str());
                    let accepted = session.accept_chart(segment.payload).map(|(id, _)| id);
                    match accepted {
                        Ok(id) => {
                            chart_refs.push(id);
                            fragment::chart_container(&session.element_id(id))
                        }
                        Err(failure) => fragment::chart_error(&failure),
                    }
                }
            }
        };
        fragments.push((segment.token.clone(), fragment));
    }

    let markup = markdown::render(&scan.text, &block_tokens);
    let markup = markdown::substitute(&markup, &fragments);

    RenderPlan {
        format: RenderFormat::Markup,
        markup,
        chart_refs,
    }
}

#[cfg(test)]
mod tests;
