//! Chat transcript: ordered messages with their render plans, the rendering session that
//! owns chart state, and the context vault.

use serde::Serialize;
use serde_json::Value;

use crate::core::config::WidgetConfig;
use crate::core::pipeline::{self, ChartId, ChartSpec, RenderPlan, RenderSession, Role};
use crate::core::vault::{ContextVault, VaultError};

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub plan: RenderPlan,
}

#[derive(Debug)]
pub struct Transcript {
    welcome_message: String,
    entries: Vec<TranscriptEntry>,
    session: RenderSession,
    vault: ContextVault,
}

impl Transcript {
    /// New transcript opened with the configured welcome message.
    pub fn new(config: &WidgetConfig) -> Self {
        let mut transcript = Self {
            welcome_message: config.welcome_message.clone(),
            entries: Vec::new(),
            session: RenderSession::new(config.pipeline_settings()),
            vault: ContextVault::default(),
        };
        transcript.greet();
        transcript
    }

    fn greet(&mut self) {
        if !self.welcome_message.is_empty() {
            let welcome = self.welcome_message.clone();
            self.push(Role::Assistant, &welcome);
        }
    }

    /// Render `text` as a message from `role` and append it.
    pub fn push(&mut self, role: Role, text: &str) -> &RenderPlan {
        let plan = pipeline::render_for_role(&mut self.session, role, text);
        self.entries.push(TranscriptEntry {
            role,
            text: text.to_string(),
            plan,
        });
        let last = self.entries.len() - 1;
        &self.entries[last].plan
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    /// Specs for the charts of `plan`, for the charting collaborator.
    pub fn charts_for(&self, plan: &RenderPlan) -> Vec<(ChartId, &ChartSpec)> {
        self.session.charts_for(plan)
    }

    /// Remove every message and chart, then show the welcome message again.
    pub fn clear(&mut self) {
        log::info!("Clearing transcript ({} message(s))", self.entries.len());
        self.entries.clear();
        self.session.clear();
        self.greet();
    }

    pub fn vault(&self) -> &ContextVault {
        &self.vault
    }

    /// Merge a backend `contextUpdate` object into the vault.
    pub fn apply_context_update(&mut self, update: &Value) -> Result<(), VaultError> {
        self.vault.merge(update)
    }
}
