//! Rendering session: the chart registry and identifier counter shared by every message
//! of one transcript.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use super::chart::{self, ChartFailure, ChartSpec};
use super::{RenderPlan, Role};
use crate::core::config::WidgetConfig;

/// Pipeline settings taken from [`WidgetConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Maximum characters of raw payload shown in an error fragment.
    pub preview_len: usize,
    /// Prefix of chart element ids in markup.
    pub chart_id_prefix: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        WidgetConfig::default().pipeline_settings()
    }
}

/// Chart identifier, unique within a session and assigned in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChartId(u64);

impl ChartId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized charts of the current transcript, by id.
#[derive(Debug, Clone, Default)]
pub struct ChartRegistry {
    entries: BTreeMap<ChartId, ChartSpec>,
}

impl ChartRegistry {
    pub fn get(&self, id: ChartId) -> Option<&ChartSpec> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ChartId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ChartId, &ChartSpec)> {
        self.entries.iter().map(|(id, spec)| (*id, spec))
    }
}

/// State owned by one transcript: registry, id counter and settings.
#[derive(Debug)]
pub struct RenderSession {
    id: Uuid,
    settings: PipelineSettings,
    next_chart: u64,
    registry: ChartRegistry,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

impl RenderSession {
    pub fn new(settings: PipelineSettings) -> Self {
        let id = Uuid::new_v4();
        log::debug!("Render session {} started", id);
        Self {
            id,
            settings,
            next_chart: 1,
            registry: ChartRegistry::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// DOM id of a chart's container, e.g. `gd-chart-1`.
    pub fn element_id(&self, id: ChartId) -> String {
        format!("{}{}", self.settings.chart_id_prefix, id)
    }

    /// Normalize a chart payload; on success register it under a fresh id.
    pub fn accept_chart(&mut self, raw: &str) -> Result<(ChartId, &ChartSpec), ChartFailure> {
        match chart::normalize_payload(raw) {
            Ok(spec) => {
                let id = ChartId(self.next_chart);
                self.next_chart += 1;
                log::debug!(
                    "Session {}: registered chart {} ({})",
                    self.id,
                    id,
                    spec.chart_type
                );
                let spec: &ChartSpec = self.registry.entries.entry(id).or_insert(spec);
                Ok((id, spec))
            }
            Err(err) => {
                log::warn!("Session {}: chart rejected [{}] {}", self.id, err.kind(), err);
                Err(ChartFailure::new(&err, raw, self.settings.preview_len))
            }
        }
    }

    /// Chart specs referenced by `plan`, in the order the plan lists them.
    pub fn charts_for(&self, plan: &RenderPlan) -> Vec<(ChartId, &ChartSpec)> {
        plan.chart_refs
            .iter()
            .filter_map(|id| self.registry.get(*id).map(|spec| (*id, spec)))
            .collect()
    }

    /// Drop every chart and restart identifiers at 1 (transcript cleared).
    pub fn clear(&mut self) {
        log::info!(
            "Session {}: clearing {} chart(s)",
            self.id,
            self.registry.len()
        );
        self.registry.entries.clear();
        self.next_chart = 1;
    }
}

/// A [`RenderSession`] behind one lock, for hosts that render messages concurrently.
#[derive(Debug, Clone, Default)]
pub struct SharedSession(Arc<Mutex<RenderSession>>);

impl SharedSession {
    pub fn new(session: RenderSession) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    // Session state is plain data; a panic mid-render leaves it usable.
    fn lock(&self) -> MutexGuard<'_, RenderSession> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render one message while holding the lock for the whole invocation.
    pub fn render(&self, role: Role, raw: &str) -> RenderPlan {
        let mut session = self.lock();
        super::render_for_role(&mut session, role, raw)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut RenderSession) -> R) -> R {
        let mut session = self.lock();
        f(&mut session)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
