//! Context vault: the goal/plan context sent with each chat request and updated from
//! backend `contextUpdate` payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error applying a context update.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("context update must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid value for context field '{field}': {source}")]
    InvalidField {
        field: String,
        source: serde_json::Error,
    },
}

/// In-memory context shared with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVault {
    pub goal: Option<Value>,
    pub veins: Vec<Value>,
    pub simulator_state: Map<String, Value>,
    pub plan: Option<Value>,
    pub timestamp: DateTime<Utc>,
    /// Keys the backend sent that the vault has no dedicated field for.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ContextVault {
    fn default() -> Self {
        Self {
            goal: None,
            veins: Vec::new(),
            simulator_state: Map::new(),
            plan: None,
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn field<T: serde::de::DeserializeOwned>(key: &str, value: &Value) -> Result<T, VaultError> {
    serde_json::from_value(value.clone()).map_err(|source| VaultError::InvalidField {
        field: key.to_string(),
        source,
    })
}

impl ContextVault {
    /// Shallow top-level merge: every key in `update` replaces the current value.
    /// Keys absent from `update` are left untouched. The update is applied atomically.
    pub fn merge(&mut self, update: &Value) -> Result<(), VaultError> {
        let obj = update
            .as_object()
            .ok_or_else(|| VaultError::NotAnObject(json_kind(update)))?;
        let mut next = self.clone();
        for (key, value) in obj {
            match key.as_str() {
                "goal" => next.goal = Some(value.clone()).filter(|v| !v.is_null()),
                "plan" => next.plan = Some(value.clone()).filter(|v| !v.is_null()),
                "veins" => next.veins = field(key, value)?,
                "simulator_state" => next.simulator_state = field(key, value)?,
                "timestamp" => next.timestamp = field(key, value)?,
                _ => {
                    next.extra.insert(key.clone(), value.clone());
                }
            }
        }
        log::debug!("Context vault updated ({} key(s))", obj.len());
        *self = next;
        Ok(())
    }

    /// Copy of the current context.
    pub fn snapshot(&self) -> ContextVault {
        self.clone()
    }

    /// JSON form sent to the backend alongside a user message.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
