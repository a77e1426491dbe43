use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Free-form per-model settings. Only `table` is interpreted by the core;
/// everything else is carried through to the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSettings(Map<String, JsonValue>);

impl ModelSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backing table name
    pub fn with_table(self, table: impl Into<String>) -> Self {
        self.with("table", JsonValue::String(table.into()))
    }

    pub fn with(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.0.get("table").and_then(JsonValue::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

impl From<Map<String, JsonValue>> for ModelSettings {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}
