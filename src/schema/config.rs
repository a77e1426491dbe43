use crate::core::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Schema-wide settings
///
/// `log` installs a listener that forwards `log` notifications to the
/// `log` crate. `slave` makes auto-generated identifiers string-typed.
/// Anything else is handed to the adapter untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSettings {
    #[serde(default)]
    pub log: bool,

    #[serde(default)]
    pub slave: bool,

    #[serde(flatten)]
    pub options: Map<String, JsonValue>,
}

impl SchemaSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the default log listener
    pub fn log(mut self, enabled: bool) -> Self {
        self.log = enabled;
        self
    }

    /// Mark the schema as a dependent (slave) schema
    pub fn slave(mut self, enabled: bool) -> Self {
        self.slave = enabled;
        self
    }

    /// Set an adapter-specific option
    pub fn option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    /// Parse from a JSON object
    ///
    /// # Examples
    ///
    /// ```
    /// use modelschema::SchemaSettings;
    /// use serde_json::json;
    ///
    /// let settings = SchemaSettings::from_json(json!({"log": true, "database": "app"})).unwrap();
    /// assert!(settings.log);
    /// assert_eq!(settings.get("database"), Some(&json!("app")));
    /// ```
    pub fn from_json(json: JsonValue) -> Result<Self> {
        serde_json::from_value(json)
            .map_err(|e| SchemaError::InvalidDeclaration(format!("Invalid schema settings: {}", e)))
    }
}
