#![allow(dead_code)]

use async_trait::async_trait;
use modelschema::{
    Adapter, AdapterHook, ModelShape, PropertyDefinition, Result, Schema, SchemaError,
    SchemaSettings, TypeRegistry,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Adapter that records every call and supports a chosen set of hooks.
#[derive(Default)]
pub struct RecordingAdapter {
    hooks: Vec<AdapterHook>,
    calls: Mutex<Vec<String>>,
    fail_initialize: bool,
    fail_connect: bool,
    fail_disconnect: bool,
    actual: bool,
}

impl RecordingAdapter {
    pub fn bare() -> Self {
        Self::default()
    }

    pub fn with_hooks(hooks: &[AdapterHook]) -> Self {
        Self {
            hooks: hooks.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn actual(mut self, actual: bool) -> Self {
        self.actual = actual;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    fn name(&self) -> &str {
        "recording"
    }

    fn hooks(&self) -> &[AdapterHook] {
        &self.hooks
    }

    async fn initialize(&self, _schema: &Schema) -> Result<()> {
        self.record("initialize");
        if self.fail_initialize {
            return Err(SchemaError::Adapter("initialize refused".into()));
        }
        Ok(())
    }

    fn define(&self, shape: ModelShape<'_>) {
        self.record(format!(
            "define:{}:{}",
            shape.model.model_name(),
            shape.properties.names().join(",")
        ));
    }

    fn define_property(&self, model: &str, property: &str, definition: &PropertyDefinition) {
        self.record(format!(
            "define_property:{}.{}:{}",
            model,
            property,
            definition.type_ref.name()
        ));
    }

    fn remove_property(&self, model: &str, property: &str) {
        self.record(format!("remove_property:{}.{}", model, property));
    }

    fn freeze_schema(&self) {
        self.record("freeze");
    }

    async fn connect(&self) -> Result<()> {
        self.record("connect");
        if self.fail_connect {
            return Err(SchemaError::Adapter("connection refused".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record("disconnect");
        if self.fail_disconnect {
            return Err(SchemaError::Adapter("disconnect failed".into()));
        }
        Ok(())
    }

    async fn automigrate(&self) -> Result<()> {
        self.record("automigrate");
        Ok(())
    }

    async fn autoupdate(&self) -> Result<()> {
        self.record("autoupdate");
        Ok(())
    }

    async fn is_actual(&self) -> Result<bool> {
        self.record("is_actual");
        Ok(self.actual)
    }
}

/// Adapter whose connect and disconnect hooks park until released, so a
/// test can look at the schema while a hook is still running.
#[derive(Default)]
pub struct GatedAdapter {
    gate: Notify,
    entered: Mutex<Vec<&'static str>>,
}

impl GatedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the parked hook finish.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Hooks that have started, in order.
    pub fn entered(&self) -> Vec<&'static str> {
        self.entered.lock().unwrap().clone()
    }

    async fn park(&self, hook: &'static str) {
        self.entered.lock().unwrap().push(hook);
        self.gate.notified().await;
    }
}

#[async_trait]
impl Adapter for GatedAdapter {
    fn name(&self) -> &str {
        "gated"
    }

    fn hooks(&self) -> &[AdapterHook] {
        &[AdapterHook::Connect, AdapterHook::Disconnect]
    }

    async fn initialize(&self, _schema: &Schema) -> Result<()> {
        Ok(())
    }

    fn define(&self, _shape: ModelShape<'_>) {}

    async fn connect(&self) -> Result<()> {
        self.park("connect").await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.park("disconnect").await;
        Ok(())
    }
}

/// Schema over `adapter` with its own type registry, so tests do not
/// share registrations through the process-wide table.
pub fn isolated_schema<A: Adapter + 'static>(adapter: Arc<A>, settings: SchemaSettings) -> Schema {
    Schema::with_type_registry("recording", adapter, settings, TypeRegistry::new().shared())
}
