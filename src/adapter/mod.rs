pub mod memory;

pub use memory::MemoryAdapter;

use crate::core::{Result, SchemaError};
use crate::model::{ModelClass, ModelSettings, Properties, PropertyDefinition};
use crate::schema::{Schema, SchemaSettings};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Optional adapter capabilities. The schema only calls a hook the
/// adapter lists in [`Adapter::hooks`]; otherwise it applies the default
/// outcome itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterHook {
    Connect,
    Disconnect,
    /// Also covers property removal.
    DefineProperty,
    Automigrate,
    Autoupdate,
    IsActual,
    FreezeSchema,
}

impl AdapterHook {
    pub const ALL: &'static [AdapterHook] = &[
        Self::Connect,
        Self::Disconnect,
        Self::DefineProperty,
        Self::Automigrate,
        Self::Autoupdate,
        Self::IsActual,
        Self::FreezeSchema,
    ];
}

/// What an adapter is told about a newly defined model.
#[derive(Debug, Clone, Copy)]
pub struct ModelShape<'a> {
    pub model: &'a Arc<ModelClass>,
    pub properties: &'a Properties,
    pub settings: &'a ModelSettings,
}

/// Storage engine contract consumed by [`Schema`].
///
/// Every async hook must resolve exactly once; the schema applies no
/// timeout, so a hook that never resolves stalls the calling operation.
/// Errors are forwarded to the caller unchanged.
///
/// `hooks` is the only switch for the optional methods below. Overriding
/// `connect` (or any other optional hook) has no effect unless the
/// matching [`AdapterHook`] is listed there.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Optional hooks this adapter implements.
    fn hooks(&self) -> &[AdapterHook] {
        &[]
    }

    /// Called once when the schema is opened; success marks it connected.
    async fn initialize(&self, schema: &Schema) -> Result<()>;

    /// Called once per model definition. Adapters needing async work
    /// should spawn it; the schema does not wait.
    fn define(&self, shape: ModelShape<'_>);

    /// Requires [`AdapterHook::DefineProperty`].
    fn define_property(&self, model: &str, property: &str, definition: &PropertyDefinition) {
        let _ = (model, property, definition);
    }

    /// Requires [`AdapterHook::DefineProperty`].
    fn remove_property(&self, model: &str, property: &str) {
        let _ = (model, property);
    }

    /// Requires [`AdapterHook::FreezeSchema`].
    fn freeze_schema(&self) {}

    /// Requires [`AdapterHook::Connect`].
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Requires [`AdapterHook::Disconnect`].
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Requires [`AdapterHook::Automigrate`].
    async fn automigrate(&self) -> Result<()> {
        Ok(())
    }

    /// Requires [`AdapterHook::Autoupdate`].
    async fn autoupdate(&self) -> Result<()> {
        Ok(())
    }

    /// Requires [`AdapterHook::IsActual`].
    async fn is_actual(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Whether `adapter` declared `hook` in [`Adapter::hooks`].
pub fn supports(adapter: &dyn Adapter, hook: AdapterHook) -> bool {
    adapter.hooks().contains(&hook)
}

pub type AdapterFactory = Arc<dyn Fn(&SchemaSettings) -> Arc<dyn Adapter> + Send + Sync>;

/// Adapters addressable by name
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in `memory` adapter
    pub fn with_default_adapters() -> Self {
        let mut registry = Self::new();
        registry.register("memory", |_settings: &SchemaSettings| {
            Arc::new(MemoryAdapter::new()) as Arc<dyn Adapter>
        });
        registry
    }

    /// Register an adapter factory; replaces any factory with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SchemaSettings) -> Arc<dyn Adapter> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create(&self, name: &str, settings: &SchemaSettings) -> Result<Arc<dyn Adapter>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SchemaError::AdapterNotFound(name.to_string()))?;
        Ok(factory(settings))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_default_adapters()
    }
}
