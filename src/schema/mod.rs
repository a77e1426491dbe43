pub mod builder;
pub mod config;
pub mod events;
pub mod state;

pub use builder::ModelBuilder;
pub use config::SchemaSettings;
pub use events::{Listener, ListenerId, SchemaEvent};
pub use state::ConnectionState;

use crate::adapter::{self, Adapter, AdapterHook, AdapterRegistry, ModelShape};
use crate::core::{Result, SchemaError};
use crate::model::{ModelClass, ModelSettings, Properties, PropertyDefinition};
use crate::types::{CustomType, SharedTypeRegistry, TypeRef, TypeRegistry};
use events::Listeners;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{Instrument, Level, event, info_span};

/// The stored shape of one model: its (shared) property map and settings.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    properties: Arc<RwLock<Properties>>,
    settings: ModelSettings,
}

impl ModelDefinition {
    pub fn properties(&self) -> Result<Properties> {
        Ok(self.properties.read()?.clone())
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }
}

pub(crate) struct SchemaInner {
    name: String,
    settings: SchemaSettings,
    adapter: Arc<dyn Adapter>,
    types: SharedTypeRegistry,
    state: RwLock<ConnectionState>,
    models: RwLock<HashMap<String, Arc<ModelClass>>>,
    definitions: RwLock<HashMap<String, ModelDefinition>>,
    listeners: Listeners,
}

/// Registry of model classes bound to one storage adapter.
///
/// Cheap to clone; clones share every registry and the connection state.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Creates a schema in the `Connecting` state without initializing the
    /// adapter; call [`Schema::initialize`] (or use [`Schema::open`]).
    /// Named types resolve against the process-wide registry.
    pub fn new(name: impl Into<String>, adapter: Arc<dyn Adapter>, settings: SchemaSettings) -> Self {
        Self::with_type_registry(name, adapter, settings, Arc::clone(TypeRegistry::global()))
    }

    /// Like [`Schema::new`], with an injected type registry.
    pub fn with_type_registry(
        name: impl Into<String>,
        adapter: Arc<dyn Adapter>,
        settings: SchemaSettings,
        types: SharedTypeRegistry,
    ) -> Self {
        let schema = Self {
            inner: Arc::new(SchemaInner {
                name: name.into(),
                settings,
                adapter,
                types,
                state: RwLock::new(ConnectionState::Connecting),
                models: RwLock::new(HashMap::new()),
                definitions: RwLock::new(HashMap::new()),
                listeners: Listeners::default(),
            }),
        };

        if schema.inner.settings.log {
            schema.on(|event: &SchemaEvent| {
                if let SchemaEvent::Log { message, duration } = event {
                    match duration {
                        Some(duration) => log::info!("{} ({} ms)", message, duration.as_millis()),
                        None => log::info!("{}", message),
                    }
                }
            });
        }

        schema
    }

    /// Resolves the adapter called `name` from the default adapter registry,
    /// then initializes it.
    pub async fn open(name: &str, settings: SchemaSettings) -> Result<Self> {
        Self::open_with(&AdapterRegistry::with_default_adapters(), name, settings).await
    }

    pub async fn open_with(
        registry: &AdapterRegistry,
        name: &str,
        settings: SchemaSettings,
    ) -> Result<Self> {
        let adapter = registry.create(name, &settings)?;
        let schema = Self::new(name, adapter, settings);
        schema.initialize().await?;
        Ok(schema)
    }

    pub(crate) fn from_inner(inner: Arc<SchemaInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn settings(&self) -> &SchemaSettings {
        &self.inner.settings
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.inner.adapter
    }

    pub fn types(&self) -> &SharedTypeRegistry {
        &self.inner.types
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    pub fn state(&self) -> ConnectionState {
        self.inner
            .state
            .read()
            .map(|state| *state)
            .unwrap_or(ConnectionState::Failed)
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.state().is_connecting()
    }

    fn supports(&self, hook: AdapterHook) -> bool {
        adapter::supports(self.inner.adapter.as_ref(), hook)
    }

    fn set_state(&self, next: ConnectionState) -> Result<()> {
        let mut state = self.inner.state.write()?;
        let previous = *state;
        event!(Level::DEBUG, schema = %self.inner.name, from = %previous, to = %next, "connection state change");
        *state = next;
        Ok(())
    }

    /// Runs the adapter's one-time initialization.
    pub async fn initialize(&self) -> Result<()> {
        let span = info_span!("schema_initialize", schema = %self.inner.name);
        let result = self.inner.adapter.initialize(self).instrument(span).await;
        self.finish_connect(result)
    }

    /// Connects through the adapter's hook. Without a hook the call
    /// completes on the next scheduler turn and the state is left alone.
    pub async fn connect(&self) -> Result<()> {
        if !self.supports(AdapterHook::Connect) {
            tokio::task::yield_now().await;
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting)?;
        let span = info_span!("schema_connect", schema = %self.inner.name);
        let result = self.inner.adapter.connect().instrument(span).await;
        self.finish_connect(result)
    }

    fn finish_connect(&self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.set_state(ConnectionState::Connected)?;
                self.emit(&SchemaEvent::Connected);
                Ok(())
            }
            Err(err) => {
                warn!("schema '{}' failed to connect: {}", self.inner.name, err);
                self.set_state(ConnectionState::Failed)?;
                Err(err)
            }
        }
    }

    /// Disconnects through the adapter's hook. The state becomes
    /// `Disconnected` before the hook runs; a failing hook leaves `Failed`.
    pub async fn disconnect(&self) -> Result<()> {
        if !self.supports(AdapterHook::Disconnect) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnected)?;
        match self.inner.adapter.disconnect().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.set_state(ConnectionState::Failed)?;
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Lets the adapter lock in the current set of definitions.
    pub fn freeze(&self) {
        if self.supports(AdapterHook::FreezeSchema) {
            self.inner.adapter.freeze_schema();
        }
    }

    fn before_structural_op(&self, operation: &str) {
        self.freeze();
        let state = self.state();
        if !state.allows_structural_ops() {
            warn!(
                "schema '{}' runs {} while {}",
                self.inner.name, operation, state
            );
        }
    }

    pub async fn automigrate(&self) -> Result<()> {
        self.before_structural_op("automigrate");
        if !self.supports(AdapterHook::Automigrate) {
            return Ok(());
        }
        let span = info_span!("schema_automigrate", schema = %self.inner.name);
        self.inner.adapter.automigrate().instrument(span).await
    }

    pub async fn autoupdate(&self) -> Result<()> {
        self.before_structural_op("autoupdate");
        if !self.supports(AdapterHook::Autoupdate) {
            return Ok(());
        }
        let span = info_span!("schema_autoupdate", schema = %self.inner.name);
        self.inner.adapter.autoupdate().instrument(span).await
    }

    /// Whether the backing store already matches the definitions.
    /// Adapters without the hook report `true`.
    pub async fn is_actual(&self) -> Result<bool> {
        self.before_structural_op("is_actual");
        if !self.supports(AdapterHook::IsActual) {
            return Ok(true);
        }
        self.inner.adapter.is_actual().await
    }

    // ------------------------------------------------------------------
    // Model factory
    // ------------------------------------------------------------------

    /// Defines (or redefines) a model and returns its class.
    ///
    /// Declarations are not validated; a bad type only fails when a value
    /// is first coerced. An `id` property is added unless declared, typed
    /// `String` for slave schemas and `Integer` otherwise. A previously
    /// returned class for the same name keeps working but is no longer
    /// registered.
    pub fn define(
        &self,
        name: impl Into<String>,
        properties: Properties,
        settings: ModelSettings,
    ) -> Result<Arc<ModelClass>> {
        let name = name.into();
        let mut properties = properties;
        if !properties.contains("id") {
            let id_type = if self.inner.settings.slave {
                TypeRef::String
            } else {
                TypeRef::Integer
            };
            properties.declare("id", id_type);
        }

        let shared = Arc::new(RwLock::new(properties));
        let model = Arc::new(ModelClass::new(
            name.clone(),
            settings.clone(),
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.types),
            Arc::clone(&shared),
        ));

        self.inner
            .models
            .write()?
            .insert(name.clone(), Arc::clone(&model));
        self.inner.definitions.write()?.insert(
            name.clone(),
            ModelDefinition {
                properties: shared,
                settings: settings.clone(),
            },
        );

        let snapshot = model.properties()?;
        self.inner.adapter.define(ModelShape {
            model: &model,
            properties: &snapshot,
            settings: &settings,
        });

        model.for_each_property(|attr| model.register_property(attr))?;

        event!(
            Level::DEBUG,
            schema = %self.inner.name,
            model = %name,
            properties = snapshot.len(),
            "model defined"
        );

        self.emit(&SchemaEvent::Define {
            model: Arc::clone(&model),
            name,
            properties: snapshot,
            settings,
        });

        Ok(model)
    }

    /// Adds or replaces one property of an existing model and rebinds its
    /// accessor.
    pub fn define_property(
        &self,
        model: &str,
        property: &str,
        definition: PropertyDefinition,
    ) -> Result<()> {
        let stored = self.definition(model)?;
        stored
            .properties
            .write()?
            .insert(property, definition.clone());
        self.model(model)?.register_property(property)?;

        if self.supports(AdapterHook::DefineProperty) {
            self.inner
                .adapter
                .define_property(model, property, &definition);
        }
        Ok(())
    }

    /// Drops a property from the stored definition and the model's
    /// accessors, then tells the adapter through its property hook.
    pub fn remove_property(
        &self,
        model: &str,
        property: &str,
    ) -> Result<Option<PropertyDefinition>> {
        self.definition(model)?;
        let removed = self.model(model)?.remove_property(property)?;

        if removed.is_some() && self.supports(AdapterHook::DefineProperty) {
            self.inner.adapter.remove_property(model, property);
        }
        Ok(removed)
    }

    /// Bulk form of [`Schema::define_property`].
    pub fn extend_model(&self, model: &str, properties: Properties) -> Result<()> {
        self.definition(model)?;
        for (name, definition) in properties.iter() {
            self.define_property(model, name, definition.clone())?;
        }
        Ok(())
    }

    pub fn model(&self, name: &str) -> Result<Arc<ModelClass>> {
        self.inner
            .models
            .read()?
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::ModelNotFound(name.to_string()))
    }

    pub fn definition(&self, name: &str) -> Result<ModelDefinition> {
        self.inner
            .definitions
            .read()?
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::ModelNotFound(name.to_string()))
    }

    pub fn model_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.inner.models.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn table_name(&self, model: &str) -> Result<String> {
        Ok(self.model(model)?.table_name().to_string())
    }

    /// Registers a named type; a later registration under the same name wins.
    /// Already bound properties keep their coercion until re-registered.
    pub fn register_type(&self, ty: CustomType) -> Result<()> {
        self.inner.types.write()?.register(ty);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SchemaEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn emit(&self, event: &SchemaEvent) {
        self.inner.listeners.emit(event);
    }

    /// Emits a `log` notification (for instance a statement and its timing).
    pub fn log(&self, message: impl Into<String>, duration: Option<Duration>) {
        self.emit(&SchemaEvent::Log {
            message: message.into(),
            duration,
        });
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.inner.name)
            .field("adapter", &self.inner.adapter.name())
            .field("state", &self.state())
            .finish()
    }
}
