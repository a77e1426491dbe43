use super::{Entity, ModelSettings, Properties, PropertyDefinition};
use crate::core::{Result, SchemaError, Value};
use crate::schema::{Schema, SchemaInner};
use crate::types::{ResolvedType, SharedTypeRegistry};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

/// Per-class getter override for one property.
pub type Getter = Arc<dyn Fn(&Entity) -> Value + Send + Sync>;

/// Per-class setter override; takes full control of the assignment.
pub type Setter = Arc<dyn Fn(&mut Entity, Value) -> Result<()> + Send + Sync>;

/// A schema-bound entity type produced by [`Schema::define`].
///
/// Identity (name, table, settings) is fixed at creation. The property map
/// is shared with the schema's stored definition and may grow or shrink
/// afterwards; every bound property has an accessor holding its resolved
/// coercion.
pub struct ModelClass {
    model_name: String,
    table_name: String,
    settings: ModelSettings,
    schema: Weak<SchemaInner>,
    types: SharedTypeRegistry,
    properties: Arc<RwLock<Properties>>,
    accessors: RwLock<HashMap<String, ResolvedType>>,
    getters: RwLock<HashMap<String, Getter>>,
    setters: RwLock<HashMap<String, Setter>>,
    // Filled by the relation facility, never by the core.
    relations: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl ModelClass {
    pub(crate) fn new(
        model_name: impl Into<String>,
        settings: ModelSettings,
        schema: Weak<SchemaInner>,
        types: SharedTypeRegistry,
        properties: Arc<RwLock<Properties>>,
    ) -> Self {
        let model_name = model_name.into();
        let table_name = settings
            .table()
            .map(str::to_string)
            .unwrap_or_else(|| model_name.clone());

        Self {
            model_name,
            table_name,
            settings,
            schema,
            types,
            properties,
            accessors: RwLock::new(HashMap::new()),
            getters: RwLock::new(HashMap::new()),
            setters: RwLock::new(HashMap::new()),
            relations: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Owning schema, if it is still alive.
    pub fn schema(&self) -> Option<Schema> {
        self.schema.upgrade().map(Schema::from_inner)
    }

    pub fn properties(&self) -> Result<Properties> {
        Ok(self.properties.read()?.clone())
    }

    pub fn property(&self, name: &str) -> Result<Option<PropertyDefinition>> {
        Ok(self.properties.read()?.get(name).cloned())
    }

    pub fn relations(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        Ok(self.relations.read()?.clone())
    }

    /// Instantiates the model from raw attribute values.
    pub fn create<I, K, V>(self: &Arc<Self>, data: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Entity::new(self, data)
    }

    /// Calls `f` once per declared property name, in declaration order.
    ///
    /// The names are collected up front, so `f` may change the property map.
    pub fn for_each_property<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let names = self.properties.read()?.names();
        for name in &names {
            f(name)?;
        }
        Ok(())
    }

    /// Binds `attr` to the coercion of its current declaration.
    ///
    /// Re-registering replaces the previous binding; named types are looked
    /// up in the registry at this point.
    pub fn register_property(&self, attr: &str) -> Result<()> {
        let type_ref = self
            .properties
            .read()?
            .get(attr)
            .map(|definition| definition.type_ref.clone())
            .ok_or_else(|| self.property_not_found(attr))?;

        let resolved = self.types.read()?.resolve(&type_ref);
        self.accessors.write()?.insert(attr.to_string(), resolved);
        Ok(())
    }

    /// Drops a property from the shared map together with its accessor.
    /// Reached through [`Schema::remove_property`], which also tells the
    /// adapter.
    pub(crate) fn remove_property(&self, attr: &str) -> Result<Option<PropertyDefinition>> {
        let removed = self.properties.write()?.remove(attr);
        self.accessors.write()?.remove(attr);
        Ok(removed)
    }

    pub fn has_accessor(&self, attr: &str) -> Result<bool> {
        Ok(self.accessors.read()?.contains_key(attr))
    }

    /// The coercion currently bound to `attr`.
    pub fn resolved_type(&self, attr: &str) -> Result<Option<ResolvedType>> {
        Ok(self.accessors.read()?.get(attr).cloned())
    }

    pub fn set_getter<F>(&self, attr: impl Into<String>, getter: F) -> Result<()>
    where
        F: Fn(&Entity) -> Value + Send + Sync + 'static,
    {
        self.getters.write()?.insert(attr.into(), Arc::new(getter));
        Ok(())
    }

    pub fn set_setter<F>(&self, attr: impl Into<String>, setter: F) -> Result<()>
    where
        F: Fn(&mut Entity, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.setters.write()?.insert(attr.into(), Arc::new(setter));
        Ok(())
    }

    pub fn remove_getter(&self, attr: &str) -> Result<()> {
        self.getters.write()?.remove(attr);
        Ok(())
    }

    pub fn remove_setter(&self, attr: &str) -> Result<()> {
        self.setters.write()?.remove(attr);
        Ok(())
    }

    /// Accessor read: the getter override if one is set, otherwise the
    /// stored value. Unbound names read as `None`.
    pub(crate) fn read(&self, entity: &Entity, attr: &str) -> Result<Option<Value>> {
        if !self.has_accessor(attr)? {
            return Ok(None);
        }

        let getter = self.getters.read()?.get(attr).cloned();
        match getter {
            Some(getter) => Ok(Some(getter(entity))),
            None => Ok(entity.raw(attr).cloned()),
        }
    }

    /// Accessor write. A setter override gets the raw value untouched;
    /// otherwise null and opaque-typed values are stored as given and
    /// everything else goes through the bound coercion.
    pub(crate) fn write(&self, entity: &mut Entity, attr: &str, value: Value) -> Result<()> {
        let resolved = self
            .accessors
            .read()?
            .get(attr)
            .cloned()
            .ok_or_else(|| self.property_not_found(attr))?;

        let setter = self.setters.read()?.get(attr).cloned();
        if let Some(setter) = setter {
            return setter(entity, value);
        }

        let stored = if value.is_null() || resolved.is_opaque() {
            value
        } else {
            resolved.coerce(value)?
        };
        entity.set_raw(attr, stored);
        Ok(())
    }

    fn property_not_found(&self, attr: &str) -> SchemaError {
        SchemaError::PropertyNotFound(attr.to_string(), self.model_name.clone())
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self
            .properties
            .read()
            .map(|properties| properties.names())
            .unwrap_or_default();
        f.debug_struct("ModelClass")
            .field("model_name", &self.model_name)
            .field("table_name", &self.table_name)
            .field("properties", &properties)
            .finish()
    }
}
