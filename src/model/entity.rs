use super::ModelClass;
use crate::core::{Result, Value};
use crate::schema::Schema;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Behaviour shared by every generated model, written once against this
/// trait rather than copied onto each class.
pub trait ModelBase {
    fn model_class(&self) -> &Arc<ModelClass>;

    /// Accessor read (honours getter overrides).
    fn read(&self, attr: &str) -> Result<Option<Value>>;

    /// Accessor write (honours setter overrides and coercion).
    fn assign(&mut self, attr: &str, value: Value) -> Result<()>;

    fn model_name(&self) -> &str {
        self.model_class().model_name()
    }

    fn table_name(&self) -> &str {
        self.model_class().table_name()
    }

    /// True until an identifier has been assigned.
    fn is_new_record(&self) -> Result<bool> {
        Ok(self.read("id")?.is_none_or(|id| id.is_null()))
    }

    /// Assigns every pair through the accessors, stopping at the first failure.
    fn set_attributes<I, K, V>(&mut self, attributes: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (attr, value) in attributes {
            self.assign(attr.as_ref(), value.into())?;
        }
        Ok(())
    }

    /// JSON object of every declared property that currently has a value.
    fn to_object(&self) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::new();
        for name in self.model_class().properties()?.names() {
            if let Some(value) = self.read(&name)? {
                object.insert(name, value.to_json());
            }
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// One instance of a generated model.
///
/// Holds the coerced current values and the prior-value snapshot. The
/// snapshot is maintained by the persistence lifecycle through
/// [`Entity::set_was`] and [`Entity::snapshot_current`]; accessor writes
/// never touch it.
#[derive(Debug, Clone)]
pub struct Entity {
    model: Arc<ModelClass>,
    data: BTreeMap<String, Value>,
    data_was: BTreeMap<String, Value>,
}

impl Entity {
    /// Builds an instance, sending declared attributes through their
    /// accessors. Undeclared attributes are kept uncoerced.
    pub fn new<I, K, V>(model: &Arc<ModelClass>, data: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut entity = Self {
            model: Arc::clone(model),
            data: BTreeMap::new(),
            data_was: BTreeMap::new(),
        };

        for (attr, value) in data {
            let attr = attr.into();
            let value = value.into();
            if model.has_accessor(&attr)? {
                entity.set(&attr, value)?;
            } else {
                entity.set_raw(attr, value);
            }
        }
        Ok(entity)
    }

    pub fn model(&self) -> &Arc<ModelClass> {
        &self.model
    }

    /// Owning schema, reached through the model class.
    pub fn schema(&self) -> Option<Schema> {
        self.model.schema()
    }

    pub fn get(&self, attr: &str) -> Result<Option<Value>> {
        self.model.read(self, attr)
    }

    /// Assigns through the accessor; coercion errors are returned unchanged.
    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<()> {
        let model = Arc::clone(&self.model);
        model.write(self, attr, value.into())
    }

    pub fn id(&self) -> Result<Option<Value>> {
        self.get("id")
    }

    /// Prior value recorded by the lifecycle, never the current one.
    pub fn was(&self, attr: &str) -> Option<&Value> {
        self.data_was.get(attr)
    }

    /// Stored value without getter overrides.
    pub fn raw(&self, attr: &str) -> Option<&Value> {
        self.data.get(attr)
    }

    /// Stores a value that is already coerced, bypassing the accessor.
    pub fn set_raw(&mut self, attr: impl Into<String>, value: Value) {
        self.data.insert(attr.into(), value);
    }

    /// Forgets the current value entirely.
    pub fn unset(&mut self, attr: &str) -> Option<Value> {
        self.data.remove(attr)
    }

    pub fn set_was(&mut self, attr: impl Into<String>, value: Value) {
        self.data_was.insert(attr.into(), value);
    }

    /// Records the current values as the prior-value snapshot.
    pub fn snapshot_current(&mut self) {
        self.data_was = self.data.clone();
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.data
    }
}

impl ModelBase for Entity {
    fn model_class(&self) -> &Arc<ModelClass> {
        &self.model
    }

    fn read(&self, attr: &str) -> Result<Option<Value>> {
        self.get(attr)
    }

    fn assign(&mut self, attr: &str, value: Value) -> Result<()> {
        self.set(attr, value)
    }
}
