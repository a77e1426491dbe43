use super::Schema;
use crate::core::Result;
use crate::model::{ModelClass, ModelSettings, Properties, PropertyDeclaration};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Incremental form of [`Schema::define`]; properties and settings are
/// both optional.
///
/// ```
/// # use modelschema::{MemoryAdapter, Schema, SchemaSettings, TypeRef};
/// # use std::sync::Arc;
/// let schema = Schema::new("memory", Arc::new(MemoryAdapter::new()), SchemaSettings::new());
/// let post = schema
///     .model_builder("Post")
///     .property("title", TypeRef::String)
///     .table("posts")
///     .define()
///     .unwrap();
/// assert_eq!(post.table_name(), "posts");
/// ```
pub struct ModelBuilder<'a> {
    schema: &'a Schema,
    name: String,
    properties: Properties,
    settings: ModelSettings,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(schema: &'a Schema, name: String) -> Self {
        Self {
            schema,
            name,
            properties: Properties::new(),
            settings: ModelSettings::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, declaration: impl Into<PropertyDeclaration>) -> Self {
        self.properties.declare(name, declaration);
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        for (name, definition) in properties.iter() {
            self.properties.insert(name, definition.clone());
        }
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.settings = self.settings.with_table(table);
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.settings = self.settings.with(key, value);
        self
    }

    pub fn define(self) -> Result<Arc<ModelClass>> {
        self.schema.define(self.name, self.properties, self.settings)
    }
}

impl Schema {
    pub fn model_builder(&self, name: impl Into<String>) -> ModelBuilder<'_> {
        ModelBuilder::new(self, name.into())
    }
}
