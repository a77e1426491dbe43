use crate::core::{Result, SchemaError};
use crate::types::TypeRef;
use serde_json::{Map, Value as JsonValue};

/// Canonical `{type, ...options}` form of a property declaration.
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub type_ref: TypeRef,
    pub options: Map<String, JsonValue>,
}

impl PropertyDefinition {
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn option(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }
}

/// A raw declaration as written by the caller, before standardization.
#[derive(Debug, Clone)]
pub enum PropertyDeclaration {
    /// Bare type reference.
    Type(TypeRef),
    /// Array shorthand meaning "list of T".
    ListOf(TypeRef),
    /// Already in `{type, ...}` form.
    Definition(PropertyDefinition),
}

impl PropertyDeclaration {
    pub fn standardize(self) -> PropertyDefinition {
        match self {
            Self::Type(type_ref) => PropertyDefinition::new(type_ref),
            Self::ListOf(item) => PropertyDefinition::new(TypeRef::list(item)),
            Self::Definition(definition) => definition,
        }
    }
}

impl From<TypeRef> for PropertyDeclaration {
    fn from(type_ref: TypeRef) -> Self {
        Self::Type(type_ref)
    }
}

impl From<PropertyDefinition> for PropertyDeclaration {
    fn from(definition: PropertyDefinition) -> Self {
        Self::Definition(definition)
    }
}

/// Standardized property map, kept in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, PropertyDefinition)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Properties::declare`].
    pub fn with(mut self, name: impl Into<String>, declaration: impl Into<PropertyDeclaration>) -> Self {
        self.declare(name, declaration);
        self
    }

    /// Standardizes `declaration` and stores it under `name`.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        declaration: impl Into<PropertyDeclaration>,
    ) -> Option<PropertyDefinition> {
        self.insert(name, declaration.into().standardize())
    }

    /// Replaces an existing entry in place; new names are appended.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        definition: PropertyDefinition,
    ) -> Option<PropertyDefinition> {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, definition)),
            None => {
                self.entries.push((name, definition));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyDefinition> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, definition)| definition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDefinition)> {
        self.entries
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses declarations from JSON.
    ///
    /// ```text
    /// {
    ///   "name": "String",
    ///   "tags": ["String"],
    ///   "age":  {"type": "Number", "index": true}
    /// }
    /// ```
    ///
    /// Type names are not checked here; unknown names fail on first coercion.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            SchemaError::InvalidDeclaration("Property declarations must be a JSON object".into())
        })?;

        let mut properties = Self::new();
        for (name, raw) in object {
            properties.declare(name.clone(), declaration_from_json(name, raw)?);
        }
        Ok(properties)
    }
}

impl<N: Into<String>, D: Into<PropertyDeclaration>> FromIterator<(N, D)> for Properties {
    fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (name, declaration) in iter {
            properties.declare(name, declaration);
        }
        properties
    }
}

fn declaration_from_json(property: &str, raw: &JsonValue) -> Result<PropertyDeclaration> {
    match raw {
        JsonValue::Object(object) => {
            let type_json = object.get("type").ok_or_else(|| {
                SchemaError::InvalidDeclaration(format!(
                    "Property '{}' has no 'type' entry",
                    property
                ))
            })?;
            let mut definition = PropertyDefinition::new(type_from_json(property, type_json)?);
            for (key, value) in object {
                if key != "type" {
                    definition.options.insert(key.clone(), value.clone());
                }
            }
            Ok(PropertyDeclaration::Definition(definition))
        }
        JsonValue::Array(_) => match type_from_json(property, raw)? {
            TypeRef::List(item) => Ok(PropertyDeclaration::ListOf(*item)),
            other => Ok(PropertyDeclaration::Type(other)),
        },
        other => Ok(PropertyDeclaration::Type(type_from_json(property, other)?)),
    }
}

fn type_from_json(property: &str, raw: &JsonValue) -> Result<TypeRef> {
    match raw {
        JsonValue::String(name) => Ok(TypeRef::from_name(name)),
        JsonValue::Array(items) => match items.first() {
            Some(item) => Ok(TypeRef::list(type_from_json(property, item)?)),
            None => Ok(TypeRef::list(TypeRef::Json)),
        },
        other => Err(SchemaError::InvalidDeclaration(format!(
            "Property '{}' has an unsupported type declaration: {}",
            property, other
        ))),
    }
}
