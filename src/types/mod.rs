pub mod coerce;
pub mod registry;

pub use registry::{SharedTypeRegistry, TypeRegistry};

use crate::core::{Result, SchemaError, Value};
use std::fmt;
use std::sync::Arc;

pub type CoerceFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// A user-declared type: a display name plus a coercion function.
///
/// A type without a coercion function is an opaque object marker;
/// values assigned to it are stored uncoerced.
#[derive(Clone)]
pub struct CustomType {
    name: String,
    coerce: Option<CoerceFn>,
}

impl CustomType {
    pub fn new<F>(name: impl Into<String>, coerce: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            coerce: Some(Arc::new(coerce)),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coerce: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_opaque(&self) -> bool {
        self.coerce.is_none()
    }

    pub fn coerce(&self, value: Value) -> Result<Value> {
        match &self.coerce {
            Some(coerce) => coerce(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("opaque", &self.is_opaque())
            .finish()
    }
}

/// The declared type of a property, as written by the caller.
#[derive(Debug, Clone)]
pub enum TypeRef {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Text,
    Json,
    /// Array shorthand: a list whose items have the inner type.
    List(Box<TypeRef>),
    /// Looked up in the type registry when the property is bound.
    Named(String),
    Custom(CustomType),
}

impl TypeRef {
    pub fn list(item: TypeRef) -> Self {
        Self::List(Box::new(item))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Maps a built-in display name to its variant; anything else is `Named`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "String" => Self::String,
            "Number" => Self::Number,
            "Integer" => Self::Integer,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Text" => Self::Text,
            "JSON" => Self::Json,
            other => Self::Named(other.to_string()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::String => "String".into(),
            Self::Number => "Number".into(),
            Self::Integer => "Integer".into(),
            Self::Boolean => "Boolean".into(),
            Self::Date => "Date".into(),
            Self::Text => "Text".into(),
            Self::Json => "JSON".into(),
            Self::List(item) => format!("[{}]", item.name()),
            Self::Named(name) => name.clone(),
            Self::Custom(custom) => custom.name().to_string(),
        }
    }
}

/// A declared type bound to a concrete coercion.
#[derive(Debug, Clone)]
pub enum ResolvedType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    /// Identity coercion (`Text`, `JSON`).
    Passthrough(&'static str),
    /// Object marker; assignments are stored uncoerced.
    Opaque(String),
    List(Box<ResolvedType>),
    Custom(CustomType),
    /// Named type that was not registered when the property was bound.
    Unresolved(String),
}

impl ResolvedType {
    pub fn name(&self) -> String {
        match self {
            Self::String => "String".into(),
            Self::Number => "Number".into(),
            Self::Integer => "Integer".into(),
            Self::Boolean => "Boolean".into(),
            Self::Date => "Date".into(),
            Self::Passthrough(name) => (*name).to_string(),
            Self::Opaque(name) => name.clone(),
            Self::List(item) => format!("[{}]", item.name()),
            Self::Custom(custom) => custom.name().to_string(),
            Self::Unresolved(name) => name.clone(),
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    pub fn coerce(&self, value: Value) -> Result<Value> {
        match self {
            Self::String => coerce::to_string(value),
            Self::Number => coerce::to_number(value),
            Self::Integer => coerce::to_integer(value),
            Self::Boolean => coerce::to_boolean(value),
            Self::Date => coerce::to_date(value),
            Self::Passthrough(_) | Self::Opaque(_) => Ok(value),
            Self::List(item) => coerce::to_list(value, item),
            Self::Custom(custom) => custom.coerce(value),
            Self::Unresolved(name) => Err(SchemaError::UnknownType(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_maps_builtins() {
        assert!(matches!(TypeRef::from_name("String"), TypeRef::String));
        assert!(matches!(TypeRef::from_name("JSON"), TypeRef::Json));
        assert!(matches!(TypeRef::from_name("Money"), TypeRef::Named(ref n) if n == "Money"));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(TypeRef::list(TypeRef::Number).name(), "[Number]");
        assert_eq!(TypeRef::Custom(CustomType::opaque("Point")).name(), "Point");
    }

    #[test]
    fn test_unresolved_fails_on_coercion() {
        let err = ResolvedType::Unresolved("Money".into())
            .coerce(Value::Integer(1))
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownType("Money".into()));
    }

    #[test]
    fn test_custom_type_coercion() {
        let upper = CustomType::new("Upper", |v: Value| match v {
            Value::Text(s) => Ok(Value::Text(s.to_uppercase())),
            other => Err(SchemaError::Coercion(format!("not text: {}", other))),
        });
        assert_eq!(upper.coerce("abc".into()).unwrap(), Value::Text("ABC".into()));
        assert!(upper.coerce(Value::Integer(1)).is_err());
        assert!(!upper.is_opaque());
    }
}
