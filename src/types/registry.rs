use super::{CustomType, ResolvedType, TypeRef};
use crate::core::Value;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type SharedTypeRegistry = Arc<RwLock<TypeRegistry>>;

// Process-wide registry, seeded with the built-ins before any user registration.
lazy_static! {
    static ref GLOBAL_TYPES: SharedTypeRegistry = Arc::new(RwLock::new(TypeRegistry::new()));
}

/// Table of named types available to property declarations.
///
/// Append-only: registering a name that already exists replaces the
/// previous entry without complaint, and nothing is ever removed.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, CustomType>,
}

impl TypeRegistry {
    /// Registry seeded with `Text` (identity) and `JSON` (opaque).
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(CustomType::new("Text", |value: Value| Ok(value)));
        registry.register(CustomType::opaque("JSON"));
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// The shared table used by schemas that are not given their own.
    pub fn global() -> &'static SharedTypeRegistry {
        &GLOBAL_TYPES
    }

    pub fn shared(self) -> SharedTypeRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn register(&mut self, ty: CustomType) {
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&CustomType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Binds a declared type to its coercion.
    ///
    /// `Date`, `JSON` and `Text` are recognised by display name for named
    /// and custom types too, so a user type called `Date` is treated as the
    /// built-in date type.
    pub fn resolve(&self, type_ref: &TypeRef) -> ResolvedType {
        match type_ref {
            TypeRef::String => ResolvedType::String,
            TypeRef::Number => ResolvedType::Number,
            TypeRef::Integer => ResolvedType::Integer,
            TypeRef::Boolean => ResolvedType::Boolean,
            TypeRef::Date => ResolvedType::Date,
            TypeRef::Text => ResolvedType::Passthrough("Text"),
            TypeRef::Json => ResolvedType::Passthrough("JSON"),
            TypeRef::List(item) => ResolvedType::List(Box::new(self.resolve(item))),
            TypeRef::Custom(custom) => {
                by_convention(custom.name()).unwrap_or_else(|| from_custom(custom))
            }
            TypeRef::Named(name) => by_convention(name).unwrap_or_else(|| match self.get(name) {
                Some(custom) => from_custom(custom),
                None => ResolvedType::Unresolved(name.clone()),
            }),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn by_convention(name: &str) -> Option<ResolvedType> {
    match name {
        "Date" => Some(ResolvedType::Date),
        "JSON" => Some(ResolvedType::Passthrough("JSON")),
        "Text" => Some(ResolvedType::Passthrough("Text")),
        _ => None,
    }
}

fn from_custom(custom: &CustomType) -> ResolvedType {
    if custom.is_opaque() {
        ResolvedType::Opaque(custom.name().to_string())
    } else {
        ResolvedType::Custom(custom.clone())
    }
}
