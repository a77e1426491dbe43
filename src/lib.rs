// ============================================================================
// modelschema Library
// ============================================================================
//
// Schema/model-definition engine: a `Schema` bound to one storage adapter
// turns property declarations into model classes whose instances coerce
// assigned values to the declared types.

pub mod adapter;
pub mod core;
pub mod model;
pub mod schema;
pub mod types;

// Re-export main types for convenience
pub use adapter::{Adapter, AdapterHook, AdapterRegistry, MemoryAdapter, ModelShape};
pub use core::{Result, SchemaError, Value};
pub use model::{
    Entity, ModelBase, ModelClass, ModelSettings, Properties, PropertyDeclaration,
    PropertyDefinition,
};
pub use schema::{
    ConnectionState, ListenerId, ModelBuilder, ModelDefinition, Schema, SchemaEvent,
    SchemaSettings,
};
pub use types::{CustomType, ResolvedType, TypeRef, TypeRegistry};

/// Registers a type in the process-wide registry shared by every schema
/// created with [`Schema::new`]. A later registration under the same name
/// wins.
///
/// # Examples
///
/// ```
/// use modelschema::{CustomType, TypeRegistry, Value, register_type};
///
/// register_type(CustomType::new("Slug", |v: Value| {
///     Ok(Value::Text(v.to_string().to_lowercase().replace(' ', "-")))
/// }))
/// .unwrap();
///
/// assert!(TypeRegistry::global().read().unwrap().contains("Slug"));
/// ```
pub fn register_type(ty: CustomType) -> Result<()> {
    TypeRegistry::global().write()?.register(ty);
    Ok(())
}
