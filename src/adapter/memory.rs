use super::{Adapter, AdapterHook, ModelShape};
use crate::core::Result;
use crate::model::PropertyDefinition;
use crate::schema::Schema;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{Level, event};

/// Shape recorded for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableShape {
    pub table: String,
    /// (property, declared type name)
    pub columns: Vec<(String, String)>,
}

/// In-process adapter that keeps the declared shapes instead of a store.
///
/// Supports every optional hook. `is_actual` reports `false` while there
/// are definitions that no `automigrate`/`autoupdate` has applied yet.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    tables: RwLock<BTreeMap<String, TableShape>>,
    connected: AtomicBool,
    dirty: AtomicBool,
    frozen: AtomicBool,
    migrations: AtomicU64,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, model: &str) -> Option<TableShape> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(model).cloned())
    }

    pub fn models(&self) -> Vec<String> {
        self.tables
            .read()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// Number of automigrate/autoupdate runs
    pub fn migration_count(&self) -> u64 {
        self.migrations.load(Ordering::SeqCst)
    }

    fn apply_migration(&self) {
        self.migrations.fetch_add(1, Ordering::SeqCst);
        self.dirty.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn hooks(&self) -> &[AdapterHook] {
        AdapterHook::ALL
    }

    async fn initialize(&self, schema: &Schema) -> Result<()> {
        event!(Level::DEBUG, schema = %schema.name(), "memory adapter initialized");
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn define(&self, shape: ModelShape<'_>) {
        let columns = shape
            .properties
            .iter()
            .map(|(name, definition)| (name.to_string(), definition.type_ref.name()))
            .collect();

        // A poisoned table map is still consistent: every write is a single insert.
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(
            shape.model.model_name().to_string(),
            TableShape {
                table: shape.model.table_name().to_string(),
                columns,
            },
        );
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn define_property(&self, model: &str, property: &str, definition: &PropertyDefinition) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if let Some(shape) = tables.get_mut(model) {
            let type_name = definition.type_ref.name();
            match shape.columns.iter_mut().find(|(name, _)| name == property) {
                Some(column) => column.1 = type_name,
                None => shape.columns.push((property.to_string(), type_name)),
            }
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    fn remove_property(&self, model: &str, property: &str) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if let Some(shape) = tables.get_mut(model) {
            let before = shape.columns.len();
            shape.columns.retain(|(name, _)| name != property);
            if shape.columns.len() != before {
                self.dirty.store(true, Ordering::SeqCst);
            }
        }
    }

    fn freeze_schema(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn automigrate(&self) -> Result<()> {
        self.apply_migration();
        Ok(())
    }

    async fn autoupdate(&self) -> Result<()> {
        self.apply_migration();
        Ok(())
    }

    async fn is_actual(&self) -> Result<bool> {
        Ok(!self.dirty.load(Ordering::SeqCst))
    }
}
