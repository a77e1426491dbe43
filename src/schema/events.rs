use crate::model::{ModelClass, ModelSettings, Properties};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Notifications emitted by a [`Schema`](super::Schema).
#[derive(Debug, Clone)]
pub enum SchemaEvent {
    Connected,
    Log {
        message: String,
        duration: Option<Duration>,
    },
    Define {
        model: Arc<ModelClass>,
        name: String,
        properties: Properties,
        settings: ModelSettings,
    },
}

pub type Listener = Arc<dyn Fn(&SchemaEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners in registration order. Delivery is synchronous.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Listener)>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // A poisoned list still holds valid listeners.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Snapshot first, so listeners may add or remove listeners.
    pub(crate) fn emit(&self, event: &SchemaEvent) {
        let snapshot: Vec<Listener> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.iter().map(|(_, listener)| Arc::clone(listener)).collect()
        };
        for listener in snapshot {
            listener(event);
        }
    }
}
