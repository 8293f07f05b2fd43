//! Shared application state for the API server.

use std::sync::Arc;

use growth::io::clock::Clock;
use growth::io::store::SqliteStore;
use growth::tree::Tree;
use tokio::sync::broadcast;

/// Tree changes broadcast to SSE clients after a successful write.
#[derive(Debug, Clone)]
pub enum ForestEvent {
    TreePlanted { tree: Tree },
    TreeUpdated { tree: Tree },
    TreeCompleted { completed_tree: Tree, new_tree: Tree },
}

impl ForestEvent {
    /// Owner the event belongs to; clients only see their own.
    pub fn owner_id(&self) -> &str {
        match self {
            ForestEvent::TreePlanted { tree } | ForestEvent::TreeUpdated { tree } => {
                &tree.owner_id
            }
            ForestEvent::TreeCompleted { new_tree, .. } => &new_tree.owner_id,
        }
    }
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Radius of the spiral retired trees are placed on.
    pub forest_radius: f64,
    /// Broadcast sender for tree change events.
    pub event_tx: Arc<broadcast::Sender<ForestEvent>>,
}

impl AppState {
    pub fn new(store: SqliteStore, clock: Arc<dyn Clock + Send + Sync>, forest_radius: f64) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            store: Arc::new(store),
            clock,
            forest_radius,
            event_tx: Arc::new(event_tx),
        }
    }

    /// Broadcast `event`; having no subscribers is fine.
    pub fn publish(&self, event: ForestEvent) {
        let _ = self.event_tx.send(event);
    }
}
