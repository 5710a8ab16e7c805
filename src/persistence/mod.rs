pub mod queue;
pub mod redb_store;

use crate::config::QueueConfig;
use queue::{MemoryTradeQueue, RedbTradeQueue, TradeQueueStore};
use redb_store::{RedbStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// `queue.path` value selecting the in-process queue.
pub const MEMORY_QUEUE_PATH: &str = ":memory:";

/// Builds the queue named by the config. `Ok(None)` means no backing store is
/// configured and queue operations are disabled.
pub fn open_queue(config: &QueueConfig) -> Result<Option<Arc<dyn TradeQueueStore>>, StoreError> {
    let path = match config.path.as_deref().map(str::trim) {
        None | Some("") => {
            warn!("⚠️ queue.path not set. Submit and FetchNext are disabled.");
            return Ok(None);
        }
        Some(path) => path,
    };

    if path == MEMORY_QUEUE_PATH {
        info!(key = %config.key, "🧠 Using in-memory trade queue (not durable)");
        return Ok(Some(Arc::new(MemoryTradeQueue::new())));
    }

    let store = RedbStore::open(path)?;
    let queue = RedbTradeQueue::new(store, config.key.clone())?;
    info!(key = %config.key, path, "✅ Durable trade queue ready");
    Ok(Some(Arc::new(queue)))
}
