use crate::model::{TradeCommand, TradePayload};
use crate::persistence::redb_store::{RedbStore, StoreError};
use parking_lot::Mutex;
use redb::{ReadableTable, TableDefinition};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, error};

// Next-id counters, one row per queue key. Updated in the same transaction as the push.
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("queue_sequences");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for QueueError {
    fn from(e: StoreError) -> Self {
        error!("❌ Queue store failure: {}", e);
        QueueError::Unavailable(e.to_string())
    }
}

/// FIFO of pending trade commands.
///
/// `enqueue` assigns the id and stores the command atomically: either both
/// happen or neither does. `dequeue` removes the head; concurrent callers
/// never receive the same command.
pub trait TradeQueueStore: Send + Sync {
    fn enqueue(&self, payload: TradePayload, enqueued_at: i64) -> Result<TradeCommand, QueueError>;

    /// `Ok(None)` when nothing is pending.
    fn dequeue(&self) -> Result<Option<TradeCommand>, QueueError>;

    fn len(&self) -> Result<u64, QueueError>;

    fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    fn name(&self) -> &str;
}

/// Durable queue in a redb table keyed by command id.
pub struct RedbTradeQueue {
    store: RedbStore,
    key: String,
    table_name: String,
}

impl RedbTradeQueue {
    pub fn new(store: RedbStore, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let queue = Self {
            store,
            table_name: format!("queue:{}", key),
            key,
        };
        queue.initialize()?;
        Ok(queue)
    }

    fn items(&self) -> TableDefinition<'_, u64, Vec<u8>> {
        TableDefinition::new(&self.table_name)
    }

    // Read transactions fail on tables that were never created.
    fn initialize(&self) -> Result<(), StoreError> {
        self.store.write(|txn| {
            let _ = txn.open_table(SEQUENCE_TABLE)?;
            let _ = txn.open_table(self.items())?;
            Ok(())
        })
    }
}

impl TradeQueueStore for RedbTradeQueue {
    fn enqueue(&self, payload: TradePayload, enqueued_at: i64) -> Result<TradeCommand, QueueError> {
        let command = self.store.write(|txn| {
            let id = {
                let mut sequences = txn.open_table(SEQUENCE_TABLE)?;
                let last = sequences
                    .get(self.key.as_str())?
                    .map(|v| v.value())
                    .unwrap_or(0);
                let id = last + 1;
                sequences.insert(self.key.as_str(), id)?;
                id
            };

            let command = TradeCommand {
                id,
                payload,
                enqueued_at,
            };
            let data = serde_json::to_vec(&command)?;
            let mut items = txn.open_table(self.items())?;
            items.insert(id, data)?;
            Ok(command)
        })?;

        debug!(trade_id = command.id, queue = %self.key, "📝 Enqueued");
        Ok(command)
    }

    fn dequeue(&self) -> Result<Option<TradeCommand>, QueueError> {
        let command = self.store.write(|txn| {
            let mut items = txn.open_table(self.items())?;
            loop {
                let Some((id, data)) = items.pop_first()?.map(|(k, v)| (k.value(), v.value()))
                else {
                    return Ok(None);
                };
                // Undecodable entries are dropped, never left at the head.
                match serde_json::from_slice::<TradeCommand>(&data) {
                    Ok(command) => return Ok(Some(command)),
                    Err(e) => error!(
                        trade_id = id,
                        queue = %self.key,
                        "❌ Dropping undecodable queue entry: {}", e
                    ),
                }
            }
        })?;

        if let Some(c) = &command {
            debug!(trade_id = c.id, queue = %self.key, "📤 Dequeued");
        }
        Ok(command)
    }

    fn len(&self) -> Result<u64, QueueError> {
        let count = self.store.read(|txn| {
            let items = txn.open_table(self.items())?;
            Ok(items.len()?)
        })?;
        Ok(count)
    }

    fn name(&self) -> &str {
        "redb"
    }
}

struct MemoryState {
    last_id: u64,
    items: VecDeque<TradeCommand>,
}

/// In-process queue. The lock is held only for the push or pop itself.
pub struct MemoryTradeQueue {
    state: Mutex<MemoryState>,
}

impl MemoryTradeQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                last_id: 0,
                items: VecDeque::new(),
            }),
        }
    }
}

impl Default for MemoryTradeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeQueueStore for MemoryTradeQueue {
    fn enqueue(&self, payload: TradePayload, enqueued_at: i64) -> Result<TradeCommand, QueueError> {
        let mut state = self.state.lock();
        state.last_id += 1;
        let command = TradeCommand {
            id: state.last_id,
            payload,
            enqueued_at,
        };
        state.items.push_back(command.clone());
        Ok(command)
    }

    fn dequeue(&self) -> Result<Option<TradeCommand>, QueueError> {
        Ok(self.state.lock().items.pop_front())
    }

    fn len(&self) -> Result<u64, QueueError> {
        Ok(self.state.lock().items.len() as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
