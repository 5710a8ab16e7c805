//! Trade queue tests
//!
//! FIFO order, id uniqueness under concurrent enqueues, and at-most-once
//! delivery under concurrent dequeues, for both the durable and in-memory stores.

use ea_bridge::config::QueueConfig;
use ea_bridge::model::TradePayload;
use ea_bridge::persistence::open_queue;
use ea_bridge::persistence::queue::{MemoryTradeQueue, RedbTradeQueue, TradeQueueStore};
use ea_bridge::persistence::redb_store::RedbStore;
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("ea_bridge_test_{}.redb", uuid::Uuid::new_v4()))
}

fn payload(n: usize) -> TradePayload {
    json!({"symbol": "EURUSD", "side": "buy", "size": 1, "seq": n})
        .as_object()
        .cloned()
        .unwrap()
}

fn redb_queue(path: &PathBuf) -> RedbTradeQueue {
    let store = RedbStore::open(path).expect("Failed to create RedbStore");
    RedbTradeQueue::new(store, "test_queue").expect("Failed to create queue")
}

fn assert_fifo(queue: &dyn TradeQueueStore) {
    let mut ids = Vec::new();
    for n in 0..10 {
        ids.push(queue.enqueue(payload(n), 0).unwrap().id);
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must increase");

    for n in 0..10 {
        let command = queue.dequeue().unwrap().expect("command pending");
        assert_eq!(command.payload, payload(n));
        assert_eq!(command.id, ids[n]);
    }
    assert_eq!(queue.dequeue().unwrap(), None);
}

fn assert_unique_ids_under_concurrency(queue: Arc<dyn TradeQueueStore>) {
    let threads = 8;
    let per_thread = 25;

    let ids: Vec<u64> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let queue = queue.clone();
                s.spawn(move || {
                    (0..per_thread)
                        .map(|n| queue.enqueue(payload(t * 100 + n), 0).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), threads * per_thread);
    assert_eq!(queue.len().unwrap(), (threads * per_thread) as u64);
}

fn assert_at_most_once(queue: Arc<dyn TradeQueueStore>) {
    let pending = 20;
    let pollers = 50;
    for n in 0..pending {
        queue.enqueue(payload(n), 0).unwrap();
    }

    let results: Vec<Option<u64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..pollers)
            .map(|_| {
                let queue = queue.clone();
                s.spawn(move || queue.dequeue().unwrap().map(|c| c.id))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let delivered: Vec<u64> = results.iter().flatten().copied().collect();
    let unique: HashSet<u64> = delivered.iter().copied().collect();
    assert_eq!(delivered.len(), pending);
    assert_eq!(unique.len(), pending, "no command may be delivered twice");
    assert_eq!(results.iter().filter(|r| r.is_none()).count(), pollers - pending);
    assert!(queue.is_empty().unwrap());
}

#[test]
fn test_memory_fifo() {
    assert_fifo(&MemoryTradeQueue::new());
}

#[test]
fn test_redb_fifo() {
    let path = temp_db_path();
    assert_fifo(&redb_queue(&path));
    let _ = fs::remove_file(&path);
}

#[test]
fn test_memory_unique_ids() {
    assert_unique_ids_under_concurrency(Arc::new(MemoryTradeQueue::new()));
}

#[test]
fn test_redb_unique_ids() {
    let path = temp_db_path();
    assert_unique_ids_under_concurrency(Arc::new(redb_queue(&path)));
    let _ = fs::remove_file(&path);
}

#[test]
fn test_memory_at_most_once() {
    assert_at_most_once(Arc::new(MemoryTradeQueue::new()));
}

#[test]
fn test_redb_at_most_once() {
    let path = temp_db_path();
    assert_at_most_once(Arc::new(redb_queue(&path)));
    let _ = fs::remove_file(&path);
}

#[test]
fn test_redb_survives_reopen() {
    let path = temp_db_path();
    {
        let queue = redb_queue(&path);
        queue.enqueue(payload(1), 10).unwrap();
        queue.enqueue(payload(2), 20).unwrap();
    }

    let queue = redb_queue(&path);
    assert_eq!(queue.len().unwrap(), 2);
    let first = queue.dequeue().unwrap().unwrap();
    assert_eq!(first.payload, payload(1));
    assert_eq!(first.enqueued_at, 10);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_redb_ids_not_reused_after_drain_and_reopen() {
    let path = temp_db_path();
    let last_id = {
        let queue = redb_queue(&path);
        let a = queue.enqueue(payload(1), 0).unwrap();
        let b = queue.enqueue(payload(2), 0).unwrap();
        queue.dequeue().unwrap();
        queue.dequeue().unwrap();
        assert!(queue.is_empty().unwrap());
        a.id.max(b.id)
    };

    let queue = redb_queue(&path);
    let next = queue.enqueue(payload(3), 0).unwrap();
    assert!(next.id > last_id);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_redb_queues_isolated_by_key() {
    let path = temp_db_path();
    let store = RedbStore::open(&path).unwrap();
    let live = RedbTradeQueue::new(store.clone(), "live").unwrap();
    let demo = RedbTradeQueue::new(store, "demo").unwrap();

    live.enqueue(payload(1), 0).unwrap();
    assert_eq!(demo.dequeue().unwrap(), None);
    assert_eq!(live.len().unwrap(), 1);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_open_queue_modes() {
    let disabled = open_queue(&QueueConfig::default()).unwrap();
    assert!(disabled.is_none());

    let blank = open_queue(&QueueConfig {
        path: Some("  ".into()),
        ..QueueConfig::default()
    })
    .unwrap();
    assert!(blank.is_none());

    let memory = open_queue(&QueueConfig {
        path: Some(":memory:".into()),
        ..QueueConfig::default()
    })
    .unwrap()
    .unwrap();
    assert_eq!(memory.name(), "memory");

    let path = temp_db_path();
    let durable = open_queue(&QueueConfig {
        path: Some(path.to_string_lossy().into_owned()),
        ..QueueConfig::default()
    })
    .unwrap()
    .unwrap();
    assert_eq!(durable.name(), "redb");
    drop(durable);
    let _ = fs::remove_file(&path);
}
