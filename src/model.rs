use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied trade fields (symbol, side, size, ...). Never inspected by the bridge.
pub type TradePayload = Map<String, Value>;

/// A queued instruction for an EA. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeCommand {
    /// Strictly increasing in enqueue order, never reused within a queue.
    pub id: u64,
    pub payload: TradePayload,
    /// Milliseconds since epoch. Informational only; ordering is by `id`.
    pub enqueued_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub timestamp: i64,
    pub uptime_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ok: bool,
    pub trade_id: u64,
}

/// `command` is `null` when nothing is pending.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    pub command: Option<TradeCommand>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub pending: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
