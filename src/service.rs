use crate::auth::{AuthFailure, CredentialGate, Credentials};
use crate::context::TimeProvider;
use crate::error::BridgeError;
use crate::metrics;
use crate::model::{HealthResponse, TradeCommand, TradePayload};
use crate::persistence::queue::{QueueError, TradeQueueStore};
use crate::security::SignatureVerifier;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The command bridge: operators submit, EAs poll.
///
/// Built once at startup and shared with every request handler. Authentication
/// always completes before the queue is touched, and nothing is held across
/// the two steps.
///
/// A pending command can only be delivered; there is no cancellation. All
/// EAs draw from the same queue, so whichever polls first receives the head.
pub struct BridgeService {
    gate: CredentialGate,
    verifier: SignatureVerifier,
    queue: Option<Arc<dyn TradeQueueStore>>,
    time: Arc<dyn TimeProvider>,
    started: Instant,
}

impl BridgeService {
    pub fn new(
        gate: CredentialGate,
        verifier: SignatureVerifier,
        queue: Option<Arc<dyn TradeQueueStore>>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            gate,
            verifier,
            queue,
            time,
            started: Instant::now(),
        }
    }

    fn queue(&self) -> Result<&Arc<dyn TradeQueueStore>, BridgeError> {
        self.queue.as_ref().ok_or_else(|| {
            metrics::QUEUE_FAILURES.inc();
            BridgeError::QueueDisabled
        })
    }

    fn authorize_operator(&self, credentials: Option<&Credentials>) -> Result<(), BridgeError> {
        self.gate.authenticate(credentials).map_err(|failure| {
            let kind = match failure {
                AuthFailure::Missing => "operator_missing",
                AuthFailure::Invalid => "operator_invalid",
            };
            metrics::AUTH_FAILURES.with_label_values(&[kind]).inc();
            warn!(reason = failure.reason(), "Operator authentication failed");
            BridgeError::Unauthorized(failure)
        })
    }

    /// Enqueues `payload` for the next polling EA and returns its trade id.
    pub fn submit(
        &self,
        credentials: Option<&Credentials>,
        payload: TradePayload,
    ) -> Result<u64, BridgeError> {
        self.authorize_operator(credentials)?;
        let queue = self.queue()?;

        let command = queue
            .enqueue(payload, self.time.now_millis())
            .map_err(queue_failure)?;

        metrics::TRADES_SUBMITTED.inc();
        info!(trade_id = command.id, "📥 Trade command queued");
        Ok(command.id)
    }

    /// Hands the oldest pending command to a correctly signed EA.
    /// `Ok(None)` means nothing is pending.
    pub fn fetch_next(
        &self,
        ea_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Option<TradeCommand>, BridgeError> {
        if !self.verifier.verify_ea(ea_id, signature) {
            metrics::AUTH_FAILURES.with_label_values(&["ea_signature"]).inc();
            warn!(ea_id = ea_id.unwrap_or("<none>"), "EA signature rejected");
            return Err(BridgeError::Forbidden);
        }
        let queue = self.queue()?;

        match queue.dequeue().map_err(queue_failure)? {
            Some(command) => {
                metrics::COMMANDS_DELIVERED.inc();
                info!(
                    trade_id = command.id,
                    ea_id = ea_id.unwrap_or_default(),
                    "📤 Trade command delivered"
                );
                Ok(Some(command))
            }
            None => {
                metrics::EMPTY_POLLS.inc();
                Ok(None)
            }
        }
    }

    /// Number of commands waiting. Operator only.
    pub fn pending(&self, credentials: Option<&Credentials>) -> Result<u64, BridgeError> {
        self.authorize_operator(credentials)?;
        let pending = self.queue()?.len().map_err(queue_failure)?;
        metrics::QUEUE_PENDING.set(pending as i64);
        Ok(pending)
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            ok: true,
            timestamp: self.time.now_millis(),
            uptime_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    pub fn queue_enabled(&self) -> bool {
        self.queue.is_some()
    }
}

fn queue_failure(e: QueueError) -> BridgeError {
    metrics::QUEUE_FAILURES.inc();
    e.into()
}
