//! # Payment Attempt Tracker
//!
//! Runs push attempts off the request path and publishes each attempt's
//! [`PaymentState`] on a watch channel. Callers observe an attempt through a
//! [`PaymentSubscription`]; dropping the handle is the unsubscribe.

use pay_core::{BoxedPushGateway, PaymentError, PaymentResult, PaymentState, PushOrder};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: usize = 1024;

/// In-memory registry of recent payment attempts
#[derive(Clone)]
pub struct PaymentTracker {
    inner: Arc<RwLock<Attempts>>,
    capacity: usize,
}

#[derive(Default)]
struct Attempts {
    states: HashMap<Uuid, Arc<watch::Sender<PaymentState>>>,
    /// Insertion order, oldest first
    order: VecDeque<Uuid>,
}

impl PaymentTracker {
    /// Keep at most `capacity` attempts; the oldest are forgotten first
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Attempts::default())),
            capacity: capacity.max(1),
        }
    }

    /// Register a new attempt in `Loading` and drive it on a background task.
    ///
    /// The attempt settles to `Success` or `Error` exactly once.
    pub fn start(&self, gateway: BoxedPushGateway, order: PushOrder) -> (Uuid, PaymentSubscription) {
        let attempt_id = Uuid::new_v4();
        let (tx, rx) = watch::channel(PaymentState::Loading);
        let tx = Arc::new(tx);

        self.insert(attempt_id, Arc::clone(&tx));

        let span = info_span!(
            "payment_attempt",
            %attempt_id,
            provider = gateway.provider_name()
        );
        tokio::spawn(
            async move {
                let result = gateway.initiate_push(&order).await;
                match &result {
                    Ok(receipt) => info!(
                        "Attempt settled: checkout_request_id={}",
                        receipt.checkout_request_id
                    ),
                    Err(e) => warn!("Attempt failed: {}", e),
                }
                tx.send_replace(PaymentState::from(result));
            }
            .instrument(span),
        );

        (attempt_id, PaymentSubscription { attempt_id, rx })
    }

    /// Observe an existing attempt
    pub fn subscribe(&self, attempt_id: &Uuid) -> PaymentResult<PaymentSubscription> {
        let attempts = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let tx = attempts
            .states
            .get(attempt_id)
            .ok_or_else(|| PaymentError::AttemptNotFound {
                attempt_id: attempt_id.to_string(),
            })?;

        Ok(PaymentSubscription {
            attempt_id: *attempt_id,
            rx: tx.subscribe(),
        })
    }

    /// Snapshot of an attempt's current state
    pub fn state(&self, attempt_id: &Uuid) -> PaymentResult<PaymentState> {
        Ok(self.subscribe(attempt_id)?.current())
    }

    /// Number of attempts currently retained
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .states
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, attempt_id: Uuid, tx: Arc<watch::Sender<PaymentState>>) {
        let mut attempts = self.inner.write().unwrap_or_else(|e| e.into_inner());
        attempts.states.insert(attempt_id, tx);
        attempts.order.push_back(attempt_id);

        while attempts.order.len() > self.capacity {
            if let Some(oldest) = attempts.order.pop_front() {
                attempts.states.remove(&oldest);
            }
        }
    }
}

impl Default for PaymentTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Live view of one attempt's state
pub struct PaymentSubscription {
    attempt_id: Uuid,
    rx: watch::Receiver<PaymentState>,
}

impl PaymentSubscription {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn current(&self) -> PaymentState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change; `None` once the attempt can no longer change.
    ///
    /// A settled state that has not been seen yet is still returned once.
    pub async fn changed(&mut self) -> Option<PaymentState> {
        // The tracker holds the sender, so channel closure never ends the stream
        let settled = self.rx.borrow().is_settled();
        if settled && !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the attempt reaches `Success` or `Error`
    pub async fn settled(&mut self) -> PaymentState {
        if let Ok(state) = self.rx.wait_for(PaymentState::is_settled).await {
            return state.clone();
        }
        // Sender gone before settling; report whatever was last published
        self.current()
    }
}
