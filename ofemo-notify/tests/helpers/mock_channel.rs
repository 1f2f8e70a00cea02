//! In-process delivery channel with scripted outcome

use async_trait::async_trait;
use ofemo_notify::channel::{DeliveryChannel, DeliveryFailure, DeliveryResult};
use ofemo_notify::payload::SubmissionPayload;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Channel names in the order they were called, shared between mocks
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct MockChannel {
    name: &'static str,
    outcome: DeliveryResult,
    calls: AtomicUsize,
    log: CallLog,
    received: Mutex<Vec<SubmissionPayload>>,
}

impl MockChannel {
    fn with_outcome(name: &'static str, log: &CallLog, outcome: DeliveryResult) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            calls: AtomicUsize::new(0),
            log: log.clone(),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(name: &'static str, log: &CallLog) -> Arc<Self> {
        Self::with_outcome(name, log, DeliveryResult::succeeded())
    }

    pub fn failing(name: &'static str, log: &CallLog, cause: DeliveryFailure) -> Arc<Self> {
        Self::with_outcome(name, log, DeliveryResult::failed(cause))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<SubmissionPayload> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, payload: &SubmissionPayload) -> DeliveryResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.name);
        self.received.lock().unwrap().push(payload.clone());
        self.outcome.clone()
    }
}
