//! Transport doubles for testing the fetch pipeline.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docvault_traits::{Transport, TransportError};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One scripted transport response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(Bytes),
    Transient(String),
    Permanent(String),
    /// Never completes; only cancellation ends the call
    Hang,
}

impl Outcome {
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Outcome::Ok(payload.into())
    }

    pub fn transient() -> Self {
        Outcome::Transient("connection reset".to_string())
    }

    pub fn permanent() -> Self {
        Outcome::Permanent("undecodable payload".to_string())
    }
}

/// Replays scripted outcomes in order, then repeats `fallback` forever.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    latency: Duration,
    calls: AtomicUsize,
    call_log: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            call_log: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok(payload: impl Into<Bytes>) -> Self {
        Self::new([], Outcome::ok(payload))
    }

    pub fn always_failing() -> Self {
        Self::new([], Outcome::transient())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, outcome: Outcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instants at which calls started, in call order
    pub fn call_instants(&self) -> Vec<Instant> {
        self.call_log.lock().iter().map(|(_, at)| *at).collect()
    }

    /// Gaps between consecutive calls
    pub fn call_gaps(&self) -> Vec<Duration> {
        self.call_instants()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.call_log.lock().iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_bytes(&self, document_id: &str) -> Result<Bytes, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_log
            .lock()
            .push((document_id.to_string(), Instant::now()));

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match outcome {
            Outcome::Ok(bytes) => Ok(bytes),
            Outcome::Transient(msg) => Err(TransportError::Transient(msg)),
            Outcome::Permanent(msg) => Err(TransportError::Permanent(msg)),
            Outcome::Hang => std::future::pending().await,
        }
    }
}
