//! Test doubles for the lookup client and clipboard.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::lookup::{DetailsLookup, DetailsPayload, LookupError, LookupOutcome};
use crate::platform::{ClipboardReader, PlatformError};

/// A recorded lookup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Key(String, Option<String>),
    Fallback,
}

/// Build a payload from a `json!` object literal.
pub fn payload(value: serde_json::Value) -> DetailsPayload {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Scripted lookup client. Unknown keys answer `NotFound`; an unset
/// fallback answers `Protocol(500)`.
///
/// When gated, every call is recorded immediately but only answers
/// once a permit is released.
pub struct StubLookup {
    keys: HashMap<String, LookupOutcome>,
    fallback: LookupOutcome,
    calls: Mutex<Vec<Call>>,
    gate: Option<Semaphore>,
}

impl StubLookup {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            fallback: LookupError::Protocol(500).into(),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_key(mut self, key: &str, outcome: LookupOutcome) -> Self {
        self.keys.insert(key.to_string(), outcome);
        self
    }

    pub fn with_fallback(mut self, outcome: LookupOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let `n` gated calls answer.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl DetailsLookup for StubLookup {
    async fn fetch_by_key(&self, key: &str, query: Option<&str>) -> LookupOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Key(key.to_string(), query.map(str::to_string)));
        self.wait_gate().await;
        self.keys.get(key).cloned().unwrap_or(LookupOutcome::NotFound)
    }

    async fn fetch_fallback(&self) -> LookupOutcome {
        self.calls.lock().unwrap().push(Call::Fallback);
        self.wait_gate().await;
        self.fallback.clone()
    }
}

/// Clipboard that counts how often it is read.
pub struct CountingClipboard {
    text: Option<String>,
    pub reads: AtomicUsize,
}

impl CountingClipboard {
    pub fn new(text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_string),
            reads: AtomicUsize::new(0),
        }
    }
}

impl ClipboardReader for CountingClipboard {
    fn read_text(&self) -> Result<Option<String>, PlatformError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Clipboard whose every read fails.
pub struct FailingClipboard;

impl ClipboardReader for FailingClipboard {
    fn read_text(&self) -> Result<Option<String>, PlatformError> {
        Err(PlatformError::Clipboard("xclip not found".into()))
    }
}

/// A successful lookup answering with a `json!` object literal.
pub fn ok(value: serde_json::Value) -> LookupOutcome {
    LookupOutcome::Success(payload(value))
}
