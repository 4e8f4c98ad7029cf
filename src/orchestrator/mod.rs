//! Resolution orchestrator — decides which launch signal to trust.
//!
//! Three sources compete for each launch: an explicit URL, a clipboard
//! code read on cold start, and the generic "try" endpoint. The
//! orchestrator turns them into exactly one outcome per resolution
//! attempt:
//!
//! - An explicit URL closes the debounce window immediately and resolves
//!   the key in its first path segment (or host), else the fallback.
//! - A cold start waits out the debounce delay, then resolves the
//!   clipboard key if it validates, else the fallback. Only the most
//!   recently scheduled cold start is honored.
//! - A key lookup that reports not-found gets exactly one follow-up call
//!   to the fallback endpoint.
//! - Single-flight: while one attempt is in flight, further attempts are
//!   dropped, not queued.
//!
//! All state lives in one [`ResolutionState`] behind one mutex. The
//! mutex is never held across an `.await`.

pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use url::Url;
use uuid::Uuid;

use crate::key::{is_valid_key, key_from_url};
use crate::lookup::{DetailsLookup, DetailsPayload, LookupError, LookupOutcome};
use crate::platform::{ActivityHandle, ClipboardReader};
use state::{FallbackDecision, FallbackToken, ResolutionState};

/// A launch or continuation event handed in by platform glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchSignal {
    /// The application was opened with a URL.
    ExplicitUrl(Url),
    /// The application was asked to continue a platform activity.
    Activity(ActivityHandle),
    /// Cold start with no URL known yet.
    None,
}

impl LaunchSignal {
    /// Collapse activity handles: web-browsing continuations become
    /// explicit URLs, everything else becomes `None`.
    pub fn normalize(self) -> Self {
        match self {
            LaunchSignal::Activity(handle) => handle.into_launch_signal(),
            other => other,
        }
    }
}

impl From<Option<Url>> for LaunchSignal {
    fn from(url: Option<Url>) -> Self {
        url.map_or(LaunchSignal::None, LaunchSignal::ExplicitUrl)
    }
}

/// Terminal resolution failures delivered to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The fallback hop itself reported not-found.
    #[error("details not found")]
    NotFound,
}

/// Terminal result of one resolution attempt.
pub type Resolution = Result<DetailsPayload, ResolveError>;

/// Handle to a resolution attempt, returned immediately by
/// [`Orchestrator::resolve`].
///
/// Resolves to `Some(resolution)` for an attempt that reached
/// `Resolving`, or `None` if the attempt was dropped: suppressed by
/// single-flight, pre-empted by an explicit URL, or superseded by a
/// newer cold start. Dropping the ticket abandons the result; the
/// resolution itself still runs to completion.
#[derive(Debug)]
pub struct Ticket {
    rx: oneshot::Receiver<Resolution>,
}

impl Future for Ticket {
    type Output = Option<Resolution>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

/// What a resolution attempt will look up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Key { key: String, query: Option<String> },
    Fallback,
}

struct Inner {
    state: Mutex<ResolutionState>,
    lookup: Arc<dyn DetailsLookup>,
    clipboard: Arc<dyn ClipboardReader>,
    debounce: Duration,
}

/// Owns the resolution state and drives lookups.
///
/// Cheap to clone; clones share state. Independent instances share
/// nothing, so tests can run several side by side.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        lookup: Arc<dyn DetailsLookup>,
        clipboard: Arc<dyn ClipboardReader>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ResolutionState::new()),
                lookup,
                clipboard,
                debounce,
            }),
        }
    }

    /// Start resolving `signal`. Returns immediately.
    ///
    /// Must be called from within a tokio runtime; the resolution and
    /// any debounce timer run on spawned tasks.
    pub fn resolve(&self, signal: LaunchSignal) -> Ticket {
        let (tx, rx) = oneshot::channel();
        match signal.normalize() {
            LaunchSignal::ExplicitUrl(url) => self.resolve_url(url, tx),
            _ => self.schedule_cold_start(tx),
        }
        Ticket { rx }
    }

    /// `true` when no attempt is in flight, no URL has been recorded and
    /// no cold start is pending.
    pub fn is_idle(&self) -> bool {
        self.lock_state().is_idle()
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolutionState> {
        // State is plain data and consistent between transitions, so a
        // panic elsewhere can't leave it half-updated.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_url(&self, url: Url, tx: oneshot::Sender<Resolution>) {
        {
            let mut state = self.lock_state();
            if let Some(pending) = state.explicit_url_arrived() {
                pending.abort();
                tracing::debug!(%url, "explicit URL cancelled pending cold start");
            }
            if !state.try_begin() {
                tracing::debug!(%url, "resolution already in flight, dropping duplicate");
                return;
            }
        }

        let target = match key_from_url(&url) {
            Some(key) => Target::Key {
                key,
                query: url.query().map(str::to_string),
            },
            None => Target::Fallback,
        };
        let attempt = Uuid::new_v4();
        tracing::info!(%attempt, %url, ?target, "resolving explicit URL");

        let this = self.clone();
        tokio::spawn(async move {
            let guard = ResolvingGuard(&this);
            let resolution = this.run(attempt, target).await;
            drop(guard);
            deliver(attempt, resolution, tx);
        });
    }

    fn schedule_cold_start(&self, tx: oneshot::Sender<Resolution>) {
        let mut state = self.lock_state();
        let token = state.next_fallback_token();

        let this = self.clone();
        let timer = tokio::spawn(async move { this.fallback_after_debounce(token, tx).await });

        if let Some(previous) = state.replace_pending(token, timer.abort_handle()) {
            previous.abort();
            tracing::debug!("cold start superseded an earlier one");
        }
        tracing::debug!(
            debounce_ms = self.inner.debounce.as_millis() as u64,
            "cold start scheduled"
        );
    }

    async fn fallback_after_debounce(&self, token: FallbackToken, tx: oneshot::Sender<Resolution>) {
        tokio::time::sleep(self.inner.debounce).await;

        let decision = self.lock_state().fire_fallback(token);
        if decision != FallbackDecision::Begin {
            tracing::debug!(?decision, "cold start skipped");
            return;
        }
        let guard = ResolvingGuard(self);

        let target = match self.read_clipboard().await {
            Some(text) if is_valid_key(&text) => Target::Key {
                key: text,
                query: None,
            },
            Some(_) => {
                tracing::debug!("clipboard text is not a lookup key");
                Target::Fallback
            }
            None => Target::Fallback,
        };
        let attempt = Uuid::new_v4();
        tracing::info!(%attempt, ?target, "resolving cold start");

        let resolution = self.run(attempt, target).await;
        drop(guard);
        deliver(attempt, resolution, tx);
    }

    /// Read the clipboard off the async workers. Failures count as an
    /// empty clipboard.
    async fn read_clipboard(&self) -> Option<String> {
        let clipboard = Arc::clone(&self.inner.clipboard);
        match tokio::task::spawn_blocking(move || clipboard.read_text()).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "clipboard read failed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard task failed");
                None
            }
        }
    }

    /// Perform the lookup for `target`, with the single not-found →
    /// fallback hop.
    async fn run(&self, attempt: Uuid, target: Target) -> Resolution {
        let lookup = &self.inner.lookup;
        let outcome = match target {
            Target::Key { key, query } => match lookup.fetch_by_key(&key, query.as_deref()).await {
                LookupOutcome::NotFound => {
                    tracing::info!(%attempt, %key, "key not found, trying fallback");
                    lookup.fetch_fallback().await
                }
                other => other,
            },
            Target::Fallback => lookup.fetch_fallback().await,
        };

        match outcome {
            LookupOutcome::Success(payload) => Ok(payload),
            LookupOutcome::NotFound => Err(ResolveError::NotFound),
            LookupOutcome::Failed(e) => Err(e.into()),
        }
    }
}

/// Resets the state to idle when dropped, so a resolution that panics
/// can't wedge single-flight.
struct ResolvingGuard<'a>(&'a Orchestrator);

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.0.lock_state().finish() {
            pending.abort();
        }
    }
}

/// Hand the terminal result to the caller. State is already idle.
fn deliver(attempt: Uuid, resolution: Resolution, tx: oneshot::Sender<Resolution>) {
    match &resolution {
        Ok(payload) => tracing::info!(%attempt, fields = payload.len(), "resolution succeeded"),
        Err(e) => tracing::warn!(%attempt, error = %e, "resolution failed"),
    }
    if tx.send(resolution).is_err() {
        tracing::debug!(%attempt, "caller abandoned resolution");
    }
}
