//! Resolution state — single-flight flag, URL arrival, pending fallback.
//!
//! All methods are pure state transitions with no I/O. The orchestrator
//! holds this behind one mutex and calls exactly one transition per
//! critical section, so "cancel, then check" is always atomic.

use tokio::task::AbortHandle;

/// Identifies one scheduled cold-start fallback.
///
/// Monotonically increasing per state instance. A debounce timer only
/// acts if its token is still the pending one when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackToken(u64);

/// A scheduled cold-start fallback that has not fired yet.
#[derive(Debug)]
struct PendingFallback {
    token: FallbackToken,
    abort: AbortHandle,
}

/// What a debounce timer should do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Enter `Resolving` and read the clipboard.
    Begin,
    /// A newer cold start replaced this one, or an explicit URL or a
    /// reset cancelled it.
    Superseded,
    /// An explicit URL arrived after this fallback was scheduled.
    Preempted,
    /// Another resolution is already in flight.
    Busy,
}

/// Process-wide resolution state.
///
/// Initial state: not resolving, no URL seen, nothing pending. Returned
/// to that state by [`finish`](Self::finish) when an attempt terminates.
#[derive(Debug, Default)]
pub struct ResolutionState {
    resolving: bool,
    url_arrived: bool,
    pending_fallback: Option<PendingFallback>,
    /// Token source. Never reset, so a stale timer can't match a newer
    /// schedule.
    last_token: u64,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when every field holds its initial value.
    pub fn is_idle(&self) -> bool {
        !self.resolving && !self.url_arrived && self.pending_fallback.is_none()
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    pub fn url_arrived(&self) -> bool {
        self.url_arrived
    }

    pub fn has_pending_fallback(&self) -> bool {
        self.pending_fallback.is_some()
    }

    /// Record an explicit URL and close the debounce window.
    ///
    /// Returns the abort handle of the cancelled fallback, if one was
    /// pending. The caller aborts it.
    pub fn explicit_url_arrived(&mut self) -> Option<AbortHandle> {
        self.url_arrived = true;
        self.pending_fallback.take().map(|p| p.abort)
    }

    /// Single-flight compare-and-set. Returns `false` if a resolution is
    /// already in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.resolving {
            return false;
        }
        self.resolving = true;
        true
    }

    /// Allocate a token for a fallback about to be scheduled.
    pub fn next_fallback_token(&mut self) -> FallbackToken {
        self.last_token += 1;
        FallbackToken(self.last_token)
    }

    /// Make `token` the pending fallback.
    ///
    /// Returns the abort handle of the fallback it replaces. Only the
    /// most recently scheduled fallback is ever honored.
    pub fn replace_pending(
        &mut self,
        token: FallbackToken,
        abort: AbortHandle,
    ) -> Option<AbortHandle> {
        self.pending_fallback
            .replace(PendingFallback { token, abort })
            .map(|p| p.abort)
    }

    /// Debounce timer fired for `token`.
    ///
    /// Checks the token first, then URL arrival, then single-flight. On
    /// [`FallbackDecision::Begin`] the state is already `Resolving`.
    pub fn fire_fallback(&mut self, token: FallbackToken) -> FallbackDecision {
        match &self.pending_fallback {
            Some(pending) if pending.token == token => {}
            _ => return FallbackDecision::Superseded,
        }
        self.pending_fallback = None;

        if self.url_arrived {
            return FallbackDecision::Preempted;
        }
        if !self.try_begin() {
            return FallbackDecision::Busy;
        }
        FallbackDecision::Begin
    }

    /// Terminal transition: reset to the initial state.
    ///
    /// Returns the abort handle of any fallback scheduled while the
    /// attempt was in flight. The caller aborts it.
    pub fn finish(&mut self) -> Option<AbortHandle> {
        self.resolving = false;
        self.url_arrived = false;
        self.pending_fallback.take().map(|p| p.abort)
    }
}
