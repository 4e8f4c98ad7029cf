//! Platform capabilities — clipboard access and launch-signal sources.
//!
//! Everything the resolver needs from the host platform sits behind a
//! small trait so tests can substitute deterministic implementations.
//! The orchestrator only ever reads the clipboard; the facade only ever
//! receives launch signals, it never goes looking for them.

pub mod clipboard;
pub mod signal;

pub use clipboard::{ClipboardReader, StaticClipboard, XclipClipboard};
pub use signal::{ActivityHandle, LaunchSignalSource, StaticSignalSource};

/// Errors returned by platform adapters.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Clipboard read failed (e.g. xclip not found, empty selection,
    /// non-UTF-8 contents).
    #[error("clipboard: {0}")]
    Clipboard(String),
}
