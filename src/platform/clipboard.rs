//! ClipboardReader trait — read-only system clipboard access.

use std::process::{Command, Stdio};

use super::PlatformError;

/// Reads the current clipboard text.
///
/// Queried at most once per cold-start resolution. `Send + Sync` is
/// required because the read happens on a spawned task.
pub trait ClipboardReader: Send + Sync {
    /// Current clipboard text, or `None` if the clipboard holds no text.
    fn read_text(&self) -> Result<Option<String>, PlatformError>;
}

/// X11 clipboard via `xclip -selection clipboard -o`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XclipClipboard;

impl XclipClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardReader for XclipClipboard {
    fn read_text(&self) -> Result<Option<String>, PlatformError> {
        let output = Command::new("xclip")
            .args(["-selection", "clipboard", "-o"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| PlatformError::Clipboard(format!("failed to spawn xclip -o: {e}")))?;

        if !output.status.success() {
            return Err(PlatformError::Clipboard(format!(
                "xclip -o exited with status {}",
                output.status
            )));
        }
        if output.stdout.is_empty() {
            return Ok(None);
        }

        String::from_utf8(output.stdout)
            .map(Some)
            .map_err(|_| PlatformError::Clipboard("clipboard contents are not UTF-8".into()))
    }
}

/// Fixed clipboard contents — CLI override and test double.
#[derive(Debug, Default, Clone)]
pub struct StaticClipboard {
    text: Option<String>,
}

impl StaticClipboard {
    pub fn new(text: Option<String>) -> Self {
        Self { text }
    }

    /// An empty clipboard.
    pub fn empty() -> Self {
        Self { text: None }
    }
}

impl ClipboardReader for StaticClipboard {
    fn read_text(&self) -> Result<Option<String>, PlatformError> {
        Ok(self.text.clone())
    }
}
