//! Launch-signal sources — how URLs and continuation handles arrive.

use url::Url;

use crate::orchestrator::LaunchSignal;

/// Activity type the platform uses for web-browsing continuation
/// (universal links).
pub const BROWSING_WEB: &str = "NSUserActivityTypeBrowsingWeb";

/// A platform "continue activity" handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityHandle {
    pub activity_type: String,
    pub webpage_url: Option<Url>,
}

impl ActivityHandle {
    pub fn new(activity_type: impl Into<String>, webpage_url: Option<Url>) -> Self {
        Self {
            activity_type: activity_type.into(),
            webpage_url,
        }
    }

    /// A web-browsing continuation carrying `url`.
    pub fn browsing_web(url: Url) -> Self {
        Self::new(BROWSING_WEB, Some(url))
    }

    pub fn is_browsing_web(&self) -> bool {
        self.activity_type == BROWSING_WEB
    }

    /// Only web-browsing continuations carry a usable URL; anything else
    /// is treated as a launch without an explicit URL.
    pub fn into_launch_signal(self) -> LaunchSignal {
        match self.webpage_url {
            Some(url) if self.activity_type == BROWSING_WEB => LaunchSignal::ExplicitUrl(url),
            _ => LaunchSignal::None,
        }
    }
}

impl From<ActivityHandle> for LaunchSignal {
    fn from(handle: ActivityHandle) -> Self {
        LaunchSignal::Activity(handle)
    }
}

/// Supplies the launch signal for the current application event.
///
/// The resolver never discovers signals on its own; platform glue hands
/// them in through an implementation of this trait.
pub trait LaunchSignalSource: Send + Sync {
    fn launch_signal(&self) -> LaunchSignal;
}

/// A source that always yields the same signal.
#[derive(Debug, Clone)]
pub struct StaticSignalSource(LaunchSignal);

impl StaticSignalSource {
    pub fn new(signal: LaunchSignal) -> Self {
        Self(signal)
    }
}

impl LaunchSignalSource for StaticSignalSource {
    fn launch_signal(&self) -> LaunchSignal {
        self.0.clone()
    }
}
