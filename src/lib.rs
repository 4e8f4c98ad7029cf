//! Deep-link resolution for application launches.
//!
//! Reconciles an explicit launch URL, a clipboard-carried code and the
//! generic "try" fallback into exactly one details payload per launch.
//! See [`orchestrator`] for the arbitration rules and [`facade`] for the
//! callback-style entry points.

pub mod config;
pub mod facade;
pub mod key;
pub mod lookup;
pub mod orchestrator;
pub mod platform;

pub use config::{ConfigError, ResolverConfig};
pub use facade::{CallbackQueue, DeepLinks, Dispatcher, callback_channel};
pub use key::is_valid_key;
pub use lookup::{DetailsLookup, DetailsPayload, HttpLookup, LookupError, LookupOutcome};
pub use orchestrator::{LaunchSignal, Orchestrator, Resolution, ResolveError, Ticket};
pub use platform::{ActivityHandle, ClipboardReader, LaunchSignalSource};
