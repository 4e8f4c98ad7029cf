use clap::{Args, Parser, Subcommand};
use url::Url;

#[derive(Parser)]
#[command(name = "sddl", about = "Resolve deep links into details payloads")]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Lookup service settings shared by every subcommand.
#[derive(Args)]
pub struct ServiceArgs {
    /// Lookup API root
    #[arg(
        long,
        env = "SDDL_BASE_URL",
        default_value = sddl::config::DEFAULT_BASE_URL,
        global = true
    )]
    pub base_url: String,

    /// Originating application identifier
    #[arg(long, env = "SDDL_APP_ID", global = true)]
    pub app_id: Option<String>,

    /// Cold-start debounce window in milliseconds
    #[arg(long, env = "SDDL_DEBOUNCE_MS", default_value_t = 300, global = true)]
    pub debounce_ms: u64,

    /// Network timeout in seconds
    #[arg(long, env = "SDDL_TIMEOUT_SECS", default_value_t = 5, global = true)]
    pub timeout_secs: u64,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an explicit launch URL
    Open {
        /// Launch URL, e.g. https://sddl.me/abcd1234?ref=x
        url: Url,
    },

    /// Resolve a platform activity continuation
    Continue {
        /// Activity type; only web-browsing continuations carry a URL
        #[arg(long, default_value = sddl::platform::signal::BROWSING_WEB)]
        activity_type: String,

        /// Web page URL carried by the activity
        #[arg(long)]
        webpage_url: Option<Url>,

        /// Clipboard text to use instead of reading the system clipboard
        #[arg(long)]
        clipboard: Option<String>,
    },

    /// Cold start: wait out the debounce, then try the clipboard
    ColdStart {
        /// Clipboard text to use instead of reading the system clipboard
        #[arg(long)]
        clipboard: Option<String>,
    },
}
