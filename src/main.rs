mod cli;

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Command, ServiceArgs};
use sddl::platform::{ClipboardReader, StaticClipboard, StaticSignalSource, XclipClipboard};
use sddl::{ActivityHandle, DeepLinks, HttpLookup, LaunchSignal, Orchestrator, ResolverConfig};
use tracing_subscriber::EnvFilter;

/// Exit code when the attempt was dropped without a result.
const EXIT_SUPPRESSED: i32 = 2;

/// CLI errors raised before a resolution starts.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] sddl::ConfigError),
    #[error("lookup client: {0}")]
    Lookup(#[from] sddl::LookupError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "resolve failed");
            eprintln!("sddl: {e}");
            std::process::exit(1);
        }
    }
}

/// Run one resolution and return the process exit code.
async fn run(cli: Cli) -> Result<i32, CliError> {
    let config = build_config(&cli.service)?;
    let lookup = Arc::new(HttpLookup::new(&config)?);

    let (signal, clipboard_override) = match cli.command {
        Command::Open { url } => (LaunchSignal::ExplicitUrl(url), None),
        Command::Continue {
            activity_type,
            webpage_url,
            clipboard,
        } => (
            LaunchSignal::Activity(ActivityHandle::new(activity_type, webpage_url)),
            clipboard,
        ),
        Command::ColdStart { clipboard } => (LaunchSignal::None, clipboard),
    };

    let clipboard: Arc<dyn ClipboardReader> = match clipboard_override {
        Some(text) => Arc::new(StaticClipboard::new(Some(text))),
        None => Arc::new(XclipClipboard::new()),
    };

    let orchestrator = Orchestrator::new(lookup, clipboard, config.debounce);
    let (dispatcher, mut queue) = sddl::callback_channel();
    let links = DeepLinks::new(orchestrator, dispatcher);

    let code = Arc::new(AtomicI32::new(EXIT_SUPPRESSED));
    let on_success = {
        let code = Arc::clone(&code);
        move |payload: sddl::DetailsPayload| {
            let json = serde_json::Value::Object(payload);
            match serde_json::to_string_pretty(&json) {
                Ok(text) => {
                    println!("{text}");
                    code.store(0, Ordering::SeqCst);
                }
                Err(e) => {
                    eprintln!("sddl: failed to render payload: {e}");
                    code.store(1, Ordering::SeqCst);
                }
            }
        }
    };
    let on_error = {
        let code = Arc::clone(&code);
        move |message: String| {
            eprintln!("sddl: {message}");
            code.store(1, Ordering::SeqCst);
        }
    };

    links.resolve_from(&StaticSignalSource::new(signal), on_success, on_error);
    // The queue closes once the resolution task finishes without posting.
    drop(links);

    if !queue.run_one().await {
        tracing::warn!("resolution suppressed");
        eprintln!("sddl: resolution suppressed");
    }

    Ok(code.load(Ordering::SeqCst))
}

fn build_config(args: &ServiceArgs) -> Result<ResolverConfig, CliError> {
    let config = ResolverConfig {
        app_id: args.app_id.clone(),
        request_timeout: Duration::from_secs(args.timeout_secs),
        debounce: Duration::from_millis(args.debounce_ms),
        ..ResolverConfig::default()
    }
    .with_base_url(&args.base_url)?;
    Ok(config)
}
