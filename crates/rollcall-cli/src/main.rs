use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "browser")]
use rollcall_client::BrowserSource;
use rollcall_client::{FileSource, Mirror, parse_html};
use rollcall_core::{
    BroadcastNotifier, ChangeMonitor, ControlChannel, DocumentHost, ExtractionSession,
    LiveDocument, MonitorConfig, Request,
};

#[derive(Parser)]
#[command(name = "rollcall", version, about = "Live meeting participant extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract participants once from a saved meeting page
    Extract {
        /// Path to the saved page (HTML)
        #[arg(short, long)]
        file: PathBuf,

        /// URL the page was captured from
        #[arg(short, long, env = "ROLLCALL_PAGE_URL", default_value = "https://meet.google.com/")]
        url: String,

        /// Print the full extraction report instead of the response message
        #[arg(long, default_value_t = false)]
        report: bool,
    },

    /// Mirror a page and print every participant update as a JSON line
    Watch {
        /// Saved page to re-read on every poll
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// URL the saved page was captured from
        #[arg(short, long, env = "ROLLCALL_PAGE_URL", default_value = "https://meet.google.com/")]
        url: String,

        /// DevTools websocket URL of a running Chromium
        #[cfg(feature = "browser")]
        #[arg(long, env = "ROLLCALL_BROWSER_WS")]
        browser: Option<String>,

        /// Capture interval in milliseconds
        #[arg(long, env = "ROLLCALL_POLL_MS", default_value_t = 1000)]
        poll_ms: u64,
    },
}

fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rollcall=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MonitorConfig::from_env().context("Invalid monitor configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Extract { file, url, report } => cmd_extract(&file, &url, report, config),
            Commands::Watch {
                file,
                url,
                #[cfg(feature = "browser")]
                browser,
                poll_ms,
            } => {
                let source = WatchSource {
                    file,
                    url,
                    #[cfg(feature = "browser")]
                    browser,
                };
                cmd_watch(source, Duration::from_millis(poll_ms), config).await
            }
        }
    })
}

fn cmd_extract(file: &Path, url: &str, report: bool, config: MonitorConfig) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read page file: {}", file.display()))?;
    let snapshot = parse_html(&html);
    tracing::info!(elements = snapshot.len(), "Loaded {}", file.display());

    if report {
        let report = ExtractionSession::new(&snapshot).run();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let document = LiveDocument::new(config.meeting_host.clone());
    document.replace(url, snapshot);
    if !document.is_meeting_page() {
        tracing::warn!(%url, meeting_host = %config.meeting_host, "Page is not on the meeting host");
    }

    let channel = ControlChannel::new(ChangeMonitor::new(
        document,
        BroadcastNotifier::default(),
        config,
    ));
    let response = channel.handle(Request::GetParticipants);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

struct WatchSource {
    file: Option<PathBuf>,
    url: String,
    #[cfg(feature = "browser")]
    browser: Option<String>,
}

async fn cmd_watch(source: WatchSource, poll_interval: Duration, config: MonitorConfig) -> Result<()> {
    let document = LiveDocument::new(config.meeting_host.clone());
    let notifier = BroadcastNotifier::default();
    let mut updates = notifier.subscribe();
    let monitor = ChangeMonitor::new(document.clone(), notifier, config.clone());
    let cancel = CancellationToken::new();

    let mirror = spawn_mirror(source, document, poll_interval, &config, cancel.clone()).await?;

    let auto = monitor.clone();
    tokio::spawn(async move {
        match auto.auto_start().await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Mirrored page is not a meeting page, nothing to watch"),
            Err(e) => tracing::error!(error = %e, "Failed to start monitoring"),
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            update = updates.recv() => match update {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Output fell behind, skipped updates");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop();
    cancel.cancel();
    mirror.await.context("Mirror task failed")?;
    Ok(())
}

async fn spawn_mirror(
    source: WatchSource,
    document: LiveDocument,
    poll_interval: Duration,
    config: &MonitorConfig,
    cancel: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    #[cfg(feature = "browser")]
    if let Some(ws_url) = source.browser {
        if source.file.is_some() {
            anyhow::bail!("--file and --browser cannot be used together");
        }
        let browser = BrowserSource::connect(&ws_url, config.meeting_host.clone())
            .await
            .context("Failed to attach to browser")?;
        let mirror = Mirror::new(browser, document).with_poll_interval(poll_interval);
        return Ok(tokio::spawn(mirror.run(cancel)));
    }

    let Some(file) = source.file else {
        anyhow::bail!("Nothing to watch: pass --file (or --browser with the browser feature)");
    };
    tracing::info!(file = %file.display(), url = %source.url, meeting_host = %config.meeting_host, "Watching saved page");
    let mirror = Mirror::new(FileSource::new(file, source.url), document).with_poll_interval(poll_interval);
    Ok(tokio::spawn(mirror.run(cancel)))
}
