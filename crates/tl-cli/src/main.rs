mod config;

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, EnvFilter};

use tl_core::{
    format_articles, format_status, notification_channel, run_schedule, HttpFetcher, Monitor,
    MonitorSchedule, Notification, NotificationDispatcher, Region, StatusService, WebhookConfig,
    WebhookNotifier,
};

use crate::config::AppConfig;

static VERSION: LazyLock<String> = LazyLock::new(|| {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION.to_string()
    } else {
        format!("{VERSION} ({GIT_HASH})")
    }
});

/// Throne & Liberty server status, news, and an hourly status monitor.
#[derive(Parser)]
#[command(name = "tl-status", version = VERSION.as_str(), about)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print current server status.
    Status {
        /// Only this region (europe, america, asia, japan).
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Print recent news articles.
    News {
        /// Only articles in this category (case-insensitive).
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of articles. Defaults to the configured news limit.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print recent update articles.
    Updates,
    /// Print the full text of the most recent update.
    LatestUpdate,
    /// Run the status monitor in the foreground, posting to the configured webhook.
    Watch {
        /// Region to monitor. Overrides config file.
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Start the HTTP API server, with the monitor when notifications are configured.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
}

impl Commands {
    fn is_long_running(&self) -> bool {
        matches!(self, Commands::Watch { .. } | Commands::Serve { .. })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            init_tracing("pretty", "warn");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let default_level = if cli.command.is_long_running() {
        "info"
    } else {
        "warn"
    };
    init_tracing(&app_config.server.log_format, default_level);
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "Loaded config file");
    }

    let result = match cli.command {
        Commands::Status { region } => run_status(&app_config, region).await,
        Commands::News { category, limit } => run_news(&app_config, category, limit).await,
        Commands::Updates => run_updates(&app_config).await,
        Commands::LatestUpdate => run_latest_update(&app_config).await,
        Commands::Watch { region } => run_watch(&app_config, region).await,
        Commands::Serve { listen } => run_serve(&app_config, listen).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

/// Shared HTTP client plus the service built on it.
fn build_service(app_config: &AppConfig) -> Result<(Arc<StatusService>, Client), String> {
    let scraper = app_config.scraper_config()?;
    let client = HttpFetcher::build_client(scraper.request_timeout).map_err(|e| e.to_string())?;
    let fetcher = Arc::new(HttpFetcher::with_client(client.clone(), scraper.retry));
    Ok((Arc::new(StatusService::new(scraper, fetcher)), client))
}

/// Runs `fut` behind a spinner on stderr.
async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(s);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    spinner.finish_and_clear();
    out
}

async fn run_status(app_config: &AppConfig, region: Option<String>) -> Result<(), String> {
    let (service, _) = build_service(app_config)?;
    let report = with_spinner(
        "Fetching server status...",
        service.server_status_by_name(region.as_deref()),
    )
    .await
    .map_err(|e| e.to_string())?;

    println!("{}", format_status(&report));
    Ok(())
}

async fn run_news(
    app_config: &AppConfig,
    category: Option<String>,
    limit: Option<usize>,
) -> Result<(), String> {
    let (service, _) = build_service(app_config)?;
    let limit = limit.unwrap_or(service.config().news_limit);
    let articles = with_spinner(
        "Fetching news...",
        service.news(category.as_deref(), limit),
    )
    .await
    .map_err(|e| e.to_string())?;

    println!("{}", format_articles(&articles));
    Ok(())
}

async fn run_updates(app_config: &AppConfig) -> Result<(), String> {
    let (service, _) = build_service(app_config)?;
    let articles = with_spinner("Fetching updates...", service.updates())
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", format_articles(&articles));
    Ok(())
}

async fn run_latest_update(app_config: &AppConfig) -> Result<(), String> {
    let (service, _) = build_service(app_config)?;
    let text = with_spinner("Fetching latest update...", service.latest_update())
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", text);
    Ok(())
}

async fn run_watch(app_config: &AppConfig, region: Option<String>) -> Result<(), String> {
    let webhook = app_config
        .webhook_config()
        .map_err(|e| format!("Monitor cannot start: {}", e))?;
    let region = match region {
        Some(r) => r.parse::<Region>().map_err(|e| e.to_string())?,
        None => app_config.region()?,
    };
    let schedule = app_config.monitor.schedule();
    let (service, client) = build_service(app_config)?;

    print_watch_header(region, &schedule, &webhook);

    let (tx, dispatcher) = spawn_dispatcher(webhook, client);
    let mut monitor = Monitor::new(service, region, Some(tx));

    run_schedule(&mut monitor, schedule, tl_api::shutdown_signal()).await;

    drop(monitor);
    stop_dispatcher(dispatcher).await;
    println!("\n{}", style("Monitor stopped.").dim());
    Ok(())
}

async fn run_serve(app_config: &AppConfig, listen_override: Option<SocketAddr>) -> Result<(), String> {
    let listen = listen_override.unwrap_or(app_config.server.listen);
    let (service, client) = build_service(app_config)?;

    let monitor_task = match app_config.webhook_config() {
        Ok(webhook) => {
            let schedule = app_config.monitor.schedule();
            let (tx, dispatcher) = spawn_dispatcher(webhook, client);
            let (stop_tx, stop_rx) = oneshot::channel::<()>();

            let mut monitor = Monitor::for_default_region(Arc::clone(&service), Some(tx));
            let region = monitor.region();
            let handle = tokio::spawn(async move {
                run_schedule(&mut monitor, schedule, async {
                    let _ = stop_rx.await;
                })
                .await;
            });
            tracing::info!(%region, "Status monitor started");
            Some((stop_tx, handle, dispatcher))
        }
        Err(e) => {
            tracing::warn!(reason = %e, "Status monitor disabled");
            None
        }
    };

    let state = tl_api::state::AppState::new(service);

    tracing::info!(%listen, "Starting status API server");
    let served = tl_api::serve_with_state(listen, state, tl_api::shutdown_signal())
        .await
        .map_err(|e| format!("Server failed: {}", e));

    if let Some((stop_tx, handle, dispatcher)) = monitor_task {
        tracing::info!("Stopping status monitor...");
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Monitor task ended abnormally");
        }
        stop_dispatcher(dispatcher).await;
    }

    tracing::info!("Shutdown complete");
    served
}

fn spawn_dispatcher(
    webhook: WebhookConfig,
    client: Client,
) -> (tokio::sync::mpsc::UnboundedSender<Notification>, JoinHandle<()>) {
    let (tx, rx) = notification_channel();
    let notifier = Arc::new(WebhookNotifier::new(webhook, client));
    let handle = tokio::spawn(NotificationDispatcher::new(rx, notifier).run());
    tracing::info!("Webhook dispatcher started");
    (tx, handle)
}

/// Waits for queued notifications to drain once every sender is gone.
async fn stop_dispatcher(handle: JoinHandle<()>) {
    match tokio::time::timeout(Duration::from_secs(5), handle).await {
        Ok(_) => tracing::info!("Webhook dispatcher shut down"),
        Err(_) => tracing::warn!("Webhook dispatcher did not shut down in time, aborting"),
    }
}

fn print_watch_header(region: Region, schedule: &MonitorSchedule, webhook: &WebhookConfig) {
    println!(
        "{} {}",
        style("tl-status").bold(),
        style(VERSION.as_str()).dim()
    );
    println!("  {} {}", style("region: ").dim(), style(region).bold());
    println!(
        "  {} {}",
        style("check:  ").dim(),
        humanize(schedule.check_interval)
    );
    println!(
        "  {} {}",
        style("reset:  ").dim(),
        humanize(schedule.reset_interval)
    );
    println!("  {} {}", style("webhook:").dim(), webhook.url);
    println!();
    println!("{}", style("Press Ctrl+C to stop").dim());
    println!();
}

fn humanize(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        s if s % 86_400 == 0 => format!("every {}d", s / 86_400),
        s if s % 3_600 == 0 => format!("every {}h", s / 3_600),
        s if s % 60 == 0 => format!("every {}m", s / 60),
        s => format!("every {}s", s),
    }
}

fn init_tracing(log_format: &str, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_format {
        "json" => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
