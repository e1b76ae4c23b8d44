mod adapters;
mod application;
mod cli;
mod config;
mod domain;
mod interface;
mod ports;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{ApiFeed, DockerAdapter};
use application::{AggregationService, OverlapPolicy, Poller};
use cli::{Cli, Commands, WatchArgs};
use config::Config;
use interface::http::create_router;
use interface::terminal;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env();
    config.validate()?;

    // Initialize logging; stderr keeps the terminal dashboard clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dockpulse={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Watch(args) => watch(config, args).await,
    }
}

async fn serve(config: Config) -> Result<(), BoxError> {
    info!("🚀 Starting DockPulse v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Never fails: endpoints report the runtime as unavailable instead
    let docker = DockerAdapter::connect(&config.docker_host, config.request_timeout.as_secs());
    if let Some(reason) = docker.unavailable_reason() {
        warn!("⚠ Starting without Docker ({}); the connection is retried on every request", reason);
    }
    let service = Arc::new(AggregationService::new(Arc::new(docker), config.request_timeout));

    let app = create_router(service);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ DockPulse listening on {}", addr);
    info!("  → Dashboard: http://localhost:{}", config.port);
    info!("  → API: http://localhost:{}/api/containers/stats", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn watch(config: Config, args: WatchArgs) -> Result<(), BoxError> {
    let url = args.url.unwrap_or(config.api_url);
    let interval = args.interval.map(Duration::from_secs).unwrap_or(config.poll_interval);
    let overlap = if args.skip_overlapping || config.skip_overlapping {
        OverlapPolicy::SkipWhileInFlight
    } else {
        OverlapPolicy::Tolerate
    };

    let feed = ApiFeed::new(&url, config.request_timeout)?;
    info!("Polling {} every {:?}", feed.stats_url(), interval);

    let poller = Poller::new(Arc::new(feed), interval, overlap);
    let mut updates = poller.subscribe();
    draw(&terminal::render(&poller.state(), args.status))?;

    // Enter on stdin requests an immediate refresh
    let (manual_tx, manual_rx) = mpsc::channel(4);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if manual_tx.try_send(()).is_err() {
                debug!("manual refresh already queued");
            }
        }
    });

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let runner = tokio::spawn(poller.run(manual_rx, async move {
        let _ = stop_rx.await;
    }));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = terminal::render(&updates.borrow_and_update(), args.status);
                draw(&frame)?;
            }
            _ = &mut ctrl_c => break,
        }
    }

    let _ = stop_tx.send(());
    if let Err(e) = runner.await {
        warn!("Polling task ended abnormally: {}", e);
    }

    Ok(())
}

/// Clear the screen and print one dashboard frame.
fn draw(frame: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\x1b[2J\x1b[H{}\nPress Enter to refresh, Ctrl+C to quit.\n", frame)?;
    stdout.flush()
}
