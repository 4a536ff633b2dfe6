use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use mirador::{http, CronScheduler, CronSettings, Database, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let cancellation_token = CancellationToken::new();

    let db = Arc::new(
        Database::new(settings.clone())
            .await
            .context("Failed to initialize database connection")?,
    );

    run_service(settings, db, cancellation_token).await
}

async fn run_service(
    settings: Arc<Settings>,
    db: Arc<Database>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    // Spawn the HTTP report API
    let ctx = http::AppContext::new(db.clone(), settings.clone());
    let addr: SocketAddr = format!("{}:{}", settings.http.host, settings.http.port)
        .parse()
        .context("Invalid HTTP bind address")?;

    let http_token = cancellation_token.child_token();
    let (bound_addr, server) = warp::serve(http::routes(ctx))
        .bind_with_graceful_shutdown(addr, async move {
            http_token.cancelled().await;
        });
    let http_handle = tokio::spawn(server);

    info!("Report API listening on {}", bound_addr);

    // Create and spawn cron scheduler for background jobs
    // (building and area snapshot recomputation)
    let cron_scheduler = CronScheduler::new(
        db.clone(),
        Arc::new(settings.market.clone()),
        CronSettings::default(),
    );

    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!("Cron scheduler started - snapshot jobs will run periodically");

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    // Set up graceful shutdown signal handler
    info!("Service running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    // Cancel all running tasks
    info!("Finishing all tasks...");

    cancellation_token.cancel();

    // Wait for the HTTP server to drain
    info!("Waiting for report API to stop...");
    let _ = http_handle.await;

    // Wait for cron scheduler to stop
    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    info!("All tasks stopped");
    Ok(())
}
