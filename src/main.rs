use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use ara_mail_dispatch::config::Settings;
use ara_mail_dispatch::infrastructure::redis::RedisPool;
use ara_mail_dispatch::queue::{create_job_queue, NotificationWorker};
use ara_mail_dispatch::server::{create_app, AppState};
use ara_mail_dispatch::tasks::TransportProbeTask;
use ara_mail_dispatch::telemetry::init_telemetry;
use ara_mail_dispatch::template::TemplateRegistry;
use ara_mail_dispatch::transport::TransportManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    init_telemetry(&settings.logging)?;
    tracing::info!("Configuration loaded");

    // Templates
    let registry = Arc::new(TemplateRegistry::with_builtin(&settings.templates.product_name));
    for template in settings.templates.custom.iter().cloned() {
        let name = template.name.clone();
        if let Err(e) = registry.register_placeholder(template) {
            tracing::error!(template = %name, error = %e, "Skipping invalid custom template");
        }
    }
    tracing::info!(templates = registry.len(), "Template registry ready");

    // Transport; verification runs in the background
    let transport = Arc::new(TransportManager::smtp());
    transport.start(&settings.smtp).await;

    // Job queue
    let redis_pool = if settings.queue.backend == "redis" {
        match RedisPool::new(settings.redis.clone()) {
            Ok(pool) => {
                // Jobs are still admitted once Redis comes up
                if let Err(e) = pool.ping().await {
                    tracing::warn!(error = %e, url = %pool.url(), "Redis not reachable at startup");
                }
                Some(Arc::new(pool))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Redis client for the job queue");
                None
            }
        }
    } else {
        None
    };
    let queue = create_job_queue(&settings.queue, redis_pool);

    // Create application state
    let state = AppState::new(settings.clone(), registry, transport.clone(), queue.clone());
    tracing::info!("Application state initialized");

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let mut background = Vec::new();

    if settings.queue.enabled && settings.worker.enabled {
        let worker = NotificationWorker::new(
            queue,
            state.dispatcher.clone(),
            settings.worker.clone(),
            shutdown_tx.subscribe(),
        );
        background.push(tokio::spawn(worker.run()));
    }

    if settings.smtp.reverify_interval_seconds > 0 {
        let probe = TransportProbeTask::new(
            transport.clone(),
            Duration::from_secs(settings.smtp.reverify_interval_seconds),
            shutdown_tx.subscribe(),
        );
        background.push(tokio::spawn(probe.run()));
    }

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    // Wait for background tasks to finish
    tracing::info!("Waiting for background tasks to finish...");
    for handle in background {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    transport.shutdown().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the worker and the transport probe
    let _ = shutdown_tx.send(());
}
