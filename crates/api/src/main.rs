use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hydrowatch_api::config::ServerConfig;
use hydrowatch_api::router::build_app_router;
use hydrowatch_api::state::AppState;
use hydrowatch_events::{BroadcastHub, EmailConfig, EmailDelivery};
use hydrowatch_mqtt::{MqttConfig, MqttListener};
use hydrowatch_pipeline::{
    ClassifierConfig, HttpClassifier, PgReadingStore, PipelineConfig, ReadingPipeline,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hydrowatch_api=debug,hydrowatch_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let mut config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let pipeline_config = PipelineConfig::from_env().expect("Invalid pipeline configuration");
    tracing::info!(
        threshold = pipeline_config.contamination_threshold,
        "Loaded pipeline configuration"
    );

    // --- Database (optional) ---
    let pool = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = hydrowatch_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            hydrowatch_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");
            Some(pool)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, readings will not be persisted");
            None
        }
    };

    // --- Pipeline ---
    let hub = Arc::new(BroadcastHub::new(pipeline_config.hub_capacity));
    let mut pipeline = ReadingPipeline::new(&pipeline_config, Arc::clone(&hub))
        .expect("Invalid pipeline configuration");

    match ClassifierConfig::from_env() {
        Some(classifier_config) => {
            tracing::info!(url = %classifier_config.url, "Classifier service configured");
            pipeline = pipeline.with_classifier(Arc::new(HttpClassifier::new(classifier_config)));
        }
        None => tracing::warn!("CLASSIFIER_URL not set, every reading will be treated as unsafe"),
    }

    match (EmailConfig::from_env(), pipeline_config.alert_recipient.clone()) {
        (Some(email_config), Some(recipient)) => {
            let email = EmailDelivery::new(email_config).expect("Invalid SMTP configuration");
            tracing::info!(%recipient, "Email alerts enabled");
            pipeline = pipeline.with_notifier(Arc::new(email), recipient);
        }
        _ => tracing::warn!("SMTP_HOST or ALERT_RECIPIENT not set, alerts will not be sent"),
    }

    if let Some(pool) = &pool {
        pipeline = pipeline.with_store(Arc::new(PgReadingStore::new(pool.clone())));
    }

    let pipeline = Arc::new(pipeline);
    config.cover_pipeline_budget(pipeline.capability_budget());

    // --- MQTT listener (optional) ---
    let mqtt_cancel = CancellationToken::new();
    let (mqtt_connected, mqtt_handle) = match MqttConfig::from_env() {
        Some(mqtt_config) => {
            let listener = MqttListener::new(mqtt_config, Arc::clone(&pipeline));
            let connected = listener.connected_flag();
            let handle = tokio::spawn(listener.run(mqtt_cancel.clone()));
            (connected, Some(handle))
        }
        None => {
            tracing::warn!("MQTT_HOST not set, MQTT ingestion disabled");
            (Arc::new(AtomicBool::new(false)), None)
        }
    };

    // --- App state ---
    let state = AppState {
        pool,
        pipeline,
        mqtt_connected,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    mqtt_cancel.cancel();
    if let Some(handle) = mqtt_handle {
        let grace = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("MQTT listener did not stop in time");
        }
    }

    tracing::info!(observers = hub.observer_count(), "Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
