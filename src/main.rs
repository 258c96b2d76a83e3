use std::str::FromStr;
use std::sync::Arc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use railannounce::{
    api,
    config::Settings,
    integrations,
    queue::{self, RetryPolicy, TaskQueue},
    service::{
        language_detector::LanguageDetector,
        synthesizer::SpeechSynthesizer,
        translator::Translator,
        ServiceContext,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railannounce=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting RailAnnounce server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let connect_options = SqliteConnectOptions::from_str(&settings.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_with(connect_options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    tokio::fs::create_dir_all(&settings.media.root).await?;

    // Processing backends, shared by every worker
    let detector = Arc::new(LanguageDetector::default());
    let translator = Arc::new(Translator::new(integrations::translation_backend(&settings.translation)));
    let synthesizer = Arc::new(SpeechSynthesizer::new(integrations::speech_engines(&settings.tts)));
    tracing::info!("Speech engines in order: {:?}", synthesizer.engine_names());

    let (task_queue, task_receiver) = TaskQueue::new(settings.queue.capacity);

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        &settings,
        db_pool.clone(),
        detector,
        translator,
        synthesizer,
        task_queue.clone(),
    ));

    // Start queue workers
    let shutdown = CancellationToken::new();
    let workers = queue::start_workers(
        task_receiver,
        task_queue,
        service_context.task_handler(),
        RetryPolicy::from(&settings.queue),
        settings.queue.workers,
        shutdown.clone(),
    );
    tracing::info!("Started {} queue workers", workers.len());

    // Create API app
    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    for worker in workers {
        let _ = worker.await;
    }
    db_pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
