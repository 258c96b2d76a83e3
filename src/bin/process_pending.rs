use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use railannounce::{
    config::Settings,
    domain::AnnouncementStatus,
    integrations,
    queue::TaskQueue,
    service::{
        language_detector::LanguageDetector,
        pipeline::ProcessOutcome,
        synthesizer::SpeechSynthesizer,
        translator::Translator,
        ServiceContext,
    },
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

/// Run the announcement pipeline in this process, without the queue.
#[derive(Parser, Debug)]
#[command(name = "process_pending", version)]
struct Args {
    /// Process only this announcement
    #[arg(long)]
    id: Option<Uuid>,

    /// Also retry announcements whose processing failed
    #[arg(long)]
    include_failed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railannounce=info".into()),
        )
        .init();

    let args = Args::parse();

    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    let connect_options = SqliteConnectOptions::from_str(&settings.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_with(connect_options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Nothing consumes the queue here; the pipeline runs inline
    let (task_queue, _task_receiver) = TaskQueue::new(1);

    let ctx = ServiceContext::new(
        &settings,
        db_pool.clone(),
        Arc::new(LanguageDetector::default()),
        Arc::new(Translator::new(integrations::translation_backend(&settings.translation))),
        Arc::new(SpeechSynthesizer::new(integrations::speech_engines(&settings.tts))),
        task_queue,
    );

    let ids = match args.id {
        Some(id) => vec![id],
        None => {
            let mut statuses = vec![AnnouncementStatus::Pending];
            if args.include_failed {
                statuses.push(AnnouncementStatus::Failed);
            }

            let mut ids = Vec::new();
            for status in statuses {
                ids.extend(
                    ctx.announcement_repo
                        .list_by_status(status)
                        .await?
                        .into_iter()
                        .map(|a| a.id),
                );
            }
            ids
        }
    };

    if ids.is_empty() {
        println!("No pending announcements found");
        return Ok(());
    }

    println!("Found {} announcement(s) to process", ids.len());

    let mut failures = 0;
    for id in ids {
        println!("Processing announcement {}...", id);
        match ctx.pipeline.process(id).await {
            Ok(ProcessOutcome::Completed { translations, audio }) => {
                println!("  completed: {} translations, {} audio files", translations, audio);
            }
            Ok(ProcessOutcome::NotFound) => {
                println!("  not found");
                failures += 1;
            }
            Ok(ProcessOutcome::Deleted) => println!("  deleted while processing"),
            Ok(ProcessOutcome::Superseded) => println!("  resubmitted while processing"),
            Err(e) => {
                println!("  failed: {}", e);
                failures += 1;
            }
        }
    }

    db_pool.close().await;

    if failures > 0 {
        anyhow::bail!("{} announcement(s) could not be processed", failures);
    }
    Ok(())
}
