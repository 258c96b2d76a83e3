#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use railannounce::{
    config::Settings,
    domain::Language,
    error::{AppError, Result},
    queue::{TaskQueue, TaskReceiver},
    service::{
        language_detector::LanguageDetector,
        synthesizer::{SpeechEngine, SpeechSynthesizer},
        translator::{TranslationBackend, Translator},
        ServiceContext,
    },
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Single connection so every query sees the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

/// Translates to `"[<code>] <text>"`, failing for the listed languages.
pub struct TaggingBackend {
    pub fail_for: Vec<Language>,
}

#[async_trait]
impl TranslationBackend for TaggingBackend {
    fn name(&self) -> &str {
        "tagging"
    }

    async fn translate(&self, text: &str, _source: Option<Language>, target: Language) -> Result<String> {
        if self.fail_for.contains(&target) {
            return Err(AppError::External(format!("no model for {}", target)));
        }
        Ok(format!("[{}] {}", target.code(), text))
    }
}

/// Writes a quarter second of silence as a 16 kHz mono WAV.
pub struct SilenceEngine;

#[async_trait]
impl SpeechEngine for SilenceEngine {
    fn name(&self) -> &str {
        "silence"
    }

    fn supports(&self, _language: Language) -> bool {
        true
    }

    async fn synthesize(&self, _text: &str, _language: Language, destination: &Path) -> Result<()> {
        write_silence(destination).map_err(|e| AppError::External(e.to_string()))
    }
}

pub fn write_silence(path: &Path) -> std::result::Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for _ in 0..4_000 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()
}

pub struct Harness {
    pub ctx: Arc<ServiceContext>,
    pub settings: Settings,
    pub pool: SqlitePool,
    pub media_dir: TempDir,
    pub receiver: Option<TaskReceiver>,
}

pub struct Backends {
    pub translator: Translator,
    pub engines: Vec<Arc<dyn SpeechEngine>>,
}

impl Backends {
    /// Every backend works.
    pub fn working() -> Self {
        Self {
            translator: Translator::new(Some(Arc::new(TaggingBackend { fail_for: Vec::new() }))),
            engines: vec![Arc::new(SilenceEngine)],
        }
    }

    /// No translator and no speech engine configured.
    pub fn unavailable() -> Self {
        Self {
            translator: Translator::unavailable(),
            engines: Vec::new(),
        }
    }
}

pub async fn harness(backends: Backends) -> anyhow::Result<Harness> {
    let pool = test_pool().await?;
    let media_dir = tempfile::tempdir()?;

    let mut settings = Settings::default();
    settings.media.root = media_dir.path().to_string_lossy().into_owned();
    settings.auth.admin_token = Some(ADMIN_TOKEN.to_string());

    let (queue, receiver) = TaskQueue::new(settings.queue.capacity);

    let ctx = Arc::new(ServiceContext::new(
        &settings,
        pool.clone(),
        Arc::new(LanguageDetector::default()),
        Arc::new(backends.translator),
        Arc::new(SpeechSynthesizer::new(backends.engines)),
        queue,
    ));

    Ok(Harness {
        ctx,
        settings,
        pool,
        media_dir,
        receiver: Some(receiver),
    })
}

pub async fn count(pool: &SqlitePool, table: &str) -> anyhow::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let (n,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
    Ok(n)
}
