pub mod language_detector;
pub mod translator;
pub mod synthesizer;
pub mod pipeline;
pub mod bundle;
pub mod notifier;
pub mod display;
pub mod announcement_service;

use std::sync::Arc;
use std::time::Duration;
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::media::MediaStore;
use crate::queue::{AnnouncementTasks, TaskQueue};
use crate::realtime::ChannelLayer;
use crate::repository::*;

use announcement_service::AnnouncementService;
use bundle::BundleLoader;
use display::DisplayService;
use language_detector::LanguageDetector;
use notifier::Notifier;
use pipeline::ProcessingPipeline;
use synthesizer::SpeechSynthesizer;
use translator::Translator;

pub struct ServiceContext {
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub translation_repo: Arc<dyn TranslationRepository>,
    pub audio_repo: Arc<dyn AudioRepository>,
    pub display_board_repo: Arc<dyn DisplayBoardRepository>,
    pub pipeline: Arc<ProcessingPipeline>,
    pub bundles: Arc<BundleLoader>,
    pub notifier: Arc<Notifier>,
    pub display_service: Arc<DisplayService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub channels: Arc<ChannelLayer>,
    pub media: MediaStore,
    pub queue: TaskQueue,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    /// Wires repositories and services around the given backends.
    ///
    /// Detector, translator and synthesizer are built once by the caller and
    /// shared by every worker.
    pub fn new(
        settings: &Settings,
        db_pool: SqlitePool,
        detector: Arc<LanguageDetector>,
        translator: Arc<Translator>,
        synthesizer: Arc<SpeechSynthesizer>,
        queue: TaskQueue,
    ) -> Self {
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
        let translation_repo: Arc<dyn TranslationRepository> =
            Arc::new(SqliteTranslationRepository::new(db_pool.clone()));
        let audio_repo: Arc<dyn AudioRepository> =
            Arc::new(SqliteAudioRepository::new(db_pool.clone()));
        let display_board_repo: Arc<dyn DisplayBoardRepository> =
            Arc::new(SqliteDisplayBoardRepository::new(db_pool.clone()));

        let media = MediaStore::new(&settings.media.root, &settings.media.url_prefix);
        let channels = Arc::new(ChannelLayer::new(settings.display.subscriber_buffer));

        let pipeline = Arc::new(ProcessingPipeline::new(
            announcement_repo.clone(),
            translation_repo.clone(),
            audio_repo.clone(),
            detector,
            translator,
            synthesizer,
            media.clone(),
            settings.tts.concurrency,
        ));

        let bundles = Arc::new(BundleLoader::new(
            announcement_repo.clone(),
            translation_repo.clone(),
            audio_repo.clone(),
            media.clone(),
        ));

        let notifier = Arc::new(Notifier::new(bundles.clone(), channels.clone()));

        let display_service = Arc::new(DisplayService::new(
            announcement_repo.clone(),
            display_board_repo.clone(),
            bundles.clone(),
            settings.display.snapshot_limit,
        ));

        let announcement_service = Arc::new(AnnouncementService::new(
            announcement_repo.clone(),
            bundles.clone(),
            media.clone(),
            queue.clone(),
            settings.display.list_limit,
            Duration::from_secs(settings.queue.resolve_delete_delay_secs),
        ));

        Self {
            announcement_repo,
            translation_repo,
            audio_repo,
            display_board_repo,
            pipeline,
            bundles,
            notifier,
            display_service,
            announcement_service,
            channels,
            media,
            queue,
            db_pool,
        }
    }

    /// Handler the queue workers run tasks with.
    pub fn task_handler(&self) -> Arc<AnnouncementTasks> {
        Arc::new(AnnouncementTasks::new(
            self.pipeline.clone(),
            self.notifier.clone(),
            self.announcement_service.clone(),
            self.queue.clone(),
        ))
    }
}
