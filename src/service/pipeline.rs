use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use uuid::Uuid;

use crate::{
    domain::{
        Announcement, AnnouncementStatus, Language, Translation, TranslationService,
        UpsertAudio, UpsertTranslation,
    },
    error::Result,
    media::MediaStore,
    repository::{AnnouncementRepository, AudioRepository, TranslationRepository},
};

use super::{
    language_detector::LanguageDetector,
    synthesizer::{SpeechSynthesizer, SynthesisOutcome},
    translator::Translator,
};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed { translations: usize, audio: usize },
    /// The id was unknown when the run started. Not retryable.
    NotFound,
    /// The announcement was deleted while the run was in flight.
    Deleted,
    /// The announcement was resubmitted while the run was in flight; the
    /// queued run owns it now.
    Superseded,
}

enum AudioStep {
    Stored,
    Skipped,
    Deleted,
}

/// Turns one announcement into its translations and audio.
///
/// Every write is keyed by (announcement, language), so running the pipeline
/// again for the same id overwrites rather than duplicates. Retry policy lives
/// in the task queue.
pub struct ProcessingPipeline {
    announcements: Arc<dyn AnnouncementRepository>,
    translations: Arc<dyn TranslationRepository>,
    audio: Arc<dyn AudioRepository>,
    detector: Arc<LanguageDetector>,
    translator: Arc<Translator>,
    synthesizer: Arc<SpeechSynthesizer>,
    media: MediaStore,
    concurrency: usize,
}

impl ProcessingPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        announcements: Arc<dyn AnnouncementRepository>,
        translations: Arc<dyn TranslationRepository>,
        audio: Arc<dyn AudioRepository>,
        detector: Arc<LanguageDetector>,
        translator: Arc<Translator>,
        synthesizer: Arc<SpeechSynthesizer>,
        media: MediaStore,
        concurrency: usize,
    ) -> Self {
        Self {
            announcements,
            translations,
            audio,
            detector,
            translator,
            synthesizer,
            media,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs the pipeline for `id`.
    ///
    /// An `Err` means the run itself broke; the announcement has already been
    /// marked `failed` with the error message and the caller may retry.
    pub async fn process(&self, id: Uuid) -> Result<ProcessOutcome> {
        let Some(announcement) = self.announcements.find_by_id(id).await? else {
            tracing::error!("Announcement {} not found", id);
            return Ok(ProcessOutcome::NotFound);
        };

        match self.run(announcement).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("Error processing announcement {}: {}", id, e);
                match self
                    .announcements
                    .update_status(id, AnnouncementStatus::Failed, Some(e.to_string()))
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => tracing::debug!("Announcement {} gone or already completed, not marked failed", id),
                    Err(mark_err) => {
                        tracing::error!("Could not mark announcement {} failed: {}", id, mark_err)
                    }
                }
                Err(e)
            }
        }
    }

    async fn run(&self, mut announcement: Announcement) -> Result<ProcessOutcome> {
        let id = announcement.id;

        if !self
            .announcements
            .update_status(id, AnnouncementStatus::Processing, None)
            .await?
        {
            return Ok(self.deleted(id));
        }
        announcement.status = AnnouncementStatus::Processing;

        // A stored default may just mean nobody declared a language
        if announcement.detected_language == Language::DEFAULT {
            let detected = self.detector.detect(&announcement.text);
            if detected != announcement.detected_language
                && !self.announcements.set_detected_language(id, detected).await?
            {
                return Ok(self.deleted(id));
            }
            announcement.detected_language = detected;
            tracing::info!("Detected language: {} for announcement {}", detected, id);
        }

        let source = announcement.detected_language;
        let targets = Language::translation_targets(source);

        let translated = self
            .translator
            .translate_many(&announcement.text, Some(source), &targets)
            .await;

        let mut stored: HashMap<Language, Translation> = HashMap::new();
        for target in &targets {
            let upsert = self.translation_for(&announcement, *target, translated.get(target));
            match self.translations.upsert(upsert).await? {
                Some(translation) => {
                    tracing::debug!(
                        "Stored {} translation for announcement {} ({})",
                        target,
                        id,
                        translation.service.as_str()
                    );
                    stored.insert(*target, translation);
                }
                None => return Ok(self.deleted(id)),
            }
        }

        let languages = Language::audio_languages(source, &targets);
        let steps: Vec<Result<AudioStep>> = stream::iter(languages)
            .map(|language| self.synthesize_language(&announcement, language, stored.get(&language)))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut audio = 0;
        for step in steps {
            match step? {
                AudioStep::Stored => audio += 1,
                AudioStep::Skipped => {}
                AudioStep::Deleted => return Ok(self.deleted(id)),
            }
        }

        // Partial translation or audio is still a completed run
        if !self
            .announcements
            .update_status(id, AnnouncementStatus::Completed, None)
            .await?
        {
            if self.announcements.find_by_id(id).await?.is_none() {
                return Ok(self.deleted(id));
            }
            tracing::info!("Announcement {} was resubmitted during processing", id);
            return Ok(ProcessOutcome::Superseded);
        }

        tracing::info!(
            "Successfully processed announcement {}: {} translations, {} audio files",
            id,
            stored.len(),
            audio
        );

        Ok(ProcessOutcome::Completed {
            translations: stored.len(),
            audio,
        })
    }

    fn translation_for(
        &self,
        announcement: &Announcement,
        target: Language,
        translated: Option<&String>,
    ) -> UpsertTranslation {
        let (translated_text, service) = match translated {
            Some(text) if !text.trim().is_empty() => {
                let service = if self.translator.is_available()
                    && target != announcement.detected_language
                    && text != &announcement.text
                {
                    TranslationService::Gemini
                } else {
                    TranslationService::Fallback
                };
                (text.clone(), service)
            }
            _ => {
                tracing::warn!(
                    "Empty {} translation for announcement {}, using original text",
                    target,
                    announcement.id
                );
                (announcement.text.clone(), TranslationService::Fallback)
            }
        };

        UpsertTranslation {
            announcement_id: announcement.id,
            language: target,
            translated_text,
            service,
        }
    }

    /// Synthesizes and records audio for one language. Engine failures are a skip.
    async fn synthesize_language(
        &self,
        announcement: &Announcement,
        language: Language,
        translation: Option<&Translation>,
    ) -> Result<AudioStep> {
        let text = translation
            .map(|t| t.translated_text.as_str())
            .unwrap_or(&announcement.text);

        let locator = MediaStore::audio_locator(announcement.id, language, announcement.created_at);
        let path = match self.media.prepare(&locator).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping {} audio for {}: {}", language, announcement.id, e);
                return Ok(AudioStep::Skipped);
            }
        };

        let engine = match self.synthesizer.synthesize(text, language, &path).await {
            SynthesisOutcome::Generated { engine } => engine,
            SynthesisOutcome::Failed => {
                tracing::warn!(
                    "Failed to generate audio for {} - TTS service may not be available",
                    language
                );
                return Ok(AudioStep::Skipped);
            }
        };

        let duration_seconds = SpeechSynthesizer::duration(&path).await;

        let upsert = UpsertAudio {
            announcement_id: announcement.id,
            translation_id: translation.map(|t| t.id),
            language,
            locator: locator.clone(),
            duration_seconds,
            engine,
        };

        match self.audio.upsert(upsert).await? {
            Some(stored) => {
                if let Some(previous) = stored.replaced_locator {
                    self.media.remove(&previous).await;
                }
                Ok(AudioStep::Stored)
            }
            None => {
                // Nothing references the file any more
                self.media.remove(&locator).await;
                Ok(AudioStep::Deleted)
            }
        }
    }

    fn deleted(&self, id: Uuid) -> ProcessOutcome {
        tracing::info!("Announcement {} was deleted during processing", id);
        ProcessOutcome::Deleted
    }
}
