mod common;

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use common::{count, harness, Backends, TaggingBackend};
use railannounce::{
    domain::{AnnouncementStatus, CreateAnnouncementRequest, Language, TranslationService},
    error::{AppError, Result},
    repository::AnnouncementRepository,
    service::{
        pipeline::ProcessOutcome,
        translator::{TranslationBackend, Translator},
    },
};
use uuid::Uuid;

/// Puts the announcement back to pending every time it is asked to translate.
struct ResubmittingBackend {
    target: Arc<OnceLock<(Arc<dyn AnnouncementRepository>, Uuid)>>,
}

#[async_trait]
impl TranslationBackend for ResubmittingBackend {
    fn name(&self) -> &str {
        "resubmitting"
    }

    async fn translate(&self, text: &str, _source: Option<Language>, target: Language) -> Result<String> {
        if let Some((repo, id)) = self.target.get() {
            repo.resubmit(*id).await?;
        }
        Ok(format!("[{}] {}", target.code(), text))
    }
}

fn request(text: &str) -> CreateAnnouncementRequest {
    CreateAnnouncementRequest {
        text: text.to_string(),
        priority: None,
        language: None,
        is_active: None,
    }
}

#[tokio::test]
async fn test_english_announcement_is_translated_into_base_targets() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    assert_eq!(created.status, AnnouncementStatus::Pending);

    let outcome = ctx.pipeline.process(created.id).await?;
    assert_eq!(outcome, ProcessOutcome::Completed { translations: 5, audio: 6 });

    let announcement = ctx.announcement_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(announcement.detected_language, Language::English);
    assert_eq!(announcement.status, AnnouncementStatus::Completed);
    assert!(announcement.error_message.is_none());

    let translations = ctx.translation_repo.list_for_announcement(created.id).await?;
    let languages: HashSet<Language> = translations.iter().map(|t| t.language).collect();
    assert_eq!(languages, Language::BASE_TARGETS.into_iter().collect());
    assert!(translations.iter().all(|t| !t.translated_text.is_empty()));
    assert!(translations.iter().all(|t| t.service == TranslationService::Gemini));

    let hindi = ctx.translation_repo.find(created.id, Language::Hindi).await?.unwrap();
    assert_eq!(hindi.translated_text, "[hi] Train 12301 delayed");

    let audio = ctx.audio_repo.list_for_announcement(created.id).await?;
    assert_eq!(audio.len(), 6);
    for artifact in &audio {
        assert_eq!(artifact.engine, "silence");
        assert!(artifact.locator.starts_with("audio/"));
        assert!(artifact.locator.ends_with(&format!("_{}.wav", artifact.language.code())));
        assert!(h.media_dir.path().join(&artifact.locator).is_file());
        let duration = artifact.duration_seconds.unwrap();
        assert!((duration - 0.25).abs() < 1e-6);
        // Source language audio has no translation row to point at
        assert_eq!(artifact.translation_id.is_some(), artifact.language != Language::English);
    }

    Ok(())
}

#[tokio::test]
async fn test_hindi_announcement_gets_english_target_too() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let text = "ट्रेन 12301 विलंबित है";
    let created = ctx.announcement_service.submit(request(text)).await?;
    ctx.pipeline.process(created.id).await?;

    let announcement = ctx.announcement_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(announcement.detected_language, Language::Hindi);
    assert_eq!(announcement.status, AnnouncementStatus::Completed);

    let translations = ctx.translation_repo.list_for_announcement(created.id).await?;
    assert_eq!(translations.len(), 6);

    // Translating into the source language is a no-op
    let hindi = ctx.translation_repo.find(created.id, Language::Hindi).await?.unwrap();
    assert_eq!(hindi.translated_text, text);
    assert_eq!(hindi.service, TranslationService::Fallback);

    let english = ctx.translation_repo.find(created.id, Language::English).await?.unwrap();
    assert_eq!(english.translated_text, format!("[en] {}", text));
    assert_eq!(english.service, TranslationService::Gemini);

    assert_eq!(ctx.audio_repo.list_for_announcement(created.id).await?.len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_everything_failing_still_completes_with_fallbacks() -> anyhow::Result<()> {
    let h = harness(Backends::unavailable()).await?;
    let ctx = &h.ctx;

    let text = "Platform 4 changed to platform 6";
    let created = ctx.announcement_service.submit(request(text)).await?;
    let outcome = ctx.pipeline.process(created.id).await?;
    assert_eq!(outcome, ProcessOutcome::Completed { translations: 5, audio: 0 });

    let announcement = ctx.announcement_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(announcement.status, AnnouncementStatus::Completed);

    let translations = ctx.translation_repo.list_for_announcement(created.id).await?;
    assert_eq!(translations.len(), 5);
    for translation in &translations {
        assert_eq!(translation.translated_text, text);
        assert_eq!(translation.service, TranslationService::Fallback);
    }

    assert_eq!(count(&h.pool, "audio_files").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_one_failing_language_does_not_affect_others() -> anyhow::Result<()> {
    let backends = Backends {
        translator: Translator::new(Some(Arc::new(TaggingBackend {
            fail_for: vec![Language::Tamil],
        }))),
        ..Backends::working()
    };
    let h = harness(backends).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    ctx.pipeline.process(created.id).await?;

    let tamil = ctx.translation_repo.find(created.id, Language::Tamil).await?.unwrap();
    assert_eq!(tamil.translated_text, "Train 12301 delayed");
    assert_eq!(tamil.service, TranslationService::Fallback);

    let telugu = ctx.translation_repo.find(created.id, Language::Telugu).await?.unwrap();
    assert_eq!(telugu.service, TranslationService::Gemini);
    Ok(())
}

#[tokio::test]
async fn test_rerunning_never_duplicates_rows() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    ctx.pipeline.process(created.id).await?;
    let first_audio = ctx.audio_repo.list_for_announcement(created.id).await?;

    ctx.pipeline.process(created.id).await?;
    ctx.announcement_service.reprocess(created.id).await?;
    ctx.pipeline.process(created.id).await?;

    assert_eq!(count(&h.pool, "translations").await?, 5);
    assert_eq!(count(&h.pool, "audio_files").await?, 6);

    // Same locators, so the files on disk are overwritten in place
    let second_audio = ctx.audio_repo.list_for_announcement(created.id).await?;
    let first: HashSet<_> = first_audio.iter().map(|a| (a.id, a.locator.clone())).collect();
    let second: HashSet<_> = second_audio.iter().map(|a| (a.id, a.locator.clone())).collect();
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_blank_text_is_rejected_before_anything_is_stored() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;

    let err = h.ctx.announcement_service.submit(request("   ")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(count(&h.pool, "announcements").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_not_found() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    assert_eq!(h.ctx.pipeline.process(Uuid::new_v4()).await?, ProcessOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_and_removes_audio_files() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    ctx.pipeline.process(created.id).await?;
    let audio = ctx.audio_repo.list_for_announcement(created.id).await?;
    assert!(!audio.is_empty());

    assert!(ctx.announcement_service.delete(created.id).await?);

    assert_eq!(count(&h.pool, "announcements").await?, 0);
    assert_eq!(count(&h.pool, "translations").await?, 0);
    assert_eq!(count(&h.pool, "audio_files").await?, 0);
    for artifact in &audio {
        assert!(!h.media_dir.path().join(&artifact.locator).exists());
    }

    assert!(!ctx.announcement_service.delete(created.id).await?);
    assert_eq!(ctx.pipeline.process(created.id).await?, ProcessOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_delete_removes_audio_stored_outside_a_pipeline_run() -> anyhow::Result<()> {
    use railannounce::domain::UpsertAudio;

    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;

    // Audio that lands just before the delete, with no earlier listing
    let locator = "audio/late_hi.wav".to_string();
    let path = ctx.media.prepare(&locator).await?;
    common::write_silence(&path)?;
    ctx.audio_repo
        .upsert(UpsertAudio {
            announcement_id: created.id,
            translation_id: None,
            language: Language::Hindi,
            locator: locator.clone(),
            duration_seconds: None,
            engine: "silence".to_string(),
        })
        .await?
        .unwrap();

    let removed = ctx.announcement_repo.delete(created.id).await?.unwrap();
    assert_eq!(removed, vec![locator]);
    assert_eq!(count(&h.pool, "audio_files").await?, 0);
    assert!(ctx.announcement_repo.delete(created.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_announcement_service_delete_removes_late_audio_file() -> anyhow::Result<()> {
    use railannounce::domain::UpsertAudio;

    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    let locator = "audio/late_ta.wav".to_string();
    let path = ctx.media.prepare(&locator).await?;
    common::write_silence(&path)?;
    ctx.audio_repo
        .upsert(UpsertAudio {
            announcement_id: created.id,
            translation_id: None,
            language: Language::Tamil,
            locator,
            duration_seconds: None,
            engine: "silence".to_string(),
        })
        .await?
        .unwrap();

    assert!(ctx.announcement_service.delete(created.id).await?);
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn test_writes_after_deletion_are_no_ops() -> anyhow::Result<()> {
    use railannounce::domain::{UpsertAudio, UpsertTranslation};

    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    ctx.announcement_service.delete(created.id).await?;

    let translation = ctx
        .translation_repo
        .upsert(UpsertTranslation {
            announcement_id: created.id,
            language: Language::Hindi,
            translated_text: "late".to_string(),
            service: TranslationService::Fallback,
        })
        .await?;
    assert!(translation.is_none());

    let audio = ctx
        .audio_repo
        .upsert(UpsertAudio {
            announcement_id: created.id,
            translation_id: None,
            language: Language::Hindi,
            locator: "audio/x.wav".to_string(),
            duration_seconds: None,
            engine: "silence".to_string(),
        })
        .await?;
    assert!(audio.is_none());

    assert!(!ctx
        .announcement_repo
        .update_status(created.id, AnnouncementStatus::Completed, None)
        .await?);
    assert_eq!(count(&h.pool, "translations").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_broken_run_marks_announcement_failed() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;

    // Make every translation and audio write fail
    sqlx::query("DROP TABLE audio_files").execute(&h.pool).await?;
    sqlx::query("DROP TABLE translations").execute(&h.pool).await?;

    assert!(ctx.pipeline.process(created.id).await.is_err());

    let announcement = ctx.announcement_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(announcement.status, AnnouncementStatus::Failed);
    let message = announcement.error_message.unwrap();
    assert!(message.contains("translations"), "unexpected error: {}", message);

    // Failed announcements are never shown on boards
    assert!(ctx.display_service.snapshot().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_status_only_moves_forward() -> anyhow::Result<()> {
    let h = harness(Backends::working()).await?;
    let repo = &h.ctx.announcement_repo;

    let created = h.ctx.announcement_service.submit(request("Train 12301 delayed")).await?;

    // pending -> completed skips processing
    assert!(!repo.update_status(created.id, AnnouncementStatus::Completed, None).await?);
    assert!(!repo.update_status(created.id, AnnouncementStatus::Pending, None).await?);
    let stored = repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(stored.status, AnnouncementStatus::Pending);

    h.ctx.pipeline.process(created.id).await?;

    // completed -> failed would hide a finished announcement
    assert!(!repo
        .update_status(created.id, AnnouncementStatus::Failed, Some("late".to_string()))
        .await?);
    let stored = repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(stored.status, AnnouncementStatus::Completed);
    assert!(stored.error_message.is_none());

    // A completed announcement can always be run again
    assert!(repo.update_status(created.id, AnnouncementStatus::Processing, None).await?);
    Ok(())
}

#[tokio::test]
async fn test_resubmitted_during_run_is_not_marked_completed() -> anyhow::Result<()> {
    let target = Arc::new(OnceLock::new());
    let backends = Backends {
        translator: Translator::new(Some(Arc::new(ResubmittingBackend {
            target: target.clone(),
        }))),
        ..Backends::working()
    };
    let h = harness(backends).await?;
    let ctx = &h.ctx;

    let created = ctx.announcement_service.submit(request("Train 12301 delayed")).await?;
    let _ = target.set((ctx.announcement_repo.clone(), created.id));

    assert_eq!(ctx.pipeline.process(created.id).await?, ProcessOutcome::Superseded);

    let stored = ctx.announcement_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(stored.status, AnnouncementStatus::Pending);
    Ok(())
}
