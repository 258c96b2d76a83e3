use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{
        Announcement, AnnouncementStatus, AudioArtifact, CreateAnnouncementRequest,
        StatusPayload, Translation,
    },
    error::{AppError, Result},
};

#[derive(Debug, Serialize)]
pub struct CreateAnnouncementResponse {
    pub id: Uuid,
    pub status: AnnouncementStatus,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAnnouncementsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    #[serde(flatten)]
    pub artifact: AudioArtifact,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementDetail {
    pub announcement: Announcement,
    pub translations: Vec<Translation>,
    pub audio: Vec<AudioResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    pub delay_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessPendingQuery {
    pub include_failed: Option<bool>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<CreateAnnouncementResponse>)> {
    let announcement = state
        .service_context
        .announcement_service
        .submit(request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAnnouncementResponse {
            id: announcement.id,
            status: announcement.status,
            message: "Announcement created and is being processed".to_string(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListAnnouncementsQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let announcements = state
        .service_context
        .announcement_service
        .list(params.limit, params.offset)
        .await?;
    Ok(Json(announcements))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnnouncementDetail>> {
    let ctx = &state.service_context;
    let bundle = ctx.announcement_service.get_bundle(id).await?;

    let audio = bundle
        .audio
        .into_iter()
        .map(|artifact| AudioResponse {
            url: ctx.media.url(&artifact.locator),
            artifact,
        })
        .collect();

    Ok(Json(AnnouncementDetail {
        announcement: bundle.announcement,
        translations: bundle.translations,
        audio,
    }))
}

pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusPayload>> {
    let payload = state.service_context.announcement_service.status(id).await?;
    Ok(Json(payload))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.service_context.announcement_service.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Announcement not found".to_string()))
    }
}

pub async fn reprocess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    state.service_context.announcement_service.reprocess(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": id,
            "status": AnnouncementStatus::Pending,
            "message": "Announcement queued for reprocessing"
        })),
    ))
}

/// Marks an announcement as dealt with; it is deleted after the delay.
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ResolveRequest>>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let delay = state
        .service_context
        .announcement_service
        .schedule_delete(id, request.delay_seconds.map(Duration::from_secs))
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": id,
            "delete_in_seconds": delay.as_secs(),
        })),
    ))
}

pub async fn process_pending(
    State(state): State<AppState>,
    Query(params): Query<ProcessPendingQuery>,
) -> Result<Json<serde_json::Value>> {
    let ids = state
        .service_context
        .announcement_service
        .process_pending(params.include_failed.unwrap_or(false))
        .await?;

    Ok(Json(serde_json::json!({
        "queued": ids.len(),
        "ids": ids,
    })))
}
