use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{DisplayBoard, SnapshotEntry},
    error::{AppError, Result},
};

#[derive(Debug, Serialize)]
pub struct BoardView {
    pub board: DisplayBoard,
    pub announcements: Vec<SnapshotEntry>,
}

pub async fn current(State(state): State<AppState>) -> Result<Json<Vec<SnapshotEntry>>> {
    let snapshot = state.service_context.display_service.snapshot().await?;
    Ok(Json(snapshot))
}

pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<DisplayBoard>>> {
    let boards = state.service_context.display_service.boards().await?;
    Ok(Json(boards))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardView>> {
    let display = &state.service_context.display_service;
    let board = display
        .board(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Display board not found".to_string()))?;

    Ok(Json(BoardView {
        board,
        announcements: display.snapshot().await?,
    }))
}

/// The first active board, or a freshly created default one.
pub async fn default_board(State(state): State<AppState>) -> Result<Json<BoardView>> {
    let display = &state.service_context.display_service;
    let board = display.default_board().await?;

    Ok(Json(BoardView {
        board,
        announcements: display.snapshot().await?,
    }))
}
