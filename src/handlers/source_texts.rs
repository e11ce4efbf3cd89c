//! Source text endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::db;
use crate::domain::{Flashcard, SourceText};
use crate::state::AppState;
use crate::validation::{parse_pagination, validate_text_content};

use super::{ApiError, ListResponse, PageParams};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSourceTextRequest {
    pub text_content: String,
}

#[derive(Debug, Serialize)]
pub struct SourceTextWithFlashcards {
    #[serde(flatten)]
    pub source_text: SourceText,
    pub flashcards: Vec<Flashcard>,
}

/// GET /api/v1/source-texts
pub async fn list_source_texts(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<SourceText>>, ApiError> {
    let (page, per_page) = parse_pagination(params.page.as_deref(), params.per_page.as_deref())?;
    let conn = db::try_lock(&state.db)?;
    let (texts, total) = db::list_source_texts(&conn, &user.user_id, page, per_page)?;
    Ok(Json(ListResponse::new(texts, total, page, per_page)))
}

/// POST /api/v1/source-texts
pub async fn create_source_text(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<CreateSourceTextRequest>,
) -> Result<(StatusCode, Json<SourceText>), ApiError> {
    validate_text_content(&request.text_content)?;
    let conn = db::try_lock(&state.db)?;
    let text = db::insert_source_text(&conn, &user.user_id, &request.text_content, Utc::now())?;
    Ok((StatusCode::CREATED, Json(text)))
}

/// GET /api/v1/source-texts/{id}
pub async fn get_source_text(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SourceTextWithFlashcards>, ApiError> {
    let conn = db::try_lock(&state.db)?;
    let source_text = db::get_source_text(&conn, &user.user_id, id)?
        .ok_or_else(|| ApiError::not_found("Source text not found"))?;
    let flashcards = db::get_flashcards_for_source_text(&conn, &user.user_id, id)?;
    Ok(Json(SourceTextWithFlashcards { source_text, flashcards }))
}

/// DELETE /api/v1/source-texts/{id}
pub async fn delete_source_text(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = db::try_lock(&state.db)?;
    if !db::delete_source_text(&conn, &user.user_id, id)? {
        return Err(ApiError::not_found("Source text not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
