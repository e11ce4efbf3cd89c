//! Flashcard CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::CurrentUser;
use crate::db::{self, FlashcardQuery, SortField, SortOrder};
use crate::domain::{EventType, Flashcard, FlashcardSource};
use crate::state::AppState;
use crate::validation::{parse_choice, parse_pagination, validate_back, validate_front, validate_text_content};

use super::{record_event, ApiError, ListResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub source: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl FlashcardListParams {
    fn into_query(self) -> Result<FlashcardQuery, ApiError> {
        let (page, per_page) = parse_pagination(self.page.as_deref(), self.per_page.as_deref())?;
        Ok(FlashcardQuery {
            page,
            per_page,
            source: parse_choice("source", self.source.as_deref(), FlashcardSource::from_str)?,
            sort: parse_choice("sort", self.sort.as_deref(), SortField::from_str)?.unwrap_or_default(),
            order: parse_choice("order", self.order.as_deref(), SortOrder::from_str)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CreateFlashcardRequest {
    Manual {
        front: String,
        back: String,
        #[serde(default)]
        source_text_id: Option<i64>,
    },
    Ai {
        text_content: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMeta {
    pub source_text_id: i64,
    pub generated_count: usize,
    pub mode: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GeneratedResponse {
    pub data: Vec<Flashcard>,
    pub meta: GeneratedMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFlashcardRequest {
    pub front: Option<String>,
    pub back: Option<String>,
}

/// GET /api/v1/flashcards
pub async fn list_flashcards(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<FlashcardListParams>,
) -> Result<Json<ListResponse<Flashcard>>, ApiError> {
    let query = params.into_query()?;
    let conn = db::try_lock(&state.db)?;
    let (cards, total) = db::list_flashcards(&conn, &user.user_id, &query)?;
    Ok(Json(ListResponse::new(cards, total, query.page, query.per_page)))
}

/// POST /api/v1/flashcards
pub async fn create_flashcards(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<CreateFlashcardRequest>,
) -> Result<Response, ApiError> {
    match request {
        CreateFlashcardRequest::Manual {
            front,
            back,
            source_text_id,
        } => create_manual(&user, &state, front, back, source_text_id),
        CreateFlashcardRequest::Ai { text_content } => create_generated(&user, &state, text_content),
    }
}

fn create_manual(
    user: &CurrentUser,
    state: &AppState,
    front: String,
    back: String,
    source_text_id: Option<i64>,
) -> Result<Response, ApiError> {
    validate_front(&front)?;
    validate_back(&back)?;

    let conn = db::try_lock(&state.db)?;
    if let Some(text_id) = source_text_id {
        if db::get_source_text(&conn, &user.user_id, text_id)?.is_none() {
            return Err(ApiError::not_found("Source text not found"));
        }
    }

    let mut card = Flashcard::new(&user.user_id, front, back, FlashcardSource::Manual, source_text_id, Utc::now());
    card.id = db::insert_flashcard(&conn, &card)?;
    record_event(&conn, &user.user_id, EventType::ManualCardCreated, json!({ "flashcardId": card.id }));

    tracing::info!(user = %user.user_id, flashcard_id = card.id, "Created manual flashcard");
    Ok((StatusCode::CREATED, Json(card)).into_response())
}

fn create_generated(user: &CurrentUser, state: &AppState, text_content: String) -> Result<Response, ApiError> {
    validate_text_content(&text_content)?;

    // Generate before taking the lock
    let candidates = state.generator.generate(&text_content)?;

    let conn = db::try_lock(&state.db)?;
    let now = Utc::now();
    let cards = candidates
        .into_iter()
        .map(|c| Flashcard::new(&user.user_id, c.front, c.back, FlashcardSource::Ai, None, now))
        .collect();
    let (source_text, cards) = db::insert_source_text_with_flashcards(&conn, &user.user_id, &text_content, cards, now)?;

    for card in &cards {
        record_event(
            &conn,
            &user.user_id,
            EventType::AiCardCreated,
            json!({ "flashcardId": card.id, "sourceTextId": source_text.id }),
        );
    }

    tracing::info!(
        user = %user.user_id,
        source_text_id = source_text.id,
        count = cards.len(),
        "Generated flashcards"
    );
    let response = GeneratedResponse {
        meta: GeneratedMeta {
            source_text_id: source_text.id,
            generated_count: cards.len(),
            mode: "ai",
        },
        data: cards,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /api/v1/flashcards/{id}
pub async fn get_flashcard(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Flashcard>, ApiError> {
    let conn = db::try_lock(&state.db)?;
    db::get_flashcard(&conn, &user.user_id, id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Flashcard not found"))
}

/// PATCH /api/v1/flashcards/{id}
pub async fn update_flashcard(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateFlashcardRequest>,
) -> Result<Json<Flashcard>, ApiError> {
    if request.front.is_none() && request.back.is_none() {
        return Err(ApiError::bad_request("At least one field (front or back) must be provided"));
    }
    if let Some(front) = &request.front {
        validate_front(front)?;
    }
    if let Some(back) = &request.back {
        validate_back(back)?;
    }

    let conn = db::try_lock(&state.db)?;
    let mut card = db::get_flashcard(&conn, &user.user_id, id)?
        .ok_or_else(|| ApiError::not_found("Flashcard not found"))?;

    let previous_source = card.source;
    if let Some(front) = request.front {
        card.front = front;
    }
    if let Some(back) = request.back {
        card.back = back;
    }
    card.source = previous_source.after_edit();
    card.updated_at = Utc::now();

    if !db::update_flashcard_text(&conn, &card)? {
        return Err(ApiError::not_found("Flashcard not found"));
    }
    record_event(
        &conn,
        &user.user_id,
        EventType::CardEdited,
        json!({
            "flashcardId": card.id,
            "previousSource": previous_source.as_str(),
            "source": card.source.as_str(),
        }),
    );
    if previous_source == FlashcardSource::Ai {
        record_event(
            &conn,
            &user.user_id,
            EventType::AiEditedCardCreated,
            json!({ "flashcardId": card.id, "sourceTextId": card.source_text_id }),
        );
    }
    Ok(Json(card))
}

/// DELETE /api/v1/flashcards/{id}
pub async fn delete_flashcard(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = db::try_lock(&state.db)?;
    if !db::delete_flashcard(&conn, &user.user_id, id)? {
        return Err(ApiError::not_found("Flashcard not found"));
    }
    record_event(&conn, &user.user_id, EventType::CardDeleted, json!({ "flashcardId": id }));
    Ok(StatusCode::NO_CONTENT)
}
