//! HTTP API under `/api/v1`.

pub mod error;
pub mod events;
pub mod flashcards;
pub mod health;
pub mod learn;
pub mod source_texts;

use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::db::{self, LogOnError};
use crate::domain::{EventLog, EventType};
use crate::state::AppState;

pub use error::ApiError;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route(
            "/flashcards",
            get(flashcards::list_flashcards).post(flashcards::create_flashcards),
        )
        .route(
            "/flashcards/{id}",
            get(flashcards::get_flashcard)
                .patch(flashcards::update_flashcard)
                .delete(flashcards::delete_flashcard),
        )
        .route(
            "/source-texts",
            get(source_texts::list_source_texts).post(source_texts::create_source_text),
        )
        .route(
            "/source-texts/{id}",
            get(source_texts::get_source_text).delete(source_texts::delete_source_text),
        )
        .route("/learn/due", get(learn::due_flashcards))
        .route("/learn/review", post(learn::submit_review))
        .route("/event-logs", get(events::list_event_logs));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Raw paging parameters, validated by the handler
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct ListMeta<M: Serialize = ()> {
    pub pagination: Pagination,
    #[serde(flatten)]
    pub extra: M,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize, M: Serialize = ()> {
    pub data: Vec<T>,
    pub meta: ListMeta<M>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, per_page: u32) -> Self {
        Self::with_extra(data, total, page, per_page, ())
    }
}

impl<T: Serialize, M: Serialize> ListResponse<T, M> {
    pub fn with_extra(data: Vec<T>, total: i64, page: u32, per_page: u32, extra: M) -> Self {
        Self {
            data,
            meta: ListMeta {
                pagination: Pagination { total, page, per_page },
                extra,
            },
        }
    }
}

/// Write an audit event; failures are logged and never fail the request
pub(crate) fn record_event(conn: &Connection, user_id: &str, event_type: EventType, payload: serde_json::Value) {
    db::insert_event(conn, &EventLog::info(user_id, event_type, payload)).log_warn("Failed to record event");
}
