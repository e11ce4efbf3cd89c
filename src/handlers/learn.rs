//! Learning session endpoints: the due set and rating a card.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::CurrentUser;
use crate::db::{self, SqliteScheduleStore};
use crate::domain::{CardSchedule, CardState, EventType, Flashcard, Rating, ReviewLog, SessionStats};
use crate::services::apply_review;
use crate::srs::{self, DueIn, KnowledgeLevel};
use crate::state::AppState;

use super::{record_event, ApiError};

/// Display data derived from a schedule
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub progress_percent: u8,
    pub knowledge_level: KnowledgeLevel,
    pub due_in: DueIn,
    pub due_in_text: String,
}

impl ScheduleSummary {
    fn new(schedule: &CardSchedule, now: DateTime<Utc>) -> Self {
        let due_in = srs::time_until_due(schedule, now);
        Self {
            progress_percent: srs::progress_percent(schedule),
            knowledge_level: srs::knowledge_level(schedule),
            due_in,
            due_in_text: due_in.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DueCard {
    #[serde(flatten)]
    pub flashcard: Flashcard,
    #[serde(flatten)]
    pub summary: ScheduleSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueMeta {
    pub total: usize,
    /// Set only when nothing is due
    pub next_due_at: Option<DateTime<Utc>>,
    pub review_stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub data: Vec<DueCard>,
    pub meta: DueMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub flashcard_id: i64,
    pub rating: u8,
    #[serde(default)]
    pub review_duration_seconds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub flashcard_id: i64,
    pub rating: Rating,
    pub previous_state: CardState,
    pub schedule: CardSchedule,
    #[serde(flatten)]
    pub summary: ScheduleSummary,
}

/// GET /api/v1/learn/due
pub async fn due_flashcards(user: CurrentUser, State(state): State<AppState>) -> Result<Json<DueResponse>, ApiError> {
    let now = Utc::now();
    let conn = db::try_lock(&state.db)?;

    let due = srs::due_set(db::get_due_flashcards(&conn, &user.user_id, now)?, now);
    let next_due_at = if due.is_empty() {
        let schedules = db::get_user_schedules(&conn, &user.user_id)?;
        srs::next_due_at(&schedules, now)
    } else {
        None
    };
    let review_stats = db::get_review_stats(&conn, &user.user_id)?;

    let data: Vec<DueCard> = due
        .into_iter()
        .map(|flashcard| {
            let summary = ScheduleSummary::new(&flashcard.schedule, now);
            DueCard { flashcard, summary }
        })
        .collect();

    Ok(Json(DueResponse {
        meta: DueMeta {
            total: data.len(),
            next_due_at,
            review_stats,
        },
        data,
    }))
}

/// POST /api/v1/learn/review
pub async fn submit_review(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let rating = Rating::try_from(request.rating)
        .map_err(|_| ApiError::bad_request("Rating must be between 1 and 4"))?;
    let now = Utc::now();

    let conn = db::try_lock(&state.db)?;
    let card = db::get_flashcard(&conn, &user.user_id, request.flashcard_id)?
        .ok_or_else(|| ApiError::not_found("Flashcard not found"))?;

    // Schedule update and review log commit together
    let tx = conn.unchecked_transaction()?;
    let outcome = {
        let mut store = SqliteScheduleStore::new(&tx, &user.user_id);
        apply_review(
            &mut store,
            &state.scheduler,
            card.id,
            rating,
            request.review_duration_seconds,
            now,
        )?
    };
    let log = ReviewLog::new(
        card.id,
        &user.user_id,
        rating,
        request.review_duration_seconds,
        &outcome.before,
        &outcome.after,
    );
    db::insert_review_log(&tx, &log)?;
    tx.commit()?;

    if card.source.is_generated() {
        record_event(
            &conn,
            &user.user_id,
            EventType::AiCardReviewed,
            json!({
                "flashcardId": card.id,
                "rating": u8::from(rating),
                "source": card.source.as_str(),
            }),
        );
    }

    tracing::info!(
        user = %user.user_id,
        flashcard_id = card.id,
        rating = rating.as_str(),
        state = outcome.after.state.as_str(),
        "Review recorded"
    );
    Ok(Json(ReviewResponse {
        flashcard_id: card.id,
        rating,
        previous_state: outcome.before.state,
        summary: ScheduleSummary::new(&outcome.after, now),
        schedule: outcome.after,
    }))
}
