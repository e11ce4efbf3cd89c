//! Event log listing.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::db::{self, EventQuery, EventSummary};
use crate::domain::{EventLog, EventSeverity, EventType};
use crate::state::AppState;
use crate::validation::{parse_choice, parse_pagination};

use super::{ApiError, ListResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub event_type: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryMeta {
    pub summary: EventSummary,
}

/// GET /api/v1/event-logs
pub async fn list_event_logs(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<EventLogParams>,
) -> Result<Json<ListResponse<EventLog, SummaryMeta>>, ApiError> {
    let (page, per_page) = parse_pagination(params.page.as_deref(), params.per_page.as_deref())?;
    let query = EventQuery {
        page,
        per_page,
        event_type: parse_choice("eventType", params.event_type.as_deref(), EventType::from_str)?,
        severity: parse_choice("severity", params.severity.as_deref(), EventSeverity::from_str)?,
    };

    let conn = db::try_lock(&state.db)?;
    let (events, total) = db::list_events(&conn, &user.user_id, &query)?;
    let summary = db::get_event_summary(&conn, &user.user_id)?;

    Ok(Json(ListResponse::with_extra(
        events,
        total,
        page,
        per_page,
        SummaryMeta { summary },
    )))
}

#[cfg(test)]
mod tests {
    use crate::testing::TestEnv;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_card_actions_are_logged() {
        let env = TestEnv::new().unwrap();
        let server = env.server();

        let created: Value = server
            .post("/api/v1/flashcards")
            .add_header(TestEnv::user_header(), TestEnv::user_value("alice"))
            .json(&json!({"mode": "manual", "front": "hola", "back": "hello"}))
            .await
            .json();
        server
            .patch(&format!("/api/v1/flashcards/{}", created["id"]))
            .add_header(TestEnv::user_header(), TestEnv::user_value("alice"))
            .json(&json!({"front": "buenas"}))
            .await
            .assert_status_ok();

        let body: Value = server
            .get("/api/v1/event-logs")
            .add_header(TestEnv::user_header(), TestEnv::user_value("alice"))
            .await
            .json();

        assert_eq!(body["meta"]["pagination"]["total"], 2);
        assert_eq!(body["data"][0]["eventType"], "cardEdited");
        assert_eq!(body["meta"]["summary"]["byType"]["manualCardCreated"], 1);
        assert_eq!(body["meta"]["summary"]["bySeverity"]["info"], 2);

        let filtered: Value = server
            .get("/api/v1/event-logs?eventType=manualCardCreated")
            .add_header(TestEnv::user_header(), TestEnv::user_value("alice"))
            .await
            .json();
        assert_eq!(filtered["meta"]["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn test_rejects_unknown_filters() {
        let env = TestEnv::new().unwrap();
        let server = env.server();

        for query in ["eventType=cardExploded", "severity=loud"] {
            server
                .get(&format!("/api/v1/event-logs?{}", query))
                .add_header(TestEnv::user_header(), TestEnv::user_value("alice"))
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }
}
