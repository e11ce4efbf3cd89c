//! Event log storage

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Result, Row};
use serde::Serialize;

use crate::domain::{EventLog, EventSeverity, EventType};

use super::flashcards::invalid_text;
use super::{format_ts, parse_ts};

/// Filters for an event log listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub page: u32,
    pub per_page: u32,
    pub event_type: Option<EventType>,
    pub severity: Option<EventSeverity>,
}

/// Event counts keyed by type and by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_severity: BTreeMap<String, i64>,
}

pub fn insert_event(conn: &Connection, event: &EventLog) -> Result<i64> {
    conn.execute(
        "INSERT INTO event_logs (user_id, event_type, timestamp, severity, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.user_id,
            event.event_type.as_str(),
            format_ts(event.timestamp),
            event.severity.as_str(),
            event.payload.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest first, with the unpaged total
pub fn list_events(conn: &Connection, user_id: &str, query: &EventQuery) -> Result<(Vec<EventLog>, i64)> {
    let event_type = query.event_type.map(|t| t.as_str());
    let severity = query.severity.map(|s| s.as_str());

    let total: i64 = conn.query_row(
        r#"
    SELECT COUNT(*) FROM event_logs
    WHERE user_id = ?1 AND (?2 IS NULL OR event_type = ?2) AND (?3 IS NULL OR severity = ?3)
    "#,
        params![user_id, event_type, severity],
        |row| row.get(0),
    )?;

    let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.per_page);
    let mut stmt = conn.prepare(
        r#"
    SELECT id, user_id, event_type, timestamp, severity, payload FROM event_logs
    WHERE user_id = ?1 AND (?2 IS NULL OR event_type = ?2) AND (?3 IS NULL OR severity = ?3)
    ORDER BY timestamp DESC, id DESC
    LIMIT ?4 OFFSET ?5
    "#,
    )?;
    let events = stmt
        .query_map(
            params![user_id, event_type, severity, query.per_page, offset],
            row_to_event,
        )?
        .collect::<Result<Vec<_>>>()?;
    Ok((events, total))
}

pub fn get_event_summary(conn: &Connection, user_id: &str) -> Result<EventSummary> {
    let mut summary = EventSummary::default();

    let mut stmt = conn.prepare(
        "SELECT event_type, COUNT(*) FROM event_logs WHERE user_id = ?1 GROUP BY event_type",
    )?;
    for row in stmt.query_map(params![user_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))? {
        let (event_type, count) = row?;
        summary.total += count;
        summary.by_type.insert(event_type, count);
    }

    let mut stmt = conn.prepare(
        "SELECT severity, COUNT(*) FROM event_logs WHERE user_id = ?1 GROUP BY severity",
    )?;
    for row in stmt.query_map(params![user_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))? {
        let (severity, count) = row?;
        summary.by_severity.insert(severity, count);
    }

    Ok(summary)
}

fn row_to_event(row: &Row) -> Result<EventLog> {
    let event_type: String = row.get(2)?;
    let timestamp: String = row.get(3)?;
    let severity: String = row.get(4)?;
    let payload: String = row.get(5)?;

    Ok(EventLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        event_type: EventType::from_str(&event_type).ok_or_else(|| invalid_text(2, &event_type))?,
        timestamp: parse_ts(3, &timestamp)?,
        severity: EventSeverity::from_str(&severity).ok_or_else(|| invalid_text(4, &severity))?,
        payload: serde_json::from_str(&payload)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        super::super::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_list_with_filters() {
        let conn = setup();
        insert_event(&conn, &EventLog::info("alice", EventType::ManualCardCreated, json!({"flashcardId": 1}))).unwrap();
        insert_event(&conn, &EventLog::info("alice", EventType::CardEdited, json!({"flashcardId": 1}))).unwrap();
        let mut warning = EventLog::info("alice", EventType::CardDeleted, json!({}));
        warning.severity = EventSeverity::Warning;
        insert_event(&conn, &warning).unwrap();
        insert_event(&conn, &EventLog::info("bob", EventType::CardEdited, json!({}))).unwrap();

        let all = EventQuery { page: 1, per_page: 20, ..Default::default() };
        let (events, total) = list_events(&conn, "alice", &all).unwrap();
        assert_eq!(total, 3);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, EventType::CardDeleted);

        let edits = EventQuery { event_type: Some(EventType::CardEdited), ..all.clone() };
        let (events, total) = list_events(&conn, "alice", &edits).unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].payload, json!({"flashcardId": 1}));

        let warnings = EventQuery { severity: Some(EventSeverity::Warning), ..all };
        assert_eq!(list_events(&conn, "alice", &warnings).unwrap().1, 1);
    }

    #[test]
    fn test_summary_counts() {
        let conn = setup();
        for _ in 0..2 {
            insert_event(&conn, &EventLog::info("alice", EventType::AiCardCreated, json!({}))).unwrap();
        }
        insert_event(&conn, &EventLog::info("alice", EventType::AiCardReviewed, json!({}))).unwrap();

        let summary = get_event_summary(&conn, "alice").unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_type.get("aiCardCreated"), Some(&2));
        assert_eq!(summary.by_type.get("aiCardReviewed"), Some(&1));
        assert_eq!(summary.by_severity.get("info"), Some(&3));
        assert_eq!(get_event_summary(&conn, "bob").unwrap(), EventSummary::default());
    }
}
