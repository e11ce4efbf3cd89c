//! Flashcard CRUD and query operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{CardSchedule, CardState, Flashcard, FlashcardSource};

use super::{format_ts, parse_opt_ts, parse_ts};

const FLASHCARD_COLUMNS: &str = r#"
    id, user_id, front, back, source, source_text_id, created_at, updated_at,
    difficulty, stability, repetitions, lapses, state, due_at, last_reviewed_at
"#;

/// Column a flashcard listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of a user's flashcards
#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardQuery {
    pub page: u32,
    pub per_page: u32,
    pub source: Option<FlashcardSource>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for FlashcardQuery {
    fn default() -> Self {
        Self {
            page: crate::config::DEFAULT_PAGE,
            per_page: crate::config::DEFAULT_PER_PAGE,
            source: None,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

pub fn insert_flashcard(conn: &Connection, card: &Flashcard) -> Result<i64> {
    let schedule = &card.schedule;
    conn.execute(
        r#"
    INSERT INTO flashcards (user_id, front, back, source, source_text_id, created_at, updated_at,
                            difficulty, stability, repetitions, lapses, state, due_at, last_reviewed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    "#,
        params![
            card.user_id,
            card.front,
            card.back,
            card.source.as_str(),
            card.source_text_id,
            format_ts(card.created_at),
            format_ts(card.updated_at),
            schedule.difficulty,
            schedule.stability,
            schedule.repetitions,
            schedule.lapses,
            schedule.state.as_str(),
            schedule.due_at.map(format_ts),
            schedule.last_reviewed_at.map(format_ts),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_flashcard(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Flashcard>> {
    conn.query_row(
        &format!("SELECT {} FROM flashcards WHERE id = ?1 AND user_id = ?2", FLASHCARD_COLUMNS),
        params![id, user_id],
        row_to_flashcard,
    )
    .optional()
}

/// List a page of the user's flashcards together with the unpaged total
pub fn list_flashcards(conn: &Connection, user_id: &str, query: &FlashcardQuery) -> Result<(Vec<Flashcard>, i64)> {
    let source = query.source.map(|s| s.as_str());

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM flashcards WHERE user_id = ?1 AND (?2 IS NULL OR source = ?2)",
        params![user_id, source],
        |row| row.get(0),
    )?;

    let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.per_page);
    // id breaks ties so pages never overlap
    let sql = format!(
        r#"
    SELECT {columns} FROM flashcards
    WHERE user_id = ?1 AND (?2 IS NULL OR source = ?2)
    ORDER BY {sort} {order}, id {order}
    LIMIT ?3 OFFSET ?4
    "#,
        columns = FLASHCARD_COLUMNS,
        sort = query.sort.column(),
        order = query.order.keyword(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let cards = stmt
        .query_map(params![user_id, source, query.per_page, offset], row_to_flashcard)?
        .collect::<Result<Vec<_>>>()?;
    Ok((cards, total))
}

/// Cards that are due at `now`, earliest first
pub fn get_due_flashcards(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        r#"
    SELECT {} FROM flashcards
    WHERE user_id = ?1 AND (due_at IS NULL OR due_at <= ?2)
    ORDER BY due_at ASC, id ASC
    "#,
        FLASHCARD_COLUMNS
    ))?;
    let cards = stmt
        .query_map(params![user_id, format_ts(now)], row_to_flashcard)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Schedules of every card the user owns
pub fn get_user_schedules(conn: &Connection, user_id: &str) -> Result<Vec<CardSchedule>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT difficulty, stability, repetitions, lapses, state, due_at, last_reviewed_at
    FROM flashcards WHERE user_id = ?1
    "#,
    )?;
    let schedules = stmt
        .query_map(params![user_id], |row| row_to_schedule(row, 0))?
        .collect::<Result<Vec<_>>>()?;
    Ok(schedules)
}

pub fn get_flashcards_for_source_text(conn: &Connection, user_id: &str, source_text_id: i64) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM flashcards WHERE user_id = ?1 AND source_text_id = ?2 ORDER BY id ASC",
        FLASHCARD_COLUMNS
    ))?;
    let cards = stmt
        .query_map(params![user_id, source_text_id], row_to_flashcard)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Rewrite the text of a card. Returns false when the user has no such card.
pub fn update_flashcard_text(conn: &Connection, card: &Flashcard) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE flashcards SET front = ?1, back = ?2, source = ?3, updated_at = ?4
    WHERE id = ?5 AND user_id = ?6
    "#,
        params![
            card.front,
            card.back,
            card.source.as_str(),
            format_ts(card.updated_at),
            card.id,
            card.user_id,
        ],
    )?;
    Ok(updated > 0)
}

/// Delete a card and its review history. Returns false when nothing was deleted.
pub fn delete_flashcard(conn: &Connection, user_id: &str, id: i64) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM review_logs WHERE flashcard_id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    let deleted = tx.execute(
        "DELETE FROM flashcards WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    tx.commit()?;
    Ok(deleted > 0)
}

pub(crate) fn invalid_text(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unexpected value {:?}", value).into(),
    )
}

pub(crate) fn row_to_schedule(row: &Row, first: usize) -> Result<CardSchedule> {
    let state: String = row.get(first + 4)?;
    Ok(CardSchedule {
        difficulty: row.get(first)?,
        stability: row.get(first + 1)?,
        repetitions: row.get(first + 2)?,
        lapses: row.get(first + 3)?,
        state: CardState::from_str(&state).ok_or_else(|| invalid_text(first + 4, &state))?,
        due_at: parse_opt_ts(first + 5, row.get(first + 5)?)?,
        last_reviewed_at: parse_opt_ts(first + 6, row.get(first + 6)?)?,
    })
}

fn row_to_flashcard(row: &Row) -> Result<Flashcard> {
    let source: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Flashcard {
        id: row.get(0)?,
        user_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        source: FlashcardSource::from_str(&source).ok_or_else(|| invalid_text(4, &source))?,
        source_text_id: row.get(5)?,
        created_at: parse_ts(6, &created_at)?,
        updated_at: parse_ts(7, &updated_at)?,
        schedule: row_to_schedule(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        super::super::run_migrations(&conn).unwrap();
        conn
    }

    fn manual(user: &str, front: &str, now: DateTime<Utc>) -> Flashcard {
        Flashcard::new(user, front.to_string(), format!("{} back", front), FlashcardSource::Manual, None, now)
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let conn = setup();
        let now = Utc::now();
        let mut card = manual("alice", "hola", now);
        card.schedule.state = CardState::Review;
        card.schedule.repetitions = 4;
        card.schedule.stability = 3.25;
        card.schedule.last_reviewed_at = Some(now);

        let id = insert_flashcard(&conn, &card).unwrap();
        let loaded = get_flashcard(&conn, "alice", id).unwrap().unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.front, "hola");
        assert_eq!(loaded.source, FlashcardSource::Manual);
        assert_eq!(loaded.schedule, card.schedule);
        assert_eq!(loaded.created_at, now);
    }

    #[test]
    fn test_get_is_scoped_to_user() {
        let conn = setup();
        let id = insert_flashcard(&conn, &manual("alice", "hola", Utc::now())).unwrap();

        assert!(get_flashcard(&conn, "bob", id).unwrap().is_none());
        assert!(!delete_flashcard(&conn, "bob", id).unwrap());
        assert!(get_flashcard(&conn, "alice", id).unwrap().is_some());
    }

    #[test]
    fn test_list_paginates_and_filters() {
        let conn = setup();
        let base = Utc::now();
        for i in 0..5 {
            insert_flashcard(&conn, &manual("alice", &format!("m{}", i), base + Duration::seconds(i))).unwrap();
        }
        let ai = Flashcard::new("alice", "q".into(), "a".into(), FlashcardSource::Ai, None, base);
        insert_flashcard(&conn, &ai).unwrap();
        insert_flashcard(&conn, &manual("bob", "other", base)).unwrap();

        let query = FlashcardQuery { per_page: 2, page: 2, source: Some(FlashcardSource::Manual), ..Default::default() };
        let (page, total) = list_flashcards(&conn, "alice", &query).unwrap();

        assert_eq!(total, 5);
        let fronts: Vec<&str> = page.iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, vec!["m2", "m1"]);

        let asc = FlashcardQuery { order: SortOrder::Asc, ..Default::default() };
        let (all, total) = list_flashcards(&conn, "alice", &asc).unwrap();
        assert_eq!(total, 6);
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_due_flashcards() {
        let conn = setup();
        let now = Utc::now();
        let due_card = manual("alice", "due", now - Duration::hours(2));
        let mut later = manual("alice", "later", now);
        later.schedule.due_at = Some(now + Duration::days(2));
        later.schedule.state = CardState::Review;
        later.schedule.repetitions = 4;
        insert_flashcard(&conn, &due_card).unwrap();
        insert_flashcard(&conn, &later).unwrap();

        let due = get_due_flashcards(&conn, "alice", now).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].front, "due");
        assert!(get_due_flashcards(&conn, "bob", now).unwrap().is_empty());
    }

    #[test]
    fn test_update_text_and_delete() {
        let conn = setup();
        let now = Utc::now();
        let mut card = manual("alice", "hola", now);
        card.id = insert_flashcard(&conn, &card).unwrap();

        card.front = "adios".to_string();
        card.updated_at = now + Duration::minutes(1);
        assert!(update_flashcard_text(&conn, &card).unwrap());

        let loaded = get_flashcard(&conn, "alice", card.id).unwrap().unwrap();
        assert_eq!(loaded.front, "adios");
        assert_eq!(loaded.updated_at, card.updated_at);

        assert!(delete_flashcard(&conn, "alice", card.id).unwrap());
        assert!(get_flashcard(&conn, "alice", card.id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_state_is_conversion_error() {
        let conn = setup();
        let id = insert_flashcard(&conn, &manual("alice", "hola", Utc::now())).unwrap();
        conn.execute("UPDATE flashcards SET state = 'Suspended' WHERE id = ?1", params![id])
            .unwrap();

        assert!(get_flashcard(&conn, "alice", id).is_err());
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortField::from_str("updatedAt"), Some(SortField::UpdatedAt));
        assert_eq!(SortField::from_str("front"), None);
        assert_eq!(SortOrder::from_str("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::from_str("ASC"), None);
    }
}
