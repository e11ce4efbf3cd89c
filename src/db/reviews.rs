//! Review history

use rusqlite::{params, Connection, Result, Row};

use crate::domain::{CardState, Rating, ReviewLog, SessionStats};

use super::flashcards::invalid_text;
use super::{format_ts, parse_opt_ts, parse_ts};

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (flashcard_id, user_id, rating, reviewed_at, review_duration_secs,
                             state_before, state_after, stability, difficulty, due_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
        params![
            log.flashcard_id,
            log.user_id,
            u8::from(log.rating),
            format_ts(log.reviewed_at),
            log.review_duration_secs,
            log.state_before.as_str(),
            log.state_after.as_str(),
            log.stability,
            log.difficulty,
            log.due_at.map(format_ts),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Review history of one card, oldest first
pub fn get_review_logs(conn: &Connection, user_id: &str, flashcard_id: i64) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, flashcard_id, user_id, rating, reviewed_at, review_duration_secs,
           state_before, state_after, stability, difficulty, due_at
    FROM review_logs
    WHERE flashcard_id = ?1 AND user_id = ?2
    ORDER BY reviewed_at ASC, id ASC
    "#,
    )?;
    let logs = stmt
        .query_map(params![flashcard_id, user_id], row_to_review_log)?
        .collect::<Result<Vec<_>>>()?;
    Ok(logs)
}

/// Totals over every review the user has made
pub fn get_review_stats(conn: &Connection, user_id: &str) -> Result<SessionStats> {
    let mut stmt = conn.prepare("SELECT rating FROM review_logs WHERE user_id = ?1")?;
    let ratings = stmt
        .query_map(params![user_id], |row| row.get::<_, u8>(0))?
        .collect::<Result<Vec<_>>>()?;

    let mut stats = SessionStats::new(ratings.len() as u32);
    for rating in ratings.into_iter().filter_map(Rating::from_u8) {
        stats.record(rating);
    }
    Ok(stats)
}

fn row_to_review_log(row: &Row) -> Result<ReviewLog> {
    let rating: u8 = row.get(3)?;
    let reviewed_at: String = row.get(4)?;
    let state_before: String = row.get(6)?;
    let state_after: String = row.get(7)?;

    Ok(ReviewLog {
        id: row.get(0)?,
        flashcard_id: row.get(1)?,
        user_id: row.get(2)?,
        rating: Rating::from_u8(rating).ok_or_else(|| invalid_text(3, &rating.to_string()))?,
        reviewed_at: parse_ts(4, &reviewed_at)?,
        review_duration_secs: row.get(5)?,
        state_before: CardState::from_str(&state_before).ok_or_else(|| invalid_text(6, &state_before))?,
        state_after: CardState::from_str(&state_after).ok_or_else(|| invalid_text(7, &state_after))?,
        stability: row.get(8)?,
        difficulty: row.get(9)?,
        due_at: parse_opt_ts(10, row.get(10)?)?,
    })
}
