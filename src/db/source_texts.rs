//! Source text storage

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Flashcard, SourceText};

use super::flashcards::insert_flashcard;
use super::{format_ts, parse_ts};

pub fn insert_source_text(conn: &Connection, user_id: &str, text_content: &str, now: DateTime<Utc>) -> Result<SourceText> {
    conn.execute(
        "INSERT INTO source_texts (user_id, text_content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![user_id, text_content, format_ts(now)],
    )?;
    Ok(SourceText {
        id: conn.last_insert_rowid(),
        user_id: user_id.to_string(),
        text_content: text_content.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Store a source text and the cards generated from it in one transaction.
/// Each card is linked to the new text.
pub fn insert_source_text_with_flashcards(
    conn: &Connection,
    user_id: &str,
    text_content: &str,
    cards: Vec<Flashcard>,
    now: DateTime<Utc>,
) -> Result<(SourceText, Vec<Flashcard>)> {
    let tx = conn.unchecked_transaction()?;
    let source_text = insert_source_text(&tx, user_id, text_content, now)?;
    let mut stored = Vec::with_capacity(cards.len());
    for mut card in cards {
        card.source_text_id = Some(source_text.id);
        card.id = insert_flashcard(&tx, &card)?;
        stored.push(card);
    }
    tx.commit()?;
    Ok((source_text, stored))
}

pub fn get_source_text(conn: &Connection, user_id: &str, id: i64) -> Result<Option<SourceText>> {
    conn.query_row(
        "SELECT id, user_id, text_content, created_at, updated_at FROM source_texts WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
        row_to_source_text,
    )
    .optional()
}

/// Newest first, with the unpaged total
pub fn list_source_texts(conn: &Connection, user_id: &str, page: u32, per_page: u32) -> Result<(Vec<SourceText>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM source_texts WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
    let mut stmt = conn.prepare(
        r#"
    SELECT id, user_id, text_content, created_at, updated_at
    FROM source_texts WHERE user_id = ?1
    ORDER BY created_at DESC, id DESC
    LIMIT ?2 OFFSET ?3
    "#,
    )?;
    let texts = stmt
        .query_map(params![user_id, per_page, offset], row_to_source_text)?
        .collect::<Result<Vec<_>>>()?;
    Ok((texts, total))
}

/// Delete a source text. Cards generated from it are kept and detached.
pub fn delete_source_text(conn: &Connection, user_id: &str, id: i64) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE flashcards SET source_text_id = NULL WHERE source_text_id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    let deleted = tx.execute(
        "DELETE FROM source_texts WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    tx.commit()?;
    Ok(deleted > 0)
}

fn row_to_source_text(row: &Row) -> Result<SourceText> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    Ok(SourceText {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text_content: row.get(2)?,
        created_at: parse_ts(3, &created_at)?,
        updated_at: parse_ts(4, &updated_at)?,
    })
}
