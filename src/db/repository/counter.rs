use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{CounterRecord, MAX_COUNTER_VALUE};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Atomically create-if-absent and add one, returning the post-increment record.
///
/// A missing row is inserted already advanced to 2: the caller consumes
/// value 1 through this same statement. A counter at `MAX_COUNTER_VALUE`
/// is left untouched and reported as a constraint violation.
pub fn increment_counter(conn: &Connection, name: &str) -> Result<CounterRecord, DatabaseError> {
    let row = conn
        .query_row(
            "INSERT INTO counters (name, value) VALUES (?1, 2)
             ON CONFLICT(name) DO UPDATE SET
               value = value + 1,
               updated_at = datetime('now')
             WHERE value < ?2
             RETURNING name, value, created_at, updated_at",
            params![name, MAX_COUNTER_VALUE as i64],
            counter_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!("counter {name} is exhausted"))
        })?;
    counter_from_row(row)
}

/// Create the counter at value 1 when absent, then return it unchanged.
pub fn upsert_counter(conn: &Connection, name: &str) -> Result<CounterRecord, DatabaseError> {
    let row = conn.query_row(
        "INSERT INTO counters (name, value) VALUES (?1, 1)
         ON CONFLICT(name) DO UPDATE SET value = value
         RETURNING name, value, created_at, updated_at",
        params![name],
        counter_row_from_rusqlite,
    )?;
    counter_from_row(row)
}

/// Raise the counter to at least `min_value`. Never lowers it.
pub fn advance_counter(
    conn: &Connection,
    name: &str,
    min_value: u64,
) -> Result<CounterRecord, DatabaseError> {
    let min_value = i64::try_from(min_value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!(
                "counter {name} cannot be advanced to {min_value}"
            ))
        })?;

    let row = conn.query_row(
        "INSERT INTO counters (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET
           value = MAX(value, excluded.value),
           updated_at = datetime('now')
         RETURNING name, value, created_at, updated_at",
        params![name, min_value],
        counter_row_from_rusqlite,
    )?;
    counter_from_row(row)
}

pub fn get_counter(conn: &Connection, name: &str) -> Result<Option<CounterRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT name, value, created_at, updated_at FROM counters WHERE name = ?1",
            params![name],
            counter_row_from_rusqlite,
        )
        .optional()?;
    row.map(counter_from_row).transpose()
}

pub fn list_counters(conn: &Connection) -> Result<Vec<CounterRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, value, created_at, updated_at FROM counters ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], counter_row_from_rusqlite)?;

    let mut counters = Vec::new();
    for row in rows {
        counters.push(counter_from_row(row?)?);
    }
    Ok(counters)
}

// Internal row type for CounterRecord mapping
struct CounterRow {
    name: String,
    value: i64,
    created_at: String,
    updated_at: String,
}

fn counter_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CounterRow, rusqlite::Error> {
    Ok(CounterRow {
        name: row.get(0)?,
        value: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn counter_from_row(row: CounterRow) -> Result<CounterRecord, DatabaseError> {
    let value = u64::try_from(row.value).map_err(|_| {
        DatabaseError::ConstraintViolation(format!(
            "counter {} holds invalid value {}",
            row.name, row.value
        ))
    })?;
    Ok(CounterRecord {
        name: row.name,
        value,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
        updated_at: NaiveDateTime::parse_from_str(&row.updated_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
    })
}
