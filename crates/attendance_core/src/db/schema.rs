//! Table definitions for attendees and events.

use rusqlite::Connection;

pub const ATTENDEES_TABLE: &str = "attendees";
pub const EVENTS_TABLE: &str = "events";

pub const CREATE_ATTENDEES_TABLE: &str = "CREATE TABLE IF NOT EXISTS attendees (
    preferred_name TEXT NOT NULL,
    legal_name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    profile_url TEXT,
    is_host INTEGER NOT NULL,
    joined_date TEXT,
    UNIQUE(user_id)
);";

pub const CREATE_EVENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS events (
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    time TEXT NOT NULL,
    UNIQUE(id)
);";

/// Returns whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get::<_, bool>(0),
    )
}
