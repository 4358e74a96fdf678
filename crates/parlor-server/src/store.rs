//! SQLite handles and schema. Two separate databases keep the user/friend
//! tables and the chat log on independent locks (one mutex per handle).

use rusqlite::Connection;

/// Open (or create) the user database: accounts, friendships with their
/// unread counters, and pending friend requests.
pub fn open_user_db(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name TEXT NOT NULL UNIQUE,
            password  TEXT NOT NULL,
            icon      TEXT,
            slogan    TEXT,
            sessdata  INTEGER
        );
        CREATE TABLE IF NOT EXISTS relation (
            user_id   INTEGER NOT NULL,
            friend_id INTEGER NOT NULL,
            unread    INTEGER NOT NULL DEFAULT 0,
            UNIQUE (user_id, friend_id)
        );
        CREATE TABLE IF NOT EXISTS friend_request (
            requester_id INTEGER NOT NULL,
            requestee_id INTEGER NOT NULL,
            UNIQUE (requester_id, requestee_id)
        );",
    )?;
    Ok(conn)
}

/// Open (or create) the chat database.
pub fn open_chat_db(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chat (
            sender_id   INTEGER NOT NULL,
            receiver_id INTEGER NOT NULL,
            timestamp   INTEGER NOT NULL,
            message     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS chat_by_sender ON chat (sender_id, timestamp);
        CREATE INDEX IF NOT EXISTS chat_by_receiver ON chat (receiver_id, timestamp);",
    )?;
    Ok(conn)
}

/// A uniqueness-constraint conflict, surfaced as data rather than a fault.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn user_schema_enforces_unique_names() {
        let conn = open_user_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO user (user_name, password) VALUES (?1, ?2)",
            params!["alice", "pw"],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO user (user_name, password) VALUES (?1, ?2)",
                params!["alice", "other"],
            )
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn friend_request_pairs_are_unique_per_direction() {
        let conn = open_user_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO friend_request (requester_id, requestee_id) VALUES (1, 2)",
            [],
        )
        .unwrap();
        // The reverse direction is a different pair.
        conn.execute(
            "INSERT INTO friend_request (requester_id, requestee_id) VALUES (2, 1)",
            [],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO friend_request (requester_id, requestee_id) VALUES (1, 2)",
                [],
            )
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
