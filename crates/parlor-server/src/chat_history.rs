//! Write-behind store for private messages.
//!
//! New messages land in an append-only in-memory ring with a per-user
//! index; a background flusher persists and clears it every few minutes.
//! Reads merge the ring with per-peer pages from the database.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};
use serde_json::{Map, Value};

use crate::store;

/// Messages returned per peer from the database page.
const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub timestamp: i64,
    /// The stamped message object, serialized.
    pub payload: String,
}

#[derive(Default)]
struct ChatCache {
    messages: Vec<ChatMessage>,
    /// user id -> indices into `messages`, under both sender and receiver.
    index: HashMap<i64, Vec<usize>>,
}

pub struct ChatHistory {
    db: Mutex<Connection>,
    cache: Mutex<ChatCache>,
}

impl ChatHistory {
    pub fn open(db_path: &str) -> rusqlite::Result<Self> {
        Ok(Self {
            db: Mutex::new(store::open_chat_db(db_path)?),
            cache: Mutex::new(ChatCache::default()),
        })
    }

    /// Server wall clock in whole seconds.
    pub fn timestamp_now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Append to the ring and index under both endpoints.
    pub fn new_chat_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        timestamp: i64,
        payload: String,
    ) {
        let mut cache = self.cache.lock().unwrap();
        let slot = cache.messages.len();
        cache.messages.push(ChatMessage {
            sender_id,
            receiver_id,
            timestamp,
            payload,
        });
        cache.index.entry(sender_id).or_default().push(slot);
        if receiver_id != sender_id {
            cache.index.entry(receiver_id).or_default().push(slot);
        }
    }

    fn parse_item(payload: &str, timestamp: i64) -> Value {
        let mut item: Value =
            serde_json::from_str(payload).unwrap_or_else(|_| Value::Object(Map::new()));
        if let Some(obj) = item.as_object_mut() {
            obj.insert("timestamp".into(), timestamp.into());
        }
        item
    }

    /// History for `user_id`, keyed by peer id, strictly older than
    /// `before_ts`. Every matching ring entry is returned; the database
    /// contributes up to 20 newest per peer.
    pub fn get_chat_message(&self, user_id: i64, before_ts: i64) -> rusqlite::Result<Value> {
        let mut result = Map::new();

        {
            let cache = self.cache.lock().unwrap();
            if let Some(slots) = cache.index.get(&user_id) {
                for &slot in slots {
                    let msg = &cache.messages[slot];
                    if msg.timestamp >= before_ts {
                        continue;
                    }
                    let friend = if msg.sender_id == user_id {
                        msg.receiver_id
                    } else {
                        msg.sender_id
                    };
                    result
                        .entry(friend.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()))
                        .as_array_mut()
                        .expect("entry inserted as array")
                        .push(Self::parse_item(&msg.payload, msg.timestamp));
                }
            }
        }

        let db = self.db.lock().unwrap();
        let mut peers: Vec<i64> = Vec::new();
        let mut stmt = db.prepare(
            "SELECT DISTINCT receiver_id FROM chat WHERE sender_id = ?1
             UNION
             SELECT DISTINCT sender_id FROM chat WHERE receiver_id = ?1",
        )?;
        for peer in stmt.query_map(params![user_id], |row| row.get(0))? {
            peers.push(peer?);
        }
        drop(stmt);

        let mut page = db.prepare(
            "SELECT timestamp, message FROM chat
             WHERE ((sender_id = ?1 AND receiver_id = ?2)
                 OR (receiver_id = ?1 AND sender_id = ?2))
               AND timestamp < ?3
             ORDER BY timestamp DESC LIMIT ?4",
        )?;
        for peer in peers {
            let rows = page.query_map(
                params![user_id, peer, before_ts, PAGE_SIZE as i64],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )?;
            let bucket = result
                .entry(peer.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
                .expect("entry inserted as array");
            for row in rows {
                let (timestamp, payload) = row?;
                bucket.push(Self::parse_item(&payload, timestamp));
            }
        }

        Ok(Value::Object(result))
    }

    /// One page of a single conversation, database only.
    pub fn get_peer_messages(
        &self,
        user_id: i64,
        friend_id: i64,
        before_ts: i64,
    ) -> rusqlite::Result<Vec<Value>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT timestamp, message FROM chat
             WHERE ((sender_id = ?1 AND receiver_id = ?2)
                 OR (receiver_id = ?1 AND sender_id = ?2))
               AND timestamp < ?3
             ORDER BY timestamp DESC LIMIT ?4",
        )?;
        let rows = stmt.query_map(
            params![user_id, friend_id, before_ts, PAGE_SIZE as i64],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )?;
        let mut items = Vec::new();
        for row in rows {
            let (timestamp, payload) = row?;
            items.push(Self::parse_item(&payload, timestamp));
        }
        Ok(items)
    }

    /// Persist the ring in one transaction and clear it. Called by the
    /// background flusher and directly by tests.
    pub fn flush_now(&self) -> rusqlite::Result<usize> {
        let mut db = self.db.lock().unwrap();
        let mut cache = self.cache.lock().unwrap();

        let tx = db.transaction()?;
        for msg in &cache.messages {
            tx.execute(
                "INSERT INTO chat (sender_id, receiver_id, timestamp, message)
                 VALUES (?1, ?2, ?3, ?4)",
                params![msg.sender_id, msg.receiver_id, msg.timestamp, msg.payload],
            )?;
        }
        tx.commit()?;

        let flushed = cache.messages.len();
        cache.messages.clear();
        cache.index.clear();
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(text: &str) -> String {
        json!({ "content": text }).to_string()
    }

    #[test]
    fn ring_entries_are_readable_before_any_flush() {
        let chat = ChatHistory::open(":memory:").unwrap();
        chat.new_chat_message(1, 2, 100, payload("hi"));
        chat.new_chat_message(2, 1, 101, payload("hello"));

        let history = chat.get_chat_message(1, 1_000).unwrap();
        let peer = history["2"].as_array().unwrap();
        assert_eq!(peer.len(), 2);
        assert_eq!(peer[0]["content"], "hi");
        assert_eq!(peer[0]["timestamp"], 100);

        // The peer sees the same two messages under user 1.
        let history = chat.get_chat_message(2, 1_000).unwrap();
        assert_eq!(history["1"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn before_ts_filters_the_ring() {
        let chat = ChatHistory::open(":memory:").unwrap();
        chat.new_chat_message(1, 2, 100, payload("old"));
        chat.new_chat_message(1, 2, 200, payload("new"));

        let history = chat.get_chat_message(1, 150).unwrap();
        let peer = history["2"].as_array().unwrap();
        assert_eq!(peer.len(), 1);
        assert_eq!(peer[0]["content"], "old");
    }

    #[test]
    fn flush_moves_the_ring_into_the_database() {
        let chat = ChatHistory::open(":memory:").unwrap();
        chat.new_chat_message(1, 2, 100, payload("persisted"));
        assert_eq!(chat.flush_now().unwrap(), 1);
        assert_eq!(chat.flush_now().unwrap(), 0, "ring cleared by the flush");

        let history = chat.get_chat_message(2, 1_000).unwrap();
        let peer = history["1"].as_array().unwrap();
        assert_eq!(peer.len(), 1);
        assert_eq!(peer[0]["content"], "persisted");
    }

    #[test]
    fn database_pages_are_capped_per_peer() {
        let chat = ChatHistory::open(":memory:").unwrap();
        for ts in 0..30 {
            chat.new_chat_message(1, 2, ts, payload(&format!("m{ts}")));
        }
        chat.new_chat_message(1, 3, 5, payload("other peer"));
        chat.flush_now().unwrap();

        let history = chat.get_chat_message(1, 1_000).unwrap();
        assert_eq!(history["2"].as_array().unwrap().len(), PAGE_SIZE);
        assert_eq!(history["3"].as_array().unwrap().len(), 1);
        // Newest first within a page.
        assert_eq!(history["2"][0]["content"], "m29");

        let page = chat.get_peer_messages(1, 2, 10).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page[0]["content"], "m9");
    }

    #[test]
    fn merged_reads_combine_ring_and_database() {
        let chat = ChatHistory::open(":memory:").unwrap();
        chat.new_chat_message(1, 2, 100, payload("flushed"));
        chat.flush_now().unwrap();
        chat.new_chat_message(1, 2, 200, payload("cached"));

        let history = chat.get_chat_message(1, 1_000).unwrap();
        let peer = history["2"].as_array().unwrap();
        assert_eq!(peer.len(), 2);
    }
}
