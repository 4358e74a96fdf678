//! Credential store, friend graph and the unread write-behind cache.
//!
//! Called from both the hub worker and the HTTP handlers, so all state
//! sits behind explicit locks: one mutex for the database handle, one for
//! the in-memory unread deltas. Where both are needed the store lock is
//! taken first.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::store;

/// Rejections surfaced to clients. `Display` is the wire code.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("USERNAME_DUPLICATE")]
    UsernameDuplicate,
    #[error("USERNAME_INVALID")]
    UsernameInvalid,
    #[error("PASSWORD_EMPTY")]
    PasswordEmpty,
    #[error("USER_DONOT_EXIST")]
    UserDoesNotExist,
    #[error("PASSWORD_INCORRECT")]
    PasswordIncorrect,
    #[error("SESSDATA_INVALID")]
    SessdataInvalid,
    #[error("SET_ICON_FAILED")]
    SetIconFailed,
    #[error("ALREADY_REQUESTED")]
    AlreadyRequested,
    #[error("ALREADY_FRIEND")]
    AlreadyFriend,
    #[error("CANNOT_REQUEST_SELF")]
    CannotRequestSelf,
    #[error("FAILED")]
    Store(#[from] rusqlite::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Public profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserBrief {
    pub name: String,
    pub id: i64,
    pub slogan: String,
}

/// A friend-list row: profile plus the merged unread counter.
#[derive(Debug, Clone, Serialize)]
pub struct FriendEntry {
    #[serde(flatten)]
    pub user: UserBrief,
    pub unread: i64,
}

const MAX_NAME_LEN: usize = 40;

pub struct Authorizer {
    db: Mutex<Connection>,
    /// (user, friend) -> unread delta not yet written back.
    unread: Mutex<HashMap<(i64, i64), i64>>,
    icon_dir: PathBuf,
}

impl Authorizer {
    pub fn open(db_path: &str, icon_dir: impl Into<PathBuf>) -> AuthResult<Self> {
        let icon_dir = icon_dir.into();
        if let Err(e) = std::fs::create_dir_all(&icon_dir) {
            tracing::warn!(dir = %icon_dir.display(), error = %e, "Could not create icon directory");
        }
        Ok(Self {
            db: Mutex::new(store::open_user_db(db_path)?),
            unread: Mutex::new(HashMap::new()),
            icon_dir,
        })
    }

    pub fn register(&self, user_name: &str, password: &str) -> AuthResult<()> {
        if user_name.is_empty() || user_name.len() > MAX_NAME_LEN {
            return Err(AuthError::UsernameInvalid);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordEmpty);
        }

        let db = self.db.lock().unwrap();
        let taken: Option<i64> = db
            .query_row(
                "SELECT id FROM user WHERE user_name = ?1",
                params![user_name],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(AuthError::UsernameDuplicate);
        }
        db.execute(
            "INSERT INTO user (user_name, password) VALUES (?1, ?2)",
            params![user_name, password],
        )?;
        Ok(())
    }

    /// A convenience token, not a security primitive: OS randomness mixed
    /// with the name hash and wall clock. Never zero, so it cannot collide
    /// with the logged-out NULL column.
    fn generate_sessdata(user_name: &str) -> u32 {
        let mut hasher = DefaultHasher::new();
        user_name.hash(&mut hasher);
        let name_hash = hasher.finish() as u32;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;

        let mut rng = rand::rng();
        loop {
            let token = rng
                .random::<u32>()
                .wrapping_add(name_hash)
                .wrapping_shl(16)
                .wrapping_add(now);
            if token != 0 {
                return token;
            }
        }
    }

    pub fn log_in_by_name(&self, user_name: &str, password: &str) -> AuthResult<(i64, u32)> {
        let db = self.db.lock().unwrap();
        let row: Option<(i64, String)> = db
            .query_row(
                "SELECT id, password FROM user WHERE user_name = ?1",
                params![user_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((id, stored)) = row else {
            return Err(AuthError::UserDoesNotExist);
        };
        if stored != password {
            return Err(AuthError::PasswordIncorrect);
        }

        let sessdata = Self::generate_sessdata(user_name);
        db.execute(
            "UPDATE user SET sessdata = ?1 WHERE id = ?2",
            params![sessdata, id],
        )?;
        Ok((id, sessdata))
    }

    pub fn log_in_by_id(&self, id: i64, password: &str) -> AuthResult<(String, u32)> {
        let db = self.db.lock().unwrap();
        let row: Option<(String, String)> = db
            .query_row(
                "SELECT user_name, password FROM user WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((user_name, stored)) = row else {
            return Err(AuthError::UserDoesNotExist);
        };
        if stored != password {
            return Err(AuthError::PasswordIncorrect);
        }

        let sessdata = Self::generate_sessdata(&user_name);
        db.execute(
            "UPDATE user SET sessdata = ?1 WHERE id = ?2",
            params![sessdata, id],
        )?;
        Ok((user_name, sessdata))
    }

    pub fn log_out(&self, sessdata: u32) -> AuthResult<()> {
        let db = self.db.lock().unwrap();
        let id: Option<i64> = db
            .query_row(
                "SELECT id FROM user WHERE sessdata = ?1",
                params![sessdata],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Err(AuthError::UserDoesNotExist);
        };
        db.execute("UPDATE user SET sessdata = NULL WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Resolve a session token to its user.
    pub fn authorize(&self, sessdata: u32) -> AuthResult<(i64, String)> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, user_name FROM user WHERE sessdata = ?1",
            params![sessdata],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(AuthError::SessdataInvalid)
    }

    pub fn set_user_name(&self, id: i64, new_name: &str) -> AuthResult<()> {
        let db = self.db.lock().unwrap();
        let taken: Option<i64> = db
            .query_row(
                "SELECT id FROM user WHERE user_name = ?1",
                params![new_name],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(AuthError::UsernameDuplicate);
        }
        db.execute(
            "UPDATE user SET user_name = ?1 WHERE id = ?2",
            params![new_name, id],
        )?;
        Ok(())
    }

    pub fn set_slogan(&self, id: i64, slogan: &str) -> AuthResult<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE user SET slogan = ?1 WHERE id = ?2",
            params![slogan, id],
        )?;
        Ok(())
    }

    /// Store the uploaded avatar as `{id}.png` under the icon directory.
    pub fn set_icon(&self, id: i64, bytes: &[u8]) -> AuthResult<()> {
        std::fs::write(self.icon_path(id), bytes).map_err(|e| {
            tracing::warn!(user_id = id, error = %e, "Icon write failed");
            AuthError::SetIconFailed
        })
    }

    pub fn icon_path(&self, id: i64) -> PathBuf {
        self.icon_dir.join(format!("{id}.png"))
    }

    pub fn user_id_by_name(&self, user_name: &str) -> AuthResult<i64> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id FROM user WHERE user_name = ?1",
            params![user_name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AuthError::UserDoesNotExist)
    }

    pub fn user_info(&self, id: i64) -> AuthResult<UserBrief> {
        let db = self.db.lock().unwrap();
        Self::query_user_info(&db, id)
    }

    fn query_user_info(db: &Connection, id: i64) -> AuthResult<UserBrief> {
        db.query_row(
            "SELECT user_name, slogan FROM user WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserBrief {
                    name: row.get(0)?,
                    id,
                    slogan: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            },
        )
        .optional()?
        .ok_or(AuthError::UserDoesNotExist)
    }

    pub fn friend_request(&self, requester_id: i64, requestee_id: i64) -> AuthResult<()> {
        if requester_id == requestee_id {
            return Err(AuthError::CannotRequestSelf);
        }

        let db = self.db.lock().unwrap();
        for id in [requester_id, requestee_id] {
            Self::query_user_info(&db, id)?;
        }
        let friends: Option<i64> = db
            .query_row(
                "SELECT 1 FROM relation WHERE user_id = ?1 AND friend_id = ?2",
                params![requester_id, requestee_id],
                |row| row.get(0),
            )
            .optional()?;
        if friends.is_some() {
            return Err(AuthError::AlreadyFriend);
        }

        match db.execute(
            "INSERT INTO friend_request (requester_id, requestee_id) VALUES (?1, ?2)",
            params![requester_id, requestee_id],
        ) {
            Ok(_) => Ok(()),
            Err(e) if store::is_unique_violation(&e) => Err(AuthError::AlreadyRequested),
            Err(e) => Err(e.into()),
        }
    }

    pub fn friend_requests(&self, id: i64) -> AuthResult<Vec<UserBrief>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT requester_id FROM friend_request WHERE requestee_id = ?1")?;
        let requesters: Vec<i64> = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);

        requesters
            .into_iter()
            .map(|requester| Self::query_user_info(&db, requester))
            .collect()
    }

    /// Drop the pending request in both directions.
    pub fn reject_friend_request(&self, id: i64, requester_id: i64) -> AuthResult<()> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM friend_request WHERE requester_id = ?1 AND requestee_id = ?2",
            params![requester_id, id],
        )?;
        tx.execute(
            "DELETE FROM friend_request WHERE requester_id = ?1 AND requestee_id = ?2",
            params![id, requester_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove the request and insert the symmetric relation rows.
    pub fn accept_friend_request(&self, id: i64, requester_id: i64) -> AuthResult<()> {
        self.reject_friend_request(id, requester_id)?;

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "INSERT INTO relation (user_id, friend_id) VALUES (?1, ?2)",
            params![id, requester_id],
        )?;
        tx.execute(
            "INSERT INTO relation (user_id, friend_id) VALUES (?1, ?2)",
            params![requester_id, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Friend rows with the persisted unread counter merged with any delta
    /// still sitting in the cache.
    pub fn friend_list(&self, id: i64) -> AuthResult<Vec<FriendEntry>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT friend_id, unread FROM relation WHERE user_id = ?1")?;
        let rows: Vec<(i64, i64)> = stmt
            .query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        drop(stmt);

        let cache = self.unread.lock().unwrap();
        rows.into_iter()
            .map(|(friend_id, unread)| {
                let delta = cache.get(&(id, friend_id)).copied().unwrap_or(0);
                Ok(FriendEntry {
                    user: Self::query_user_info(&db, friend_id)?,
                    unread: unread + delta,
                })
            })
            .collect()
    }

    /// Bump the in-memory unread counter; the flusher persists it later.
    pub fn unread_add(&self, user_id: i64, friend_id: i64) {
        let mut cache = self.unread.lock().unwrap();
        *cache.entry((user_id, friend_id)).or_insert(0) += 1;
    }

    /// Zero both the cached delta and the persisted counter.
    pub fn unread_clear(&self, user_id: i64, friend_id: i64) -> AuthResult<()> {
        let db = self.db.lock().unwrap();
        let mut cache = self.unread.lock().unwrap();
        cache.remove(&(user_id, friend_id));
        db.execute(
            "UPDATE relation SET unread = 0 WHERE user_id = ?1 AND friend_id = ?2",
            params![user_id, friend_id],
        )?;
        Ok(())
    }

    /// Apply every cached delta in one transaction and truncate the cache.
    /// Called by the background flusher and directly by tests.
    pub fn flush_unread_now(&self) -> AuthResult<usize> {
        let mut db = self.db.lock().unwrap();
        let mut cache = self.unread.lock().unwrap();

        let tx = db.transaction()?;
        let mut applied = 0;
        for (&(user_id, friend_id), &delta) in cache.iter() {
            if delta == 0 {
                continue;
            }
            tx.execute(
                "UPDATE relation SET unread = unread + ?1 WHERE user_id = ?2 AND friend_id = ?3",
                params![delta, user_id, friend_id],
            )?;
            applied += 1;
        }
        tx.commit()?;
        cache.clear();
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorizer() -> Authorizer {
        let dir = tempfile::tempdir().unwrap();
        Authorizer::open(":memory:", dir.keep()).unwrap()
    }

    #[test]
    fn register_then_log_in() {
        let auth = authorizer();
        auth.register("alice", "pw1").unwrap();
        assert!(matches!(
            auth.register("alice", "pw2"),
            Err(AuthError::UsernameDuplicate)
        ));
        assert!(matches!(
            auth.log_in_by_name("alice", "pw2"),
            Err(AuthError::PasswordIncorrect)
        ));
        let (id, token) = auth.log_in_by_name("alice", "pw1").unwrap();
        assert!(id > 0);
        assert_ne!(token, 0);
    }

    #[test]
    fn rejects_bad_names_and_empty_passwords() {
        let auth = authorizer();
        assert!(matches!(
            auth.register("", "pw"),
            Err(AuthError::UsernameInvalid)
        ));
        assert!(matches!(
            auth.register(&"x".repeat(41), "pw"),
            Err(AuthError::UsernameInvalid)
        ));
        assert!(matches!(
            auth.register("bob", ""),
            Err(AuthError::PasswordEmpty)
        ));
    }

    #[test]
    fn fresh_log_in_invalidates_the_previous_token() {
        let auth = authorizer();
        auth.register("alice", "pw1").unwrap();
        let (id, first) = auth.log_in_by_name("alice", "pw1").unwrap();
        assert_ne!(first, 0);
        assert_eq!(auth.authorize(first).unwrap(), (id, "alice".to_string()));

        let (_, second) = auth.log_in_by_name("alice", "pw1").unwrap();
        assert!(matches!(
            auth.authorize(first),
            Err(AuthError::SessdataInvalid)
        ));
        assert_eq!(auth.authorize(second).unwrap().0, id);

        auth.log_out(second).unwrap();
        assert!(matches!(
            auth.authorize(second),
            Err(AuthError::SessdataInvalid)
        ));
    }

    #[test]
    fn log_in_by_id_matches_by_row() {
        let auth = authorizer();
        auth.register("carol", "secret").unwrap();
        let id = auth.user_id_by_name("carol").unwrap();
        let (name, token) = auth.log_in_by_id(id, "secret").unwrap();
        assert_eq!(name, "carol");
        assert_ne!(token, 0);
        assert!(matches!(
            auth.log_in_by_id(id + 1, "secret"),
            Err(AuthError::UserDoesNotExist)
        ));
    }

    #[test]
    fn friend_request_conflicts() {
        let auth = authorizer();
        auth.register("alice", "pw").unwrap();
        auth.register("bob", "pw").unwrap();
        let alice = auth.user_id_by_name("alice").unwrap();
        let bob = auth.user_id_by_name("bob").unwrap();

        assert!(matches!(
            auth.friend_request(alice, alice),
            Err(AuthError::CannotRequestSelf)
        ));
        assert!(matches!(
            auth.friend_request(alice, 999),
            Err(AuthError::UserDoesNotExist)
        ));

        auth.friend_request(alice, bob).unwrap();
        assert!(matches!(
            auth.friend_request(alice, bob),
            Err(AuthError::AlreadyRequested)
        ));

        let requests = auth.friend_requests(bob).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "alice");

        auth.accept_friend_request(bob, alice).unwrap();
        assert!(auth.friend_requests(bob).unwrap().is_empty());
        assert!(matches!(
            auth.friend_request(alice, bob),
            Err(AuthError::AlreadyFriend)
        ));

        let friends = auth.friend_list(alice).unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user.id, bob);
        assert_eq!(friends[0].unread, 0);
    }

    #[test]
    fn reject_drops_the_request_without_a_relation() {
        let auth = authorizer();
        auth.register("alice", "pw").unwrap();
        auth.register("bob", "pw").unwrap();
        let alice = auth.user_id_by_name("alice").unwrap();
        let bob = auth.user_id_by_name("bob").unwrap();

        auth.friend_request(alice, bob).unwrap();
        auth.reject_friend_request(bob, alice).unwrap();
        assert!(auth.friend_requests(bob).unwrap().is_empty());
        assert!(auth.friend_list(bob).unwrap().is_empty());
        // A rejected request may be raised again.
        auth.friend_request(alice, bob).unwrap();
    }

    #[test]
    fn unread_counts_merge_before_the_flush() {
        let auth = authorizer();
        auth.register("alice", "pw").unwrap();
        auth.register("bob", "pw").unwrap();
        let alice = auth.user_id_by_name("alice").unwrap();
        let bob = auth.user_id_by_name("bob").unwrap();
        auth.friend_request(alice, bob).unwrap();
        auth.accept_friend_request(bob, alice).unwrap();

        auth.unread_add(alice, bob);
        auth.unread_add(alice, bob);

        // Visible immediately, before any flush.
        let friends = auth.friend_list(alice).unwrap();
        assert_eq!(friends[0].unread, 2);

        assert_eq!(auth.flush_unread_now().unwrap(), 1);
        let friends = auth.friend_list(alice).unwrap();
        assert_eq!(friends[0].unread, 2, "flush must not change the merged view");

        auth.unread_clear(alice, bob).unwrap();
        let friends = auth.friend_list(alice).unwrap();
        assert_eq!(friends[0].unread, 0);
    }

    #[test]
    fn slogan_name_and_icon_updates() {
        let auth = authorizer();
        auth.register("alice", "pw").unwrap();
        auth.register("bob", "pw").unwrap();
        let alice = auth.user_id_by_name("alice").unwrap();

        auth.set_slogan(alice, "ready to lose").unwrap();
        assert_eq!(auth.user_info(alice).unwrap().slogan, "ready to lose");

        assert!(matches!(
            auth.set_user_name(alice, "bob"),
            Err(AuthError::UsernameDuplicate)
        ));
        auth.set_user_name(alice, "alicia").unwrap();
        assert_eq!(auth.user_info(alice).unwrap().name, "alicia");

        auth.set_icon(alice, b"png-bytes").unwrap();
        assert_eq!(std::fs::read(auth.icon_path(alice)).unwrap(), b"png-bytes");
    }
}
