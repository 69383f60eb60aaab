use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::models::{Session, UserId};

/// Keyed storage for open questionnaires.
///
/// Implementations must allow different users to be written concurrently.
/// Writes for one user are serialized by the caller.
pub trait SessionStore: Send + Sync {
    fn get(
        &self,
        user_id: &UserId,
    ) -> Option<Session>;

    /// Inserts or replaces the session for `session.user_id`.
    fn put(
        &self,
        session: Session,
    );

    /// Runs `edit` on the user's session while holding that user's entry,
    /// removing the session afterwards when `edit` asks for it.
    ///
    /// Returns `None` without calling `edit` when the user has no session.
    fn update<R>(
        &self,
        user_id: &UserId,
        edit: impl FnOnce(&mut Session) -> (R, AfterUpdate),
    ) -> Option<R>;

    /// Removes and returns the session, if there was one.
    fn delete(
        &self,
        user_id: &UserId,
    ) -> Option<Session>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every session last touched at or before `cutoff`.
    /// Returns how many were removed.
    fn evict_idle(
        &self,
        cutoff: DateTime<Utc>,
    ) -> usize;
}

/// What [`SessionStore::update`] does with the session once the edit is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterUpdate {
    Keep,
    Remove,
}

/// Process-local store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<UserId, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(
        &self,
        user_id: &UserId,
    ) -> Option<Session> {
        self.sessions.get(user_id).map(|entry| entry.value().clone())
    }

    fn put(
        &self,
        session: Session,
    ) {
        self.sessions.insert(session.user_id.clone(), session);
    }

    fn update<R>(
        &self,
        user_id: &UserId,
        edit: impl FnOnce(&mut Session) -> (R, AfterUpdate),
    ) -> Option<R> {
        match self.sessions.entry(user_id.clone()) {
            Entry::Occupied(mut entry) => {
                let (result, after) = edit(entry.get_mut());
                if after == AfterUpdate::Remove {
                    entry.remove();
                }
                Some(result)
            }
            Entry::Vacant(_) => None,
        }
    }

    fn delete(
        &self,
        user_id: &UserId,
    ) -> Option<Session> {
        self.sessions.remove(user_id).map(|(_, session)| session)
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn evict_idle(
        &self,
        cutoff: DateTime<Utc>,
    ) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, session| {
            let keep = session.last_touched > cutoff;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }
}
