use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::common::types::{ChannelId, SessionId, Shared, UserId};
use crate::server::session::Session;

/// Registry of live sessions plus the secondary indexes the handlers need
/// in O(1): creator -> session, rostered user -> session, voice channel ->
/// session. A session is reachable from every index exactly until it is
/// removed; `remove` clears all of them together.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Shared<Session>>,
    by_creator: DashMap<UserId, SessionId>,
    by_member: DashMap<UserId, SessionId>,
    by_voice: DashMap<ChannelId, SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly created session. The roster is expected to hold
    /// only the creator at this point.
    pub fn insert(&self, session: Session) -> Shared<Session> {
        let id = session.id.clone();
        self.by_creator.insert(session.creator, id.clone());
        self.by_member.insert(session.creator, id.clone());
        self.by_voice.insert(session.voice_channel, id.clone());
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone());
        shared
    }

    pub fn get(&self, id: &SessionId) -> Option<Shared<Session>> {
        self.sessions.get(id).map(|e| e.value().clone())
    }

    pub fn session_of_creator(&self, user: UserId) -> Option<SessionId> {
        self.by_creator.get(&user).map(|e| e.value().clone())
    }

    pub fn session_of_member(&self, user: UserId) -> Option<SessionId> {
        self.by_member.get(&user).map(|e| e.value().clone())
    }

    pub fn session_of_voice(&self, channel: ChannelId) -> Option<SessionId> {
        self.by_voice.get(&channel).map(|e| e.value().clone())
    }

    /// Records that `user` joined the session's roster.
    pub fn index_member(&self, user: UserId, id: &SessionId) {
        self.by_member.insert(user, id.clone());
    }

    /// Clears the membership index entry for `user`, but only if it still
    /// points at `id`; a stale event must not clobber a newer membership.
    pub fn unindex_member(&self, user: UserId, id: &SessionId) {
        self.by_member.remove_if(&user, |_, current| current == id);
    }

    /// Removes the session and every index entry that still refers to it.
    /// The caller holds the session lock.
    pub fn remove(&self, session: &Session) {
        self.sessions.remove(&session.id);
        self.by_creator
            .remove_if(&session.creator, |_, current| *current == session.id);
        self.by_voice
            .remove_if(&session.voice_channel, |_, current| *current == session.id);
        for user in &session.roster {
            self.unindex_member(*user, &session.id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of all live sessions. The sweep collects handles first and
    /// locks them one at a time, never while iterating the map.
    pub fn collect(&self) -> Vec<(SessionId, Shared<Session>)> {
        self.sessions
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Whether any live session in the guild still uses this category.
    pub fn category_in_use(&self, category: ChannelId) -> bool {
        // Field reads only; try_lock is fine because every locker holds the
        // lock across short critical sections and the sweep retries later.
        self.sessions.iter().any(|e| match e.value().try_lock() {
            Ok(session) => session.category == category,
            Err(_) => true,
        })
    }
}
