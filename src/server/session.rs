use std::collections::HashSet;

use tokio::task::JoinHandle;

use crate::catalog::GameDef;
use crate::common::types::{ChannelId, GuildId, MessageId, SessionId, UserId, now_ms};

pub const MIN_CAPACITY: u8 = 2;
pub const MAX_CAPACITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Waiting,
    Confirming,
    Active,
    Ended,
}

/// One team-formation request and its evolving roster. The record owns its
/// voice channel and its pending confirmation timer; the roster, not the
/// voice layer, is the authoritative membership.
pub struct Session {
    pub id: SessionId,
    pub creator: UserId,
    pub guild: GuildId,
    pub origin_channel: ChannelId,
    pub voice_channel: ChannelId,
    pub category: ChannelId,
    pub status_message: Option<MessageId>,
    pub game: &'static GameDef,
    pub mode: String,
    pub capacity: usize,
    pub note: Option<String>,
    /// Insertion-ordered; the creator is always the first entry.
    pub roster: Vec<UserId>,
    /// Subset of `roster`, only meaningful while `Confirming`.
    pub confirmed: HashSet<UserId>,
    pub status: SessionStatus,
    pub created_at: u64,
    /// Set on entering `Confirming`, cleared on leaving it.
    pub confirmation_started_at: Option<u64>,
    /// Set on entering `Active`, drives the bounded active-session TTL.
    pub activated_at: Option<u64>,
    /// One-shot confirmation deadline. At most one live handle per session.
    pub confirm_timer: Option<JoinHandle<()>>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creator: UserId,
        guild: GuildId,
        origin_channel: ChannelId,
        voice_channel: ChannelId,
        category: ChannelId,
        game: &'static GameDef,
        mode: String,
        capacity: usize,
        note: Option<String>,
    ) -> Self {
        let created_at = now_ms();
        Self {
            id: SessionId::generate(creator, created_at),
            creator,
            guild,
            origin_channel,
            voice_channel,
            category,
            status_message: None,
            game,
            mode,
            capacity,
            note,
            roster: vec![creator],
            confirmed: HashSet::new(),
            status: SessionStatus::Waiting,
            created_at,
            confirmation_started_at: None,
            activated_at: None,
            confirm_timer: None,
        }
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.roster.contains(&user)
    }

    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.capacity
    }

    pub fn missing_players(&self) -> usize {
        self.capacity.saturating_sub(self.roster.len())
    }

    /// Members that never confirmed during the current confirmation phase.
    pub fn unconfirmed(&self) -> Vec<UserId> {
        self.roster
            .iter()
            .filter(|u| !self.confirmed.contains(u))
            .copied()
            .collect()
    }

    /// Aborts the pending one-shot deadline, if any, and leaves the
    /// confirmation phase bookkeeping cleared. Must be called on every
    /// transition out of `Confirming` before further mutation.
    pub fn cancel_confirm_timer(&mut self) {
        if let Some(handle) = self.confirm_timer.take() {
            handle.abort();
        }
        self.confirmation_started_at = None;
    }

    /// Drops the timer handle without aborting. Used by the timeout path
    /// itself, which runs inside the very task the handle refers to.
    pub fn release_confirm_timer(&mut self) {
        self.confirm_timer = None;
        self.confirmation_started_at = None;
    }

    #[cfg(debug_assertions)]
    pub fn assert_invariants(&self) {
        debug_assert!(self.roster.len() <= self.capacity);
        debug_assert!(self.confirmed.iter().all(|u| self.roster.contains(u)));
        debug_assert_eq!(
            self.confirmation_started_at.is_some(),
            self.status == SessionStatus::Confirming
        );
        if self.status != SessionStatus::Ended {
            debug_assert_eq!(self.roster.first(), Some(&self.creator));
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.confirm_timer.take() {
            handle.abort();
        }
    }
}
