//! The session lifecycle state machine. Every handler locks the session,
//! re-checks `status` before acting (a stale button press or timer firing
//! is a no-op, not an error), applies the roster mutation, and only then
//! performs the best-effort voice/message side effects.

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog;
use crate::common::errors::LfgError;
use crate::common::types::{ChannelId, GuildId, MessageId, SessionId, UserId, now_ms};
use crate::engine::timeout;
use crate::platform::VoicePermissions;
use crate::protocol::{CreateSessionRequest, StatusPayload};
use crate::render;
use crate::server::session::{MAX_CAPACITY, MIN_CAPACITY, Session, SessionStatus};
use crate::server::AppState;
use crate::voice;

#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub voice_channel: ChannelId,
    pub status_message: Option<MessageId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The user was already rostered; surfaced as "already in", not an error.
    AlreadyIn,
    /// This join filled the team and started the confirmation phase.
    TeamFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed { remaining: usize },
    AlreadyConfirmed,
    /// Everyone confirmed; the session is now active.
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineOutcome {
    /// The creator declined; the whole session was torn down.
    SessionCancelled,
    /// A non-creator declined; the session reopened for new joiners.
    Reopened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    /// The roster became empty and the session was closed.
    SessionClosed,
}

/// Edits the session's status message, falling back to posting a fresh one
/// when the original can no longer be edited.
pub(crate) async fn update_status(state: &AppState, session: &mut Session, payload: &StatusPayload) {
    if let Some(message) = session.status_message {
        match state
            .messenger
            .edit_status(session.origin_channel, message, payload)
            .await
        {
            Ok(()) => return,
            Err(e) => warn!(
                "Failed to edit status message {} for session {}: {}",
                message, session.id, e
            ),
        }
    }
    match state
        .messenger
        .post_status(session.origin_channel, payload)
        .await
    {
        Ok(message) => session.status_message = Some(message),
        Err(e) => warn!("Failed to post status for session {}: {}", session.id, e),
    }
}

/// Tears the session down: cancels any pending timer, removes it from the
/// store and its indexes, deletes the owned voice channel and replaces the
/// status message with the closing payload. The caller holds the lock.
pub(crate) async fn end_session(state: &AppState, session: &mut Session, payload: &StatusPayload) {
    session.cancel_confirm_timer();
    session.status = SessionStatus::Ended;
    state.store.remove(session);
    voice::delete_channel(state.provisioner.as_ref(), session.voice_channel).await;
    update_status(state, session, payload).await;
}

async fn get_or_create_category(
    state: &AppState,
    guild: GuildId,
    game: &'static catalog::GameDef,
) -> Result<ChannelId, LfgError> {
    let key = (guild, game.slug.to_string());
    if let Some(id) = state.categories.get(&key) {
        return Ok(*id);
    }
    let name = format!("🎮 {}", game.name);
    let id = state
        .provisioner
        .create_category(guild, &name)
        .await
        .map_err(|e| LfgError::Provisioning(e.to_string()))?;
    info!("Created category {} ({})", name, id);
    state.categories.insert(key, id);
    Ok(id)
}

/// Opens a new session. The creator implicitly joins their own session and
/// is granted voice access through the channel's initial overwrites.
pub async fn create_session(
    state: &Arc<AppState>,
    req: CreateSessionRequest,
) -> Result<CreatedSession, LfgError> {
    let game = catalog::find(&req.game).ok_or_else(|| LfgError::UnknownGame(req.game.clone()))?;
    let mode = game
        .modes
        .iter()
        .find(|m| m.eq_ignore_ascii_case(&req.mode))
        .ok_or_else(|| LfgError::InvalidMode {
            game: game.name.to_string(),
            mode: req.mode.clone(),
            available: game.modes_joined(),
        })?;
    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&req.capacity) {
        return Err(LfgError::CapacityOutOfRange {
            min: MIN_CAPACITY,
            max: MAX_CAPACITY,
        });
    }
    if let Some(expected) = state.settings.lfg_channel(req.guild_id) {
        if expected != req.origin_channel_id {
            return Err(LfgError::WrongChannel { expected });
        }
    }
    if state.store.session_of_creator(req.user_id).is_some() {
        return Err(LfgError::AlreadyOwnsSession);
    }
    if state.store.session_of_member(req.user_id).is_some() {
        return Err(LfgError::AlreadyInAnotherSession);
    }

    let category = get_or_create_category(state, req.guild_id, game).await?;
    let channel_name = format!("{} - {}", game.name, req.user_id);
    let voice_channel = state
        .provisioner
        .create_voice_channel(
            req.guild_id,
            &channel_name,
            category,
            &[(req.user_id, VoicePermissions::MEMBER)],
        )
        .await
        .map_err(|e| LfgError::Provisioning(e.to_string()))?;

    // The provisioning awaits are suspension points; a concurrent create by
    // the same user may have registered meanwhile. Re-check both guards
    // before touching the store, and tear the fresh channel down if so.
    if state.store.session_of_creator(req.user_id).is_some() {
        voice::delete_channel(state.provisioner.as_ref(), voice_channel).await;
        return Err(LfgError::AlreadyOwnsSession);
    }
    if state.store.session_of_member(req.user_id).is_some() {
        voice::delete_channel(state.provisioner.as_ref(), voice_channel).await;
        return Err(LfgError::AlreadyInAnotherSession);
    }

    let session = Session::new(
        req.user_id,
        req.guild_id,
        req.origin_channel_id,
        voice_channel,
        category,
        game,
        mode.to_string(),
        req.capacity as usize,
        req.note,
    );
    let session_id = session.id.clone();
    let shared = state.store.insert(session);
    let mut session = shared.lock().await;

    let payload = render::session_status(&session);
    update_status(state, &mut session, &payload).await;

    info!(
        "Created session {} ({} {}, capacity {}) for {}",
        session_id, game.name, mode, req.capacity, req.user_id
    );
    Ok(CreatedSession {
        session_id,
        voice_channel,
        status_message: session.status_message,
    })
}

pub async fn join(
    state: &Arc<AppState>,
    id: &SessionId,
    user: UserId,
) -> Result<JoinOutcome, LfgError> {
    let shared = state.store.get(id).ok_or(LfgError::SessionNotFound)?;
    let mut session = shared.lock().await;

    if session.is_member(user) {
        return Ok(JoinOutcome::AlreadyIn);
    }
    if session.is_full() {
        return Err(LfgError::SessionFull);
    }
    if session.status != SessionStatus::Waiting {
        return Err(LfgError::WrongPhase);
    }
    if state.store.session_of_member(user).is_some() {
        return Err(LfgError::AlreadyInAnotherSession);
    }

    session.roster.push(user);
    state.store.index_member(user, &session.id);
    voice::grant(state.provisioner.as_ref(), session.voice_channel, user).await;

    if session.is_full() {
        session.status = SessionStatus::Confirming;
        session.confirmed.clear();
        session.confirmation_started_at = Some(now_ms());
        timeout::schedule(state, &mut session);
        info!("Session {} is full, confirmation phase started", session.id);

        let payload = render::confirmation_started(&session);
        update_status(state, &mut session, &payload).await;
        Ok(JoinOutcome::TeamFull)
    } else {
        let payload = render::session_status(&session);
        update_status(state, &mut session, &payload).await;
        Ok(JoinOutcome::Joined)
    }
}

pub async fn confirm(
    state: &Arc<AppState>,
    id: &SessionId,
    user: UserId,
) -> Result<ConfirmOutcome, LfgError> {
    let shared = state.store.get(id).ok_or(LfgError::SessionNotFound)?;
    let mut session = shared.lock().await;

    if !session.is_member(user) {
        return Err(LfgError::NotInSession);
    }
    if session.status != SessionStatus::Confirming {
        return Err(LfgError::WrongPhase);
    }
    if !session.confirmed.insert(user) {
        return Ok(ConfirmOutcome::AlreadyConfirmed);
    }

    if session.confirmed.len() == session.roster.len() {
        session.cancel_confirm_timer();
        session.status = SessionStatus::Active;
        session.activated_at = Some(now_ms());
        info!("Session {} fully confirmed, team is ready", session.id);

        let payload = render::match_ready(&session);
        update_status(state, &mut session, &payload).await;
        Ok(ConfirmOutcome::Finalized)
    } else {
        Ok(ConfirmOutcome::Confirmed {
            remaining: session.roster.len() - session.confirmed.len(),
        })
    }
}

pub async fn decline(
    state: &Arc<AppState>,
    id: &SessionId,
    user: UserId,
) -> Result<DeclineOutcome, LfgError> {
    let shared = state.store.get(id).ok_or(LfgError::SessionNotFound)?;
    let mut session = shared.lock().await;

    if !session.is_member(user) {
        return Err(LfgError::NotInSession);
    }
    if session.status != SessionStatus::Confirming {
        return Err(LfgError::WrongPhase);
    }

    if user == session.creator {
        info!("Creator declined, cancelling session {}", session.id);
        end_session(state, &mut session, &render::cancelled()).await;
        return Ok(DeclineOutcome::SessionCancelled);
    }

    session.cancel_confirm_timer();
    session.roster.retain(|u| *u != user);
    // Leaving Confirming invalidates everyone's confirmation, not just the
    // decliner's; the next confirmation phase starts from an empty set.
    session.confirmed.clear();
    state.store.unindex_member(user, &session.id);
    session.status = SessionStatus::Waiting;
    voice::revoke(state.provisioner.as_ref(), session.voice_channel, user).await;
    info!("Player {} declined, reopening session {}", user, session.id);

    let payload = render::reopened(&session);
    update_status(state, &mut session, &payload).await;
    Ok(DeclineOutcome::Reopened)
}

pub async fn leave(
    state: &Arc<AppState>,
    id: &SessionId,
    user: UserId,
) -> Result<LeaveOutcome, LfgError> {
    let shared = state.store.get(id).ok_or(LfgError::SessionNotFound)?;
    let mut session = shared.lock().await;

    if !session.is_member(user) {
        return Err(LfgError::NotInSession);
    }
    if user == session.creator {
        return Err(LfgError::CreatorCannotLeave);
    }
    if session.status != SessionStatus::Waiting {
        return Err(LfgError::WrongPhase);
    }

    session.roster.retain(|u| *u != user);
    session.confirmed.remove(&user);
    state.store.unindex_member(user, &session.id);
    voice::revoke(state.provisioner.as_ref(), session.voice_channel, user).await;
    info!("Player {} left session {}", user, session.id);

    if session.roster.is_empty() {
        end_session(state, &mut session, &render::empty()).await;
        return Ok(LeaveOutcome::SessionClosed);
    }

    let payload = render::reopened(&session);
    update_status(state, &mut session, &payload).await;
    Ok(LeaveOutcome::Left)
}

/// Ends the session owned by `creator`, whatever phase it is in.
pub async fn terminate(state: &Arc<AppState>, creator: UserId) -> Result<SessionId, LfgError> {
    let id = state
        .store
        .session_of_creator(creator)
        .ok_or(LfgError::NoOwnedSession)?;
    let shared = state.store.get(&id).ok_or(LfgError::NoOwnedSession)?;
    let mut session = shared.lock().await;

    info!("Creator {} ended session {}", creator, session.id);
    end_session(state, &mut session, &render::ended(creator)).await;
    Ok(id)
}
