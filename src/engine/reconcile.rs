//! Reactive reconciliation between the authoritative roster and the outside
//! world: voice-channel joins by non-members, and members removed from the
//! guild by moderation.

use std::sync::Arc;

use tracing::{info, warn};

use crate::common::types::{ChannelId, UserId};
use crate::engine::lifecycle::{end_session, update_status};
use crate::render;
use crate::server::AppState;
use crate::server::session::SessionStatus;
use crate::voice;

/// Reaction to a user connecting to a voice channel. Anyone connected to a
/// session's channel who is not on its roster is disconnected.
pub async fn handle_voice_join(state: &Arc<AppState>, channel: ChannelId, user: UserId) {
    let Some(id) = state.store.session_of_voice(channel) else {
        return;
    };
    let Some(shared) = state.store.get(&id) else {
        return;
    };
    let session = shared.lock().await;
    if session.is_member(user) {
        return;
    }
    info!(
        "Disconnecting {} from session {} voice channel: not a member",
        user, session.id
    );
    if let Err(e) = state.provisioner.disconnect_user(channel, user).await {
        warn!("Failed to disconnect intruder {} from {}: {}", user, channel, e);
    }
}

/// Reaction to a user being removed from the guild (kick/ban). The creator
/// slot never transfers: losing the creator forcibly ends the session.
/// Other members are dropped from whatever phase the session is in.
pub async fn handle_member_removed(state: &Arc<AppState>, user: UserId) {
    let Some(id) = state.store.session_of_member(user) else {
        return;
    };
    let Some(shared) = state.store.get(&id) else {
        return;
    };
    let mut session = shared.lock().await;

    if user == session.creator {
        info!(
            "Creator {} removed from guild, ending session {}",
            user, session.id
        );
        end_session(state, &mut session, &render::ended(user)).await;
        return;
    }

    session.roster.retain(|u| *u != user);
    session.confirmed.remove(&user);
    state.store.unindex_member(user, &session.id);
    voice::revoke(state.provisioner.as_ref(), session.voice_channel, user).await;
    if session.status == SessionStatus::Confirming {
        // Capacity is no longer met; drop back to open recruitment.
        session.cancel_confirm_timer();
        session.confirmed.clear();
        session.status = SessionStatus::Waiting;
    }
    info!("Removed member {} from session {}", user, session.id);

    // An Active session stays active with a smaller team; it never offers
    // a Join control again.
    let payload = if session.status == SessionStatus::Active {
        render::match_ready(&session)
    } else {
        render::reopened(&session)
    };
    update_status(state, &mut session, &payload).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lifecycle::{confirm, create_session, join};
    use crate::engine::testutil::{ORIGIN, fresh_state, request};

    #[tokio::test]
    async fn intruders_are_disconnected_and_members_are_not() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 3)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();

        platform.connect(created.voice_channel, UserId(2));
        platform.connect(created.voice_channel, UserId(9));

        handle_voice_join(&state, created.voice_channel, UserId(2)).await;
        handle_voice_join(&state, created.voice_channel, UserId(9)).await;

        assert!(platform.connections.contains(&(created.voice_channel, UserId(2))));
        assert!(!platform.connections.contains(&(created.voice_channel, UserId(9))));
    }

    #[tokio::test]
    async fn joins_to_unmanaged_channels_are_ignored() {
        let (state, platform) = fresh_state();
        let stray = ChannelId(777);
        platform.connect(stray, UserId(9));
        handle_voice_join(&state, stray, UserId(9)).await;
        assert!(platform.connections.contains(&(stray, UserId(9))));
    }

    #[tokio::test]
    async fn losing_the_creator_ends_the_session() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 3)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();

        handle_member_removed(&state, UserId(1)).await;

        assert!(state.store.get(&created.session_id).is_none());
        assert!(state.store.session_of_member(UserId(2)).is_none());
        assert!(!platform.channel_exists(created.voice_channel));
    }

    #[tokio::test]
    async fn losing_a_member_mid_confirmation_reopens_the_session() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 2)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();

        handle_member_removed(&state, UserId(2)).await;

        let shared = state.store.get(&created.session_id).unwrap();
        let session = shared.lock().await;
        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.roster, vec![UserId(1)]);
        assert!(session.confirmed.is_empty());
        assert!(session.confirm_timer.is_none());
        assert_eq!(platform.permission(created.voice_channel, UserId(2)), None);
    }

    #[tokio::test]
    async fn losing_a_member_from_an_active_session_keeps_it_active() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 3)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();
        join(&state, &created.session_id, UserId(3)).await.unwrap();
        for user in 1..=3 {
            confirm(&state, &created.session_id, UserId(user)).await.unwrap();
        }

        handle_member_removed(&state, UserId(3)).await;

        let shared = state.store.get(&created.session_id).unwrap();
        let session = shared.lock().await;
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.roster, vec![UserId(1), UserId(2)]);
        drop(session);

        // The team stays formed; no recruitment controls come back.
        let payload = platform.last_payload_in(ORIGIN).unwrap();
        assert!(payload.buttons.is_empty());
        assert!(payload.title.contains("Match Found"));
    }

    #[tokio::test]
    async fn removals_of_unrostered_users_are_ignored() {
        let (state, _platform) = fresh_state();
        create_session(&state, request(1, 3)).await.unwrap();
        handle_member_removed(&state, UserId(42)).await;
        assert_eq!(state.store.len(), 1);
    }
}
