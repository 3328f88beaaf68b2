//! The per-session one-shot confirmation deadline. The periodic sweep
//! re-derives the same deadline from `confirmation_started_at`, so a lost
//! handle is recovered within one sweep interval; the status guard makes
//! the two mechanisms converge on a single application.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::common::types::{SessionId, UserId};
use crate::engine::lifecycle::update_status;
use crate::render;
use crate::server::AppState;
use crate::server::session::{Session, SessionStatus};
use crate::voice;

/// Arms the one-shot deadline for a session that just entered `Confirming`.
/// The handle is owned by the session record and aborted on any transition
/// out of the phase.
pub(crate) fn schedule(state: &Arc<AppState>, session: &mut Session) {
    let delay = Duration::from_secs(state.config.lfg.confirm_timeout_secs);
    let state = Arc::clone(state);
    let id = session.id.clone();
    session.confirm_timer = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        expire_confirmation(&state, &id, false).await;
    }));
}

/// Resolves an elapsed confirmation deadline. Entered from the one-shot
/// timer (`from_sweep == false`) or from the periodic sweep when the
/// one-shot was lost. A session that already left `Confirming` is a stale
/// event and is left untouched.
pub async fn expire_confirmation(state: &Arc<AppState>, id: &SessionId, from_sweep: bool) {
    let Some(shared) = state.store.get(id) else {
        debug!("Confirmation timeout for unknown session {}", id);
        return;
    };
    let mut session = shared.lock().await;
    if session.status != SessionStatus::Confirming {
        debug!("Stale confirmation timeout for session {}", id);
        return;
    }
    apply_timeout(state, &mut session, from_sweep).await;
}

/// The shared timeout transition: drop everyone who failed to confirm,
/// keep the creator plus all confirmed players in roster order, and reopen.
/// The caller holds the session lock and has verified the phase.
pub(crate) async fn apply_timeout(state: &AppState, session: &mut Session, abort_handle: bool) {
    if abort_handle {
        // The one-shot reference was lost or belongs to another task.
        session.cancel_confirm_timer();
    } else {
        // Running inside the one-shot itself; dropping the handle detaches.
        session.release_confirm_timer();
    }

    let creator = session.creator;
    let dropped: Vec<UserId> = session
        .unconfirmed()
        .into_iter()
        .filter(|u| *u != creator)
        .collect();
    session
        .roster
        .retain(|u| *u == creator || session.confirmed.contains(u));
    for user in &dropped {
        state.store.unindex_member(*user, &session.id);
    }
    info!(
        "Confirmation timed out for session {}: keeping {} player(s), dropping {}",
        session.id,
        session.roster.len(),
        dropped.len()
    );

    voice::revoke_all(state.provisioner.as_ref(), session.voice_channel, &dropped).await;

    session.confirmed.clear();
    session.status = SessionStatus::Waiting;

    let payload = render::reopened(session);
    update_status(state, session, &payload).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lifecycle::{confirm, create_session, decline, join};
    use crate::engine::testutil::{fresh_state, request};

    #[tokio::test]
    async fn timeout_retains_the_creator_and_everyone_who_confirmed() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 5)).await.unwrap();
        for user in 2..=5 {
            join(&state, &created.session_id, UserId(user)).await.unwrap();
        }
        confirm(&state, &created.session_id, UserId(2)).await.unwrap();
        confirm(&state, &created.session_id, UserId(3)).await.unwrap();

        expire_confirmation(&state, &created.session_id, true).await;

        let shared = state.store.get(&created.session_id).unwrap();
        let session = shared.lock().await;
        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.roster, vec![UserId(1), UserId(2), UserId(3)]);
        assert!(session.confirmed.is_empty());
        assert!(session.confirm_timer.is_none());
        drop(session);

        for dropped in [UserId(4), UserId(5)] {
            assert!(state.store.session_of_member(dropped).is_none());
            assert_eq!(platform.permission(created.voice_channel, dropped), None);
        }
        assert!(state.store.session_of_member(UserId(2)).is_some());
    }

    #[tokio::test]
    async fn timeout_with_only_the_creator_confirmed_leaves_only_the_creator() {
        let (state, _platform) = fresh_state();
        let created = create_session(&state, request(1, 3)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();
        join(&state, &created.session_id, UserId(3)).await.unwrap();
        confirm(&state, &created.session_id, UserId(1)).await.unwrap();

        expire_confirmation(&state, &created.session_id, true).await;

        let shared = state.store.get(&created.session_id).unwrap();
        let session = shared.lock().await;
        assert_eq!(session.roster, vec![UserId(1)]);
        assert_eq!(session.status, SessionStatus::Waiting);
        assert!(session.confirmed.is_empty());
    }

    #[tokio::test]
    async fn timeout_after_a_phase_change_is_a_no_op() {
        let (state, _platform) = fresh_state();
        let created = create_session(&state, request(1, 2)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();
        decline(&state, &created.session_id, UserId(2)).await.unwrap();

        expire_confirmation(&state, &created.session_id, true).await;

        let shared = state.store.get(&created.session_id).unwrap();
        let session = shared.lock().await;
        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.roster, vec![UserId(1)]);
    }

    #[tokio::test]
    async fn timeout_for_a_removed_session_is_a_no_op() {
        let (state, _platform) = fresh_state();
        let gone = SessionId("1-0-aaaaaa".to_string());
        expire_confirmation(&state, &gone, false).await;
        assert!(state.store.is_empty());
    }
}
