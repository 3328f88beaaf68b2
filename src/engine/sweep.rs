//! The periodic deadline sweep: the safety net that re-derives every expiry
//! from stored timestamps, independent of per-session timers. It also reaps
//! aged-out active sessions and empty game categories.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::common::types::now_ms;
use crate::engine::lifecycle::end_session;
use crate::engine::timeout;
use crate::render;
use crate::server::AppState;
use crate::server::session::SessionStatus;

/// Spawns the sweep loop on the configured interval.
pub fn spawn(state: Arc<AppState>) -> JoinHandle<()> {
    let interval_secs = state.config.lfg.sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so a fresh process
        // does not sweep before anything can exist.
        interval.tick().await;
        loop {
            interval.tick().await;
            run_expiry_sweep(&state).await;
        }
    })
}

/// One sweep pass over every live session. Each check re-reads `status`
/// under the session lock, so a transition that raced the sweep turns the
/// corresponding action into a no-op.
pub async fn run_expiry_sweep(state: &Arc<AppState>) {
    let now = now_ms();
    let lfg = &state.config.lfg;

    for (id, shared) in state.store.collect() {
        let mut session = shared.lock().await;
        match session.status {
            SessionStatus::Confirming => {
                let started = session.confirmation_started_at.unwrap_or(session.created_at);
                if now.saturating_sub(started) >= lfg.confirm_timeout_ms() {
                    info!("Sweep found expired confirmation for session {}", id);
                    timeout::apply_timeout(state, &mut session, true).await;
                }
            }
            SessionStatus::Waiting => {
                let alone = session.roster.len() == 1;
                if alone && now.saturating_sub(session.created_at) >= lfg.no_joiner_timeout_ms() {
                    info!("Sweep expiring session {} with no joiners", id);
                    let payload = render::expired(&session, lfg.no_joiner_timeout_secs / 60);
                    end_session(state, &mut session, &payload).await;
                }
            }
            SessionStatus::Active => {
                let activated = session.activated_at.unwrap_or(session.created_at);
                if now.saturating_sub(activated) >= lfg.active_ttl_ms() {
                    info!("Sweep reaping aged-out active session {}", id);
                    end_session(state, &mut session, &render::closed()).await;
                }
            }
            SessionStatus::Ended => {}
        }
    }

    reap_empty_categories(state).await;
}

/// Deletes cached game categories that no live session references anymore.
async fn reap_empty_categories(state: &Arc<AppState>) {
    let stale: Vec<_> = state
        .categories
        .iter()
        .filter(|e| !state.store.category_in_use(*e.value()))
        .map(|e| (e.key().clone(), *e.value()))
        .collect();

    for (key, category) in stale {
        match state.provisioner.delete_channel(category).await {
            Ok(()) => info!("Deleted empty category {}", category),
            Err(e) => debug!("Could not delete category {}: {}", category, e),
        }
        state.categories.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::UserId;
    use crate::engine::lifecycle::{create_session, join, terminate};
    use crate::engine::testutil::{fresh_state, request};

    #[tokio::test]
    async fn sweep_expires_sessions_that_never_attracted_a_joiner() {
        let (state, platform) = fresh_state();
        let lonely = create_session(&state, request(1, 3)).await.unwrap();
        let busy = create_session(&state, request(2, 3)).await.unwrap();
        join(&state, &busy.session_id, UserId(3)).await.unwrap();

        let deadline = state.config.lfg.no_joiner_timeout_ms();
        for created in [&lonely, &busy] {
            let shared = state.store.get(&created.session_id).unwrap();
            shared.lock().await.created_at = now_ms() - deadline - 1;
        }

        run_expiry_sweep(&state).await;

        assert!(state.store.get(&lonely.session_id).is_none());
        assert!(!platform.channel_exists(lonely.voice_channel));
        // A session with at least one joiner never no-joiner-expires.
        assert!(state.store.get(&busy.session_id).is_some());
    }

    #[tokio::test]
    async fn sweep_recovers_a_lost_confirmation_timer() {
        let (state, _platform) = fresh_state();
        let created = create_session(&state, request(1, 2)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();

        let shared = state.store.get(&created.session_id).unwrap();
        {
            let mut session = shared.lock().await;
            // Simulate a lost one-shot: kill it and backdate the deadline.
            if let Some(handle) = session.confirm_timer.take() {
                handle.abort();
            }
            session.confirmation_started_at =
                Some(now_ms() - state.config.lfg.confirm_timeout_ms() - 1);
        }

        run_expiry_sweep(&state).await;

        let session = shared.lock().await;
        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.roster, vec![UserId(1)]);
        assert!(state.store.session_of_member(UserId(2)).is_none());
    }

    #[tokio::test]
    async fn sweep_reaps_active_sessions_past_their_ttl() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 2)).await.unwrap();
        join(&state, &created.session_id, UserId(2)).await.unwrap();
        crate::engine::lifecycle::confirm(&state, &created.session_id, UserId(1))
            .await
            .unwrap();
        crate::engine::lifecycle::confirm(&state, &created.session_id, UserId(2))
            .await
            .unwrap();

        let shared = state.store.get(&created.session_id).unwrap();
        shared.lock().await.activated_at = Some(now_ms() - state.config.lfg.active_ttl_ms() - 1);

        run_expiry_sweep(&state).await;

        assert!(state.store.get(&created.session_id).is_none());
        assert!(!platform.channel_exists(created.voice_channel));
    }

    #[tokio::test]
    async fn sweep_deletes_categories_no_session_references() {
        let (state, platform) = fresh_state();
        let created = create_session(&state, request(1, 3)).await.unwrap();
        let shared = state.store.get(&created.session_id).unwrap();
        let category = shared.lock().await.category;
        drop(shared);

        run_expiry_sweep(&state).await;
        assert!(platform.channel_exists(category));

        terminate(&state, UserId(1)).await.unwrap();
        run_expiry_sweep(&state).await;
        assert!(!platform.channel_exists(category));
        assert!(state.categories.is_empty());
    }
}
