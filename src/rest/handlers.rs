use crate::rest::models::{HealthResponse, StatsResponse};
use crate::server::AppState;
use crate::server::session::SessionStatus;
use axum::{extract::State, response::Json};
use std::sync::Arc;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_ms: state.start_time.elapsed().as_millis(),
        active_sessions: state.store.len(),
    })
}

/// GET /v1/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let mut response = StatsResponse {
        sessions: state.store.len(),
        categories: state.categories.len(),
        ..Default::default()
    };
    for (_, shared) in state.store.collect() {
        let session = shared.lock().await;
        match session.status {
            SessionStatus::Waiting => response.waiting += 1,
            SessionStatus::Confirming => response.confirming += 1,
            SessionStatus::Active => response.active += 1,
            SessionStatus::Ended => {}
        }
    }
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{fresh_state, request};
    use crate::engine::{create_session, join};
    use crate::common::types::UserId;

    #[tokio::test]
    async fn stats_counts_sessions_by_phase() {
        let (state, _platform) = fresh_state();
        create_session(&state, request(1, 3)).await.unwrap();
        let full = create_session(&state, request(2, 2)).await.unwrap();
        join(&state, &full.session_id, UserId(3)).await.unwrap();

        let Json(body) = stats(State(state.clone())).await;
        assert_eq!(body.sessions, 2);
        assert_eq!(body.waiting, 1);
        assert_eq!(body.confirming, 1);
        assert_eq!(body.active, 0);

        let Json(health) = health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.active_sessions, 2);
    }
}
