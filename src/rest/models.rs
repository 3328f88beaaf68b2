use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u128,
    pub active_sessions: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub sessions: usize,
    pub waiting: usize,
    pub confirming: usize,
    pub active: usize,
    pub categories: usize,
}
