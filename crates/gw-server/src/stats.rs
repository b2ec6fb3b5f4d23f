use serde::Serialize;

#[derive(Debug, Default)]
pub struct ServerStats {
    pub total_sessions_created: u64,
    pub total_tool_calls: u64,
}

#[derive(Debug, Serialize)]
pub struct ServerStatsSnapshot {
    pub started_at: f64,
    pub uptime_seconds: f64,
    pub total_sessions_created: u64,
    pub total_tool_calls: u64,
    pub active_session_count: usize,
}
