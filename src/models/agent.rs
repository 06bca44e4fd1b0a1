use serde::Serialize;

use crate::api::Agent;

/// Minutes of silence after which an agent is flagged.
pub const HEARTBEAT_WARNING_MINUTES: i64 = 5;
pub const HEARTBEAT_OFFLINE_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    NeverConnected,
    Online,
    Warning,
    Offline,
}

impl HeartbeatStatus {
    pub fn from_minutes(minutes_ago: Option<i64>) -> Self {
        match minutes_ago {
            None => HeartbeatStatus::NeverConnected,
            Some(minutes) if minutes < HEARTBEAT_WARNING_MINUTES => HeartbeatStatus::Online,
            Some(minutes) if minutes < HEARTBEAT_OFFLINE_MINUTES => HeartbeatStatus::Warning,
            Some(_) => HeartbeatStatus::Offline,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HeartbeatStatus::NeverConnected => "Never connected",
            HeartbeatStatus::Online => "Online",
            HeartbeatStatus::Warning => "Warning",
            HeartbeatStatus::Offline => "Offline",
        }
    }
}

impl Agent {
    /// Derived on every call; the value is never stored alongside the agent.
    pub fn heartbeat_status(&self) -> HeartbeatStatus {
        HeartbeatStatus::from_minutes(self.last_heartbeat_minutes_ago)
    }

    pub fn display_name(&self) -> &str {
        self.logical_agent_id
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or(&self.id)
    }
}
