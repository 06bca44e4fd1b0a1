use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Success/failure wrapper every backend response is sent in.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_savings: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents_online: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents_total: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub active_instances: u64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub monthly_savings_estimate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewClient {
    pub name: String,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedClient {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSummary {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents_online: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents_total: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub active_instances: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub manual_switches_today: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub model_switches_today: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_savings: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub monthly_savings_estimate: Option<f64>,
    #[serde(default)]
    pub last_decision: Option<LastDecision>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LastDecision {
    pub decision: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub target_pool_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Agent {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub logical_agent_id: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub auto_switch_enabled: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub auto_terminate_enabled: bool,
    #[serde(
        default,
        rename = "minutes_since_heartbeat",
        alias = "last_heartbeat_minutes_ago",
        deserialize_with = "lenient::opt_minutes"
    )]
    pub last_heartbeat_minutes_ago: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub instance_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub recent_switches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceMode {
    Spot,
    #[serde(alias = "on-demand", alias = "on_demand")]
    Ondemand,
    #[serde(other)]
    Unknown,
}

impl InstanceMode {
    pub fn label(self) -> &'static str {
        match self {
            InstanceMode::Spot => "Spot",
            InstanceMode::Ondemand => "On-Demand",
            InstanceMode::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Instance {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub instance_type: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub az: Option<String>,
    pub current_mode: InstanceMode,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub current_pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub spot_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub ondemand_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings_percent: f64,
    #[serde(default)]
    pub agent_hostname: Option<String>,
}

/// Response of the instance pools endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstancePools {
    pub current: CurrentPool,
    #[serde(default)]
    pub alternate_pools: Vec<PoolOffer>,
    pub ondemand: OnDemandOffer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentPool {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub spot_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ondemand_price: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoolOffer {
    #[serde(deserialize_with = "lenient::id")]
    pub pool_id: String,
    #[serde(default)]
    pub az: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub spot_price: f64,
    #[serde(
        default,
        rename = "savings_vs_od",
        alias = "savings_vs_ondemand",
        deserialize_with = "lenient::number"
    )]
    pub savings_vs_on_demand: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OnDemandOffer {
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchRequest {
    pub target_mode: InstanceMode,
    pub target_pool_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchTrigger {
    Manual,
    Model,
    Scheduled,
    Auto,
    #[serde(other)]
    Unknown,
}

impl SwitchTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            SwitchTrigger::Manual => "manual",
            SwitchTrigger::Model => "model",
            SwitchTrigger::Scheduled => "scheduled",
            SwitchTrigger::Auto => "auto",
            SwitchTrigger::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
    Pending,
    InProgress,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwitchEvent {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub instance_id: Option<String>,
    pub event_trigger: SwitchTrigger,
    #[serde(default)]
    pub from_mode: Option<InstanceMode>,
    #[serde(default)]
    pub to_mode: Option<InstanceMode>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub from_pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub to_pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings_impact: f64,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SavingsSummary {
    #[serde(default)]
    pub daily: Vec<DailySavings>,
    #[serde(default)]
    pub monthly: Vec<MonthlySavings>,
    #[serde(default)]
    pub by_instance_type: Vec<InstanceTypeSavings>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySavings {
    pub date: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub switch_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthlySavings {
    pub year: i32,
    pub month: u32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceTypeSavings {
    pub instance_type: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_savings: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub switch_count: u64,
}

/// One row of recent agent telemetry; the agent-reported body is kept as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveEvent {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub logical_agent_id: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub seconds_ago: Option<f64>,
    #[serde(default)]
    pub received_at: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_min_savings_percent", deserialize_with = "lenient::number")]
    pub min_savings_percent: f64,
    #[serde(default = "default_risk_threshold", deserialize_with = "lenient::number")]
    pub risk_threshold: f64,
    #[serde(default = "default_max_switches_per_week")]
    pub max_switches_per_week: u32,
    #[serde(default = "default_min_pool_duration_hours")]
    pub min_pool_duration_hours: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            min_savings_percent: default_min_savings_percent(),
            risk_threshold: default_risk_threshold(),
            max_switches_per_week: default_max_switches_per_week(),
            min_pool_duration_hours: default_min_pool_duration_hours(),
        }
    }
}

fn default_min_savings_percent() -> f64 {
    10.0
}

fn default_risk_threshold() -> f64 {
    0.7
}

fn default_max_switches_per_week() -> u32 {
    3
}

fn default_min_pool_duration_hours() -> u32 {
    24
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalStats {
    pub totals: StatTotals,
    pub switches: SwitchCounts,
    #[serde(default)]
    pub daily_savings: Vec<DailySavingsPoint>,
    #[serde(default)]
    pub top_client: Option<TopClient>,
    #[serde(default)]
    pub system_health: Option<ComponentHealth>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub monthly_projection: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatTotals {
    #[serde(default, deserialize_with = "lenient::count")]
    pub clients: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub instances: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SwitchCounts {
    #[serde(default, deserialize_with = "lenient::count")]
    pub manual_today: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub model_today: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_24h: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySavingsPoint {
    pub date: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopClient {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ComponentHealth {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub decision_engine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemHealth {
    pub database: DatabaseHealth,
    pub backend: BackendHealth,
    #[serde(default)]
    pub decision_engine: DecisionEngineStatus,
    #[serde(default)]
    pub recent_errors: Vec<SystemEventRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub connections: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub clients: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub agents: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
}

/// Empty when no engine is active.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DecisionEngineStatus {
    #[serde(default)]
    pub engine_type: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: bool,
    #[serde(default)]
    pub loaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemEventRecord {
    pub event_type: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_rows_normalize_mysql_values() {
        let agent: Agent = serde_json::from_value(json!({
            "id": 17,
            "logical_agent_id": "web-1",
            "hostname": "ip-10-0-0-4",
            "enabled": 1,
            "auto_switch_enabled": "0",
            "auto_terminate_enabled": true,
            "minutes_since_heartbeat": "7",
            "instance_count": 3,
            "recent_switches": null,
            "min_savings_percent": "15.00"
        }))
        .unwrap();

        assert_eq!(agent.id, "17");
        assert!(agent.enabled);
        assert!(!agent.auto_switch_enabled);
        assert!(agent.auto_terminate_enabled);
        assert_eq!(agent.last_heartbeat_minutes_ago, Some(7));
        assert_eq!(agent.instance_count, 3);
        assert_eq!(agent.recent_switches, 0);
    }

    #[test]
    fn agent_without_heartbeat_has_no_minutes() {
        let agent: Agent = serde_json::from_value(json!({
            "id": "a-1",
            "minutes_since_heartbeat": null
        }))
        .unwrap();
        assert_eq!(agent.last_heartbeat_minutes_ago, None);
    }

    #[test]
    fn unknown_enum_strings_decode_to_unknown() {
        let event: SwitchEvent = serde_json::from_value(json!({
            "id": 9,
            "timestamp": "2026-10-01T10:00:00",
            "event_trigger": "emergency",
            "from_mode": "spot",
            "to_mode": "on-demand",
            "execution_status": "rolled_back",
            "savings_impact": "1.25"
        }))
        .unwrap();

        assert_eq!(event.event_trigger, SwitchTrigger::Unknown);
        assert_eq!(event.to_mode, Some(InstanceMode::Ondemand));
        assert_eq!(event.execution_status, ExecutionStatus::Unknown);
        assert_eq!(event.savings_impact, 1.25);
    }

    #[test]
    fn pool_offers_accept_both_savings_spellings() {
        let pools: InstancePools = serde_json::from_value(json!({
            "current": {"pool_id": "p-cur", "spot_price": 0.05, "ondemand_price": 0.2},
            "alternate_pools": [
                {"pool_id": "p-a", "spot_price": 0.03, "savings_vs_od": 85.0},
                {"pool_id": 42, "spot_price": "0.04", "savings_vs_ondemand": 80}
            ],
            "ondemand": {"price": 0.2}
        }))
        .unwrap();

        assert_eq!(pools.alternate_pools[0].savings_vs_on_demand, 85.0);
        assert_eq!(pools.alternate_pools[1].pool_id, "42");
        assert_eq!(pools.alternate_pools[1].savings_vs_on_demand, 80.0);
    }

    #[test]
    fn switch_request_serializes_null_pool_for_on_demand() {
        let body = serde_json::to_value(SwitchRequest {
            target_mode: InstanceMode::Ondemand,
            target_pool_id: None,
        })
        .unwrap();
        assert_eq!(body, json!({"target_mode": "ondemand", "target_pool_id": null}));
    }

    #[test]
    fn empty_agent_config_uses_backend_defaults() {
        let config: AgentConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.max_switches_per_week, 3);
    }
}
