mod client;
mod lenient;
mod queries;
mod types;

pub use client::{AgentFlag, ApiClient};
pub use queries::{filter_pairs, HistoryFilters, InstanceFilters, SavingsRange, FILTER_ALL};
pub use types::{
    Agent, AgentConfig, BackendHealth, ClientRecord, ClientSummary, ComponentHealth,
    CreatedClient, CurrentPool, DailySavings, DailySavingsPoint, DatabaseHealth,
    DecisionEngineStatus, Envelope, ExecutionStatus, GlobalStats, Instance, InstanceMode,
    InstancePools, InstanceTypeSavings, LastDecision, LiveEvent, MonthlySavings, NewClient,
    OnDemandOffer, PoolOffer, SavingsSummary, StatTotals, SwitchCounts, SwitchEvent,
    SwitchRequest, SwitchTrigger, SystemEventRecord, SystemHealth, TokenPayload, TopClient,
};
