mod agent;
mod history;
mod overview;

pub use agent::{HeartbeatStatus, HEARTBEAT_OFFLINE_MINUTES, HEARTBEAT_WARNING_MINUTES};
pub use history::HistoryFilter;
pub use overview::GlobalOverview;
