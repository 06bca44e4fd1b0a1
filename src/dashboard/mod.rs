//! Per-client dashboard: a shared summary plus the payload of the active tab.

mod loader;
mod state;
mod tabs;

pub use loader::{DashboardSource, TabLoader, TabQuery};
pub use state::{DashboardKey, DashboardState, LoadTicket, TabData};
pub use tabs::{DashboardTab, TabPayload};
