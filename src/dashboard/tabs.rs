use std::fmt;
use std::str::FromStr;

use crate::api::{Agent, Instance, LiveEvent, SavingsSummary, SwitchEvent};
use crate::types::ConsoleError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DashboardTab {
    #[default]
    Agents,
    Instances,
    History,
    Savings,
    LiveData,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 5] = [
        DashboardTab::Agents,
        DashboardTab::Instances,
        DashboardTab::History,
        DashboardTab::Savings,
        DashboardTab::LiveData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DashboardTab::Agents => "agents",
            DashboardTab::Instances => "instances",
            DashboardTab::History => "history",
            DashboardTab::Savings => "savings",
            DashboardTab::LiveData => "live-data",
        }
    }
}

impl fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DashboardTab {
    type Err = ConsoleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        DashboardTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == raw)
            .ok_or_else(|| ConsoleError::Validation(format!("unknown dashboard tab `{raw}`")))
    }
}

/// The payload fetched for exactly one tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabPayload {
    Agents(Vec<Agent>),
    Instances(Vec<Instance>),
    History(Vec<SwitchEvent>),
    Savings(SavingsSummary),
    LiveData(Vec<LiveEvent>),
}

impl TabPayload {
    pub fn tab(&self) -> DashboardTab {
        match self {
            TabPayload::Agents(_) => DashboardTab::Agents,
            TabPayload::Instances(_) => DashboardTab::Instances,
            TabPayload::History(_) => DashboardTab::History,
            TabPayload::Savings(_) => DashboardTab::Savings,
            TabPayload::LiveData(_) => DashboardTab::LiveData,
        }
    }
}
