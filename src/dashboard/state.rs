use std::collections::HashMap;

use crate::api::{Agent, ClientSummary, Instance, LiveEvent, SavingsSummary, SwitchEvent};
use crate::refresh::LoadPhase;
use crate::types::ConsoleError;

use super::tabs::{DashboardTab, TabPayload};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DashboardKey {
    pub client_id: String,
    pub tab: DashboardTab,
}

/// Issued by [`DashboardState::begin`]; results carrying an older ticket are
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    pub client_id: String,
    pub tab: DashboardTab,
}

/// Last payload fetched per tab. Switching tabs keeps what other tabs loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabData {
    pub agents: Option<Vec<Agent>>,
    pub instances: Option<Vec<Instance>>,
    pub history: Option<Vec<SwitchEvent>>,
    pub savings: Option<SavingsSummary>,
    pub live_data: Option<Vec<LiveEvent>>,
}

impl TabData {
    pub fn store(&mut self, payload: TabPayload) {
        match payload {
            TabPayload::Agents(agents) => self.agents = Some(agents),
            TabPayload::Instances(instances) => self.instances = Some(instances),
            TabPayload::History(history) => self.history = Some(history),
            TabPayload::Savings(savings) => self.savings = Some(savings),
            TabPayload::LiveData(events) => self.live_data = Some(events),
        }
    }

    pub fn has(&self, tab: DashboardTab) -> bool {
        match tab {
            DashboardTab::Agents => self.agents.is_some(),
            DashboardTab::Instances => self.instances.is_some(),
            DashboardTab::History => self.history.is_some(),
            DashboardTab::Savings => self.savings.is_some(),
            DashboardTab::LiveData => self.live_data.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !DashboardTab::ALL.into_iter().any(|tab| self.has(tab))
    }
}

/// View model of one client's dashboard. Summary and tab payload are
/// fetched together but stored, and fail, independently.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    client_id: Option<String>,
    active_tab: DashboardTab,
    phase: Option<LoadPhase>,
    refreshing: bool,
    summary: Option<ClientSummary>,
    summary_error: Option<String>,
    tabs: TabData,
    tab_errors: HashMap<DashboardTab, String>,
    generation: u64,
    outstanding: u8,
}

impl DashboardState {
    pub fn key(&self) -> Option<DashboardKey> {
        self.client_id.as_ref().map(|client_id| DashboardKey {
            client_id: client_id.clone(),
            tab: self.active_tab,
        })
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn active_tab(&self) -> DashboardTab {
        self.active_tab
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase.unwrap_or(LoadPhase::Uninitialized)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn summary(&self) -> Option<&ClientSummary> {
        self.summary.as_ref()
    }

    pub fn summary_error(&self) -> Option<&str> {
        self.summary_error.as_deref()
    }

    pub fn tabs(&self) -> &TabData {
        &self.tabs
    }

    pub fn tab_error(&self, tab: DashboardTab) -> Option<&str> {
        self.tab_errors.get(&tab).map(String::as_str)
    }

    /// Moves to another client. Everything loaded for the previous one is
    /// dropped and its pending responses are orphaned.
    pub fn select_client(&mut self, client_id: &str) {
        if self.client_id.as_deref() == Some(client_id) {
            return;
        }
        self.clear();
        self.client_id = Some(client_id.to_string());
    }

    /// Changes the active tab; payloads of other tabs are kept.
    pub fn select_tab(&mut self, tab: DashboardTab) {
        if self.active_tab == tab {
            return;
        }
        self.active_tab = tab;
        self.supersede();
    }

    /// Closes the dashboard.
    pub fn clear(&mut self) {
        let generation = self.generation;
        let active_tab = self.active_tab;
        *self = Self {
            active_tab,
            generation,
            ..Self::default()
        };
        self.supersede();
    }

    /// Starts fetching the bundle for the current key. `Loading` only when
    /// nothing has been shown for this client yet.
    pub fn begin(&mut self) -> Option<LoadTicket> {
        let client_id = self.client_id.clone()?;
        self.generation += 1;
        self.outstanding = 2;
        if self.summary.is_none() && self.tabs.is_empty() {
            self.phase = Some(LoadPhase::Loading);
            self.refreshing = false;
            self.summary_error = None;
            self.tab_errors.clear();
        } else {
            self.phase = Some(LoadPhase::Ready);
            self.refreshing = true;
        }
        Some(LoadTicket {
            generation: self.generation,
            client_id,
            tab: self.active_tab,
        })
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
            && self.client_id.as_deref() == Some(ticket.client_id.as_str())
            && self.active_tab == ticket.tab
    }

    pub fn apply_summary(
        &mut self,
        ticket: &LoadTicket,
        result: Result<ClientSummary, ConsoleError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                self.summary_error = None;
            }
            Err(err) => self.summary_error = Some(err.to_string()),
        }
        self.settle();
        true
    }

    pub fn apply_tab(&mut self, ticket: &LoadTicket, result: Result<TabPayload, ConsoleError>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match result {
            Ok(payload) if payload.tab() == ticket.tab => {
                self.tabs.store(payload);
                self.tab_errors.remove(&ticket.tab);
            }
            Ok(payload) => {
                self.tab_errors.insert(
                    ticket.tab,
                    format!("expected {} data, received {}", ticket.tab, payload.tab()),
                );
            }
            Err(err) => {
                self.tab_errors.insert(ticket.tab, err.to_string());
            }
        }
        self.settle();
        true
    }

    fn settle(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding > 0 {
            return;
        }
        self.refreshing = false;
        self.phase = if self.summary.is_some() || self.tabs.has(self.active_tab) {
            Some(LoadPhase::Ready)
        } else {
            Some(LoadPhase::Errored)
        };
    }

    fn supersede(&mut self) {
        self.generation += 1;
        self.outstanding = 0;
        self.refreshing = false;
    }
}
