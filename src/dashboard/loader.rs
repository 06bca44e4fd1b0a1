use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ApiClient, ClientSummary, HistoryFilters, InstanceFilters, SavingsRange};
use crate::refresh::RefreshTarget;
use crate::types::ConsoleError;

use super::state::DashboardState;
use super::tabs::{DashboardTab, TabPayload};

/// What the loader asks the backend for one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub tab: DashboardTab,
    pub instance_filters: InstanceFilters,
    pub history_filters: HistoryFilters,
    pub savings_range: SavingsRange,
}

#[async_trait]
pub trait DashboardSource: Send + Sync + 'static {
    async fn client_summary(&self, client_id: &str) -> Result<ClientSummary, ConsoleError>;

    async fn tab_payload(&self, client_id: &str, query: &TabQuery)
        -> Result<TabPayload, ConsoleError>;
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn client_summary(&self, client_id: &str) -> Result<ClientSummary, ConsoleError> {
        ApiClient::client_summary(self, client_id).await
    }

    async fn tab_payload(
        &self,
        client_id: &str,
        query: &TabQuery,
    ) -> Result<TabPayload, ConsoleError> {
        let payload = match query.tab {
            DashboardTab::Agents => TabPayload::Agents(self.client_agents(client_id).await?),
            DashboardTab::Instances => TabPayload::Instances(
                self.client_instances(client_id, &query.instance_filters)
                    .await?,
            ),
            DashboardTab::History => TabPayload::History(
                self.switch_history(client_id, &query.history_filters)
                    .await?,
            ),
            DashboardTab::Savings => {
                TabPayload::Savings(self.client_savings(client_id, query.savings_range).await?)
            }
            DashboardTab::LiveData => TabPayload::LiveData(self.live_data(client_id).await?),
        };
        Ok(payload)
    }
}

/// Loads the summary of the selected client together with the payload of
/// its active tab. There is no timer: loads happen on selection, tab change
/// and explicit refresh.
pub struct TabLoader<S: DashboardSource> {
    source: Arc<S>,
    state: watch::Sender<DashboardState>,
    query: Mutex<TabQuery>,
}

impl<S: DashboardSource> TabLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            source,
            state,
            query: Mutex::new(TabQuery::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub async fn open_client(&self, client_id: &str) {
        self.state.send_modify(|state| state.select_client(client_id));
        self.load().await;
    }

    pub async fn switch_tab(&self, tab: DashboardTab) {
        self.state.send_modify(|state| state.select_tab(tab));
        self.load().await;
    }

    /// Re-fetches the current bundle without touching the active tab.
    pub async fn refresh(&self) {
        self.load().await;
    }

    pub fn close(&self) {
        self.state.send_modify(DashboardState::clear);
    }

    pub async fn set_instance_filters(&self, filters: InstanceFilters) {
        self.query_slot().instance_filters = filters;
        self.reload_if_active(DashboardTab::Instances).await;
    }

    pub async fn set_history_filters(&self, filters: HistoryFilters) {
        self.query_slot().history_filters = filters;
        self.reload_if_active(DashboardTab::History).await;
    }

    pub async fn set_savings_range(&self, range: SavingsRange) {
        self.query_slot().savings_range = range;
        self.reload_if_active(DashboardTab::Savings).await;
    }

    async fn reload_if_active(&self, tab: DashboardTab) {
        let active = {
            let state = self.state.borrow();
            state.client_id().is_some() && state.active_tab() == tab
        };
        if active {
            self.load().await;
        }
    }

    async fn load(&self) {
        let mut ticket = None;
        self.state.send_modify(|state| ticket = state.begin());
        let Some(ticket) = ticket else {
            return;
        };

        let query = TabQuery {
            tab: ticket.tab,
            ..self.query_slot().clone()
        };
        let client_id = ticket.client_id.as_str();
        debug!(client_id, tab = %ticket.tab, "Loading dashboard");

        let summary = async {
            let result = self.source.client_summary(client_id).await;
            if let Err(err) = &result {
                warn!(client_id, error = %err, "Client summary failed");
            }
            self.state
                .send_if_modified(|state| state.apply_summary(&ticket, result))
        };
        let tab = async {
            let result = self.source.tab_payload(client_id, &query).await;
            if let Err(err) = &result {
                warn!(client_id, tab = %query.tab, error = %err, "Tab payload failed");
            }
            self.state
                .send_if_modified(|state| state.apply_tab(&ticket, result))
        };

        let (summary_applied, tab_applied) = tokio::join!(summary, tab);
        if !summary_applied || !tab_applied {
            debug!(client_id, tab = %ticket.tab, "Discarded superseded dashboard response");
        }
    }

    fn query_slot(&self) -> MutexGuard<'_, TabQuery> {
        match self.query.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<S: DashboardSource> RefreshTarget for TabLoader<S> {
    async fn request_refresh(&self) {
        self.refresh().await;
    }
}
