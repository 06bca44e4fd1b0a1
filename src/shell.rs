use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::agents::AgentControls;
use crate::api::{ApiClient, ClientRecord, GlobalStats, SystemHealth};
use crate::clients::{
    self, CreateClientForm, CreatedClientNotice, DeleteClientGate, DeleteOutcome, TokenPanel,
};
use crate::dashboard::TabLoader;
use crate::models::GlobalOverview;
use crate::refresh::{ErrorPolicy, Fetch, LoadPhase, PollingController};
use crate::switching::SwitchSession;
use crate::types::ConsoleError;

pub const CLIENT_LIST_INTERVAL: Duration = Duration::from_secs(60);
pub const GLOBAL_STATS_INTERVAL: Duration = Duration::from_secs(30);
pub const SYSTEM_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

pub struct ClientListFetch(Arc<ApiClient>);

#[async_trait]
impl Fetch for ClientListFetch {
    type Output = Vec<ClientRecord>;

    async fn fetch(&self) -> Result<Self::Output, ConsoleError> {
        self.0.list_clients().await
    }
}

pub struct GlobalStatsFetch(Arc<ApiClient>);

#[async_trait]
impl Fetch for GlobalStatsFetch {
    type Output = GlobalStats;

    async fn fetch(&self) -> Result<Self::Output, ConsoleError> {
        self.0.global_stats().await
    }
}

pub struct SystemHealthFetch(Arc<ApiClient>);

#[async_trait]
impl Fetch for SystemHealthFetch {
    type Output = SystemHealth;

    async fn fetch(&self) -> Result<Self::Output, ConsoleError> {
        self.0.system_health().await
    }
}

/// Which main view is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ShellView {
    #[default]
    Overview,
    Health,
    Client {
        client_id: String,
    },
}

/// Top-level console state: the client list every other view trusts for
/// "does this client exist", the active main view, and the per-view timers.
pub struct Shell {
    api: Arc<ApiClient>,
    clients: PollingController<ClientListFetch>,
    stats: PollingController<GlobalStatsFetch>,
    health: PollingController<SystemHealthFetch>,
    dashboard: TabLoader<ApiClient>,
    view: watch::Sender<ShellView>,
}

impl Shell {
    pub fn new(api: ApiClient) -> Self {
        let api = Arc::new(api);
        let (view, _) = watch::channel(ShellView::default());
        Self {
            clients: PollingController::new(
                "clients",
                ClientListFetch(Arc::clone(&api)),
                Some(CLIENT_LIST_INTERVAL),
                ErrorPolicy::SwallowBackground,
            ),
            stats: PollingController::new(
                "global-stats",
                GlobalStatsFetch(Arc::clone(&api)),
                Some(GLOBAL_STATS_INTERVAL),
                ErrorPolicy::SwallowBackground,
            ),
            health: PollingController::new(
                "system-health",
                SystemHealthFetch(Arc::clone(&api)),
                Some(SYSTEM_HEALTH_INTERVAL),
                ErrorPolicy::SwallowBackground,
            ),
            dashboard: TabLoader::new(Arc::clone(&api)),
            view,
            api,
        }
    }

    pub fn clients(&self) -> &PollingController<ClientListFetch> {
        &self.clients
    }

    pub fn stats(&self) -> &PollingController<GlobalStatsFetch> {
        &self.stats
    }

    pub fn health(&self) -> &PollingController<SystemHealthFetch> {
        &self.health
    }

    pub fn dashboard(&self) -> &TabLoader<ApiClient> {
        &self.dashboard
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ShellView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> ShellView {
        self.view.borrow().clone()
    }

    pub fn overview(&self) -> Option<GlobalOverview> {
        self.stats
            .snapshot()
            .data()
            .map(GlobalOverview::from_stats)
    }

    /// Starts the client list timer and the timer of the current view.
    pub fn attach(&self) {
        self.clients.attach();
        match self.view() {
            ShellView::Overview => self.stats.attach(),
            ShellView::Health => self.health.attach(),
            ShellView::Client { .. } => {}
        }
    }

    pub fn detach(&self) {
        self.clients.detach();
        self.stats.detach();
        self.health.detach();
        self.dashboard.close();
    }

    pub fn show_overview(&self) {
        self.leave_current_view();
        self.view.send_replace(ShellView::Overview);
        self.stats.attach();
    }

    pub fn show_health(&self) {
        self.leave_current_view();
        self.view.send_replace(ShellView::Health);
        self.health.attach();
    }

    pub async fn select_client(&self, client_id: &str) {
        let already_open = matches!(
            &*self.view.borrow(),
            ShellView::Client { client_id: open } if open == client_id
        );
        if already_open {
            self.dashboard.refresh().await;
            return;
        }
        self.leave_current_view();
        self.view.send_replace(ShellView::Client {
            client_id: client_id.to_string(),
        });
        self.dashboard.open_client(client_id).await;
    }

    pub async fn refresh_clients(&self) {
        self.clients.refresh().await;
        self.reconcile_selection();
    }

    pub async fn create_client(
        &self,
        form: &CreateClientForm,
    ) -> Result<CreatedClientNotice, ConsoleError> {
        clients::create_client(self.api.as_ref(), form).await
    }

    /// Closes the one-time token notice and reloads the list.
    pub async fn dismiss_created(&self, notice: CreatedClientNotice) {
        let client_id = notice.dismiss(&self.clients).await;
        debug!(client_id = %client_id, "Created client notice closed");
        self.reconcile_selection();
    }

    pub async fn delete_client(&self, gate: &DeleteClientGate) -> Result<DeleteOutcome, ConsoleError> {
        let outcome = gate.confirm(self.api.as_ref()).await?;
        if let DeleteOutcome::Deleted { client_id } = &outcome {
            self.on_client_deleted(client_id).await;
        }
        Ok(outcome)
    }

    pub fn token_panel(&self, client_id: &str, client_name: &str) -> TokenPanel<ApiClient> {
        TokenPanel::open(Arc::clone(&self.api), client_id, client_name)
    }

    pub fn switch_session(&self) -> SwitchSession<ApiClient> {
        SwitchSession::new(Arc::clone(&self.api))
    }

    pub fn agent_controls(&self) -> AgentControls<ApiClient> {
        AgentControls::new(Arc::clone(&self.api))
    }

    async fn on_client_deleted(&self, client_id: &str) {
        if self.selected_client().as_deref() == Some(client_id) {
            info!(client_id, "Selected client deleted, returning to overview");
            self.show_overview();
        }
        self.refresh_clients().await;
    }

    /// Drops the selection when the list no longer contains it.
    fn reconcile_selection(&self) {
        let Some(selected) = self.selected_client() else {
            return;
        };
        let list = self.clients.snapshot();
        if list.phase() != LoadPhase::Ready {
            return;
        }
        let exists = list
            .data()
            .is_some_and(|clients| clients.iter().any(|client| client.id == selected));
        if !exists {
            info!(client_id = %selected, "Selected client no longer listed");
            self.show_overview();
        }
    }

    fn selected_client(&self) -> Option<String> {
        match &*self.view.borrow() {
            ShellView::Client { client_id } => Some(client_id.clone()),
            _ => None,
        }
    }

    fn leave_current_view(&self) {
        match self.view() {
            ShellView::Overview => self.stats.detach(),
            ShellView::Health => self.health.detach(),
            ShellView::Client { .. } => self.dashboard.close(),
        }
    }
}
