use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::types::ConsoleError;

use super::queries::{HistoryFilters, InstanceFilters, SavingsRange};
use super::types::{
    Agent, AgentConfig, ClientRecord, ClientSummary, CreatedClient, Envelope, ErrorBody,
    GlobalStats, Instance, InstancePools, LiveEvent, NewClient, SavingsSummary, SwitchEvent,
    SwitchRequest, SystemHealth, TokenPayload,
};

/// Agent switches exposed by `POST /api/agent/{id}/{flag}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentFlag {
    Enabled,
    AutoSwitch,
    AutoTerminate,
}

impl AgentFlag {
    pub fn path_segment(self) -> &'static str {
        match self {
            AgentFlag::Enabled => "toggle",
            AgentFlag::AutoSwitch => "auto-switch",
            AgentFlag::AutoTerminate => "auto-terminate",
        }
    }
}

/// The only place the console talks HTTP. Every method is a typed wrapper
/// binding one backend route; no retries happen here.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ConsoleError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ConsoleError::Transport)?;

        Ok(Self::with_http(http, &config.api_base_url))
    }

    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>, ConsoleError> {
        self.fetch(self.build(Method::GET, "/api/admin/clients")).await
    }

    pub async fn create_client(&self, client: &NewClient) -> Result<CreatedClient, ConsoleError> {
        let request = self
            .build(Method::POST, "/api/admin/clients/create")
            .json(client);
        self.fetch(request).await
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<(), ConsoleError> {
        let path = format!("/api/admin/clients/{client_id}");
        self.execute(self.build(Method::DELETE, &path)).await
    }

    pub async fn client_token(&self, client_id: &str) -> Result<String, ConsoleError> {
        let path = format!("/api/admin/clients/{client_id}/token");
        let payload: TokenPayload = self.fetch(self.build(Method::GET, &path)).await?;
        Ok(payload.token)
    }

    pub async fn regenerate_token(&self, client_id: &str) -> Result<String, ConsoleError> {
        let path = format!("/api/admin/clients/{client_id}/regenerate-token");
        let payload: TokenPayload = self.fetch(self.build(Method::POST, &path)).await?;
        Ok(payload.token)
    }

    pub async fn client_summary(&self, client_id: &str) -> Result<ClientSummary, ConsoleError> {
        let path = format!("/api/client/{client_id}");
        self.fetch(self.build(Method::GET, &path)).await
    }

    pub async fn client_agents(&self, client_id: &str) -> Result<Vec<Agent>, ConsoleError> {
        let path = format!("/api/client/{client_id}/agents");
        self.fetch(self.build(Method::GET, &path)).await
    }

    pub async fn client_instances(
        &self,
        client_id: &str,
        filters: &InstanceFilters,
    ) -> Result<Vec<Instance>, ConsoleError> {
        let path = format!("/api/client/{client_id}/instances");
        let request = self.build(Method::GET, &path).query(&filters.to_query());
        self.fetch(request).await
    }

    pub async fn switch_history(
        &self,
        client_id: &str,
        filters: &HistoryFilters,
    ) -> Result<Vec<SwitchEvent>, ConsoleError> {
        let path = format!("/api/client/{client_id}/switch-history");
        let request = self.build(Method::GET, &path).query(&filters.to_query());
        self.fetch(request).await
    }

    pub async fn client_savings(
        &self,
        client_id: &str,
        range: SavingsRange,
    ) -> Result<SavingsSummary, ConsoleError> {
        let path = format!("/api/client/{client_id}/savings");
        let request = self.build(Method::GET, &path).query(&range.to_query());
        self.fetch(request).await
    }

    pub async fn live_data(&self, client_id: &str) -> Result<Vec<LiveEvent>, ConsoleError> {
        let path = format!("/api/client/{client_id}/live-data");
        self.fetch(self.build(Method::GET, &path)).await
    }

    pub async fn instance_pools(&self, instance_id: &str) -> Result<InstancePools, ConsoleError> {
        let path = format!("/api/instance/{instance_id}/pools");
        self.fetch(self.build(Method::GET, &path)).await
    }

    pub async fn switch_instance(
        &self,
        instance_id: &str,
        request: &SwitchRequest,
    ) -> Result<(), ConsoleError> {
        let path = format!("/api/instance/{instance_id}/switch");
        self.execute(self.build(Method::POST, &path).json(request)).await
    }

    pub async fn set_agent_flag(
        &self,
        agent_id: &str,
        flag: AgentFlag,
        enabled: bool,
    ) -> Result<(), ConsoleError> {
        let path = format!("/api/agent/{agent_id}/{}", flag.path_segment());
        let body = serde_json::json!({ "enabled": enabled });
        self.execute(self.build(Method::POST, &path).json(&body)).await
    }

    pub async fn agent_config(&self, agent_id: &str) -> Result<AgentConfig, ConsoleError> {
        let path = format!("/api/agent/{agent_id}/config");
        self.fetch(self.build(Method::GET, &path)).await
    }

    /// Saves the agent config. The backend may omit the stored config from
    /// its reply, in which case the submitted one is what was stored.
    pub async fn update_agent_config(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<AgentConfig, ConsoleError> {
        let path = format!("/api/agent/{agent_id}/config");
        let stored: Option<AgentConfig> = self
            .fetch_optional(self.build(Method::POST, &path).json(config))
            .await?;
        Ok(stored.unwrap_or_else(|| config.clone()))
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<(), ConsoleError> {
        let path = format!("/api/agent/{agent_id}");
        self.execute(self.build(Method::DELETE, &path)).await
    }

    pub async fn global_stats(&self) -> Result<GlobalStats, ConsoleError> {
        self.fetch(self.build(Method::GET, "/api/admin/stats")).await
    }

    pub async fn system_health(&self) -> Result<SystemHealth, ConsoleError> {
        self.fetch(self.build(Method::GET, "/api/admin/system-health")).await
    }

    fn build(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http.request(method, url)
    }

    /// Sends a request whose envelope must carry `data`.
    async fn fetch<T>(&self, request: RequestBuilder) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned,
    {
        let (path, envelope) = self.envelope::<T>(request).await?;
        envelope
            .data
            .ok_or_else(|| ConsoleError::Decode(format!("{path}: response carries no data")))
    }

    async fn fetch_optional<T>(&self, request: RequestBuilder) -> Result<Option<T>, ConsoleError>
    where
        T: DeserializeOwned,
    {
        let (_, envelope) = self.envelope::<T>(request).await?;
        Ok(envelope.data)
    }

    /// Sends a request where only the status matters.
    async fn execute(&self, request: RequestBuilder) -> Result<(), ConsoleError> {
        self.dispatch(request).await.map(|_| ())
    }

    async fn envelope<T>(
        &self,
        request: RequestBuilder,
    ) -> Result<(String, Envelope<T>), ConsoleError>
    where
        T: DeserializeOwned,
    {
        let (path, body) = self.dispatch(request).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok((path, Envelope { data: None, error: None }));
        }
        let envelope = serde_json::from_slice::<Envelope<T>>(&body)
            .map_err(|err| ConsoleError::Decode(format!("{path}: {err}")))?;
        Ok((path, envelope))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<(String, Vec<u8>), ConsoleError> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await.map_err(|err| {
            warn!(%method, path = %path, error = %err, "Backend unreachable");
            ConsoleError::Transport(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .bytes()
                .await
                .ok()
                .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
                .and_then(|body| body.error);
            debug!(%method, path = %path, status = status.as_u16(), "Backend returned an error");
            return Err(ConsoleError::api(status.as_u16(), message));
        }

        let body = response.bytes().await?;
        Ok((path, body.to_vec()))
    }
}
