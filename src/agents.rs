use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::{Agent, AgentConfig, AgentFlag, ApiClient};
use crate::refresh::RefreshTarget;
use crate::types::ConsoleError;

#[async_trait]
pub trait AgentGateway: Send + Sync + 'static {
    async fn set_agent_flag(
        &self,
        agent_id: &str,
        flag: AgentFlag,
        enabled: bool,
    ) -> Result<(), ConsoleError>;
    async fn agent_config(&self, agent_id: &str) -> Result<AgentConfig, ConsoleError>;
    async fn update_agent_config(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<AgentConfig, ConsoleError>;
    async fn delete_agent(&self, agent_id: &str) -> Result<(), ConsoleError>;
}

#[async_trait]
impl AgentGateway for ApiClient {
    async fn set_agent_flag(
        &self,
        agent_id: &str,
        flag: AgentFlag,
        enabled: bool,
    ) -> Result<(), ConsoleError> {
        ApiClient::set_agent_flag(self, agent_id, flag, enabled).await
    }

    async fn agent_config(&self, agent_id: &str) -> Result<AgentConfig, ConsoleError> {
        ApiClient::agent_config(self, agent_id).await
    }

    async fn update_agent_config(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<AgentConfig, ConsoleError> {
        ApiClient::update_agent_config(self, agent_id, config).await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ConsoleError> {
        ApiClient::delete_agent(self, agent_id).await
    }
}

impl Agent {
    pub fn flag(&self, flag: AgentFlag) -> bool {
        match flag {
            AgentFlag::Enabled => self.enabled,
            AgentFlag::AutoSwitch => self.auto_switch_enabled,
            AgentFlag::AutoTerminate => self.auto_terminate_enabled,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if !(0.0..=100.0).contains(&self.min_savings_percent) {
            return Err(ConsoleError::Validation(
                "Minimum savings must be between 0 and 100 percent".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(ConsoleError::Validation(
                "Risk threshold must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Pending retirement; dropping it declines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetireConfirmation {
    pub agent_id: String,
    pub message: String,
}

/// Agent actions from the dashboard's agents tab. Nothing is applied
/// locally: each mutation waits for the backend and then reloads `owner`.
pub struct AgentControls<G: AgentGateway> {
    gateway: Arc<G>,
}

impl<G: AgentGateway> AgentControls<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Flips `flag` relative to what the dashboard last showed.
    pub async fn toggle(
        &self,
        agent: &Agent,
        flag: AgentFlag,
        owner: &dyn RefreshTarget,
    ) -> Result<bool, ConsoleError> {
        let enabled = !agent.flag(flag);
        self.set_flag(&agent.id, flag, enabled, owner).await?;
        Ok(enabled)
    }

    pub async fn set_flag(
        &self,
        agent_id: &str,
        flag: AgentFlag,
        enabled: bool,
        owner: &dyn RefreshTarget,
    ) -> Result<(), ConsoleError> {
        if let Err(err) = self.gateway.set_agent_flag(agent_id, flag, enabled).await {
            warn!(agent_id, flag = flag.path_segment(), error = %err, "Agent update failed");
            return Err(err);
        }
        info!(agent_id, flag = flag.path_segment(), enabled, "Agent updated");
        owner.request_refresh().await;
        Ok(())
    }

    pub async fn load_config(&self, agent_id: &str) -> Result<AgentConfig, ConsoleError> {
        self.gateway.agent_config(agent_id).await
    }

    pub async fn save_config(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<AgentConfig, ConsoleError> {
        config.validate()?;
        let stored = self
            .gateway
            .update_agent_config(agent_id, config)
            .await
            .map_err(|err| {
                warn!(agent_id, error = %err, "Agent config update failed");
                err
            })?;
        info!(agent_id, "Agent config saved");
        Ok(stored)
    }

    pub fn request_retire(&self, agent: &Agent) -> RetireConfirmation {
        RetireConfirmation {
            agent_id: agent.id.clone(),
            message: format!(
                "Retire agent {}? It stops receiving commands and disappears from the dashboard.",
                agent.display_name()
            ),
        }
    }

    pub async fn retire(
        &self,
        confirmation: RetireConfirmation,
        owner: &dyn RefreshTarget,
    ) -> Result<(), ConsoleError> {
        let agent_id = confirmation.agent_id.as_str();
        if let Err(err) = self.gateway.delete_agent(agent_id).await {
            warn!(agent_id, error = %err, "Agent retirement failed");
            return Err(err);
        }
        info!(agent_id, "Agent retired");
        owner.request_refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::FailureKind;

    #[derive(Default)]
    struct Dashboard(AtomicUsize);

    #[async_trait]
    impl RefreshTarget for Dashboard {
        async fn request_refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controls_for(server: &MockServer) -> AgentControls<ApiClient> {
        AgentControls::new(Arc::new(ApiClient::with_http(Client::new(), &server.uri())))
    }

    fn agent() -> Agent {
        serde_json::from_value(json!({
            "id": "a1",
            "hostname": "web-1",
            "enabled": 1,
            "auto_switch_enabled": 1,
            "auto_terminate_enabled": 0
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn toggle_sends_flipped_value_then_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/a1/auto-switch"))
            .and(body_json(json!({"enabled": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;
        let dashboard = Dashboard::default();

        let enabled = controls_for(&server)
            .toggle(&agent(), AgentFlag::AutoSwitch, &dashboard)
            .await
            .unwrap();
        assert!(!enabled);
        assert_eq!(dashboard.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_toggle_does_not_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/a1/toggle"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "locked"})))
            .mount(&server)
            .await;
        let dashboard = Dashboard::default();

        let err = controls_for(&server)
            .toggle(&agent(), AgentFlag::Enabled, &dashboard)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "locked");
        assert_eq!(dashboard.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/a1/config"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = AgentConfig {
            risk_threshold: 1.5,
            ..AgentConfig::default()
        };
        let err = controls_for(&server)
            .save_config("a1", &config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn empty_stored_config_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agent/a1/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let config = controls_for(&server).load_config("a1").await.unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.max_switches_per_week, 3);
    }

    #[tokio::test]
    async fn retire_after_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/agent/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;
        let controls = controls_for(&server);
        let dashboard = Dashboard::default();

        let confirmation = controls.request_retire(&agent());
        assert!(confirmation.message.contains("web-1"));
        controls.retire(confirmation, &dashboard).await.unwrap();
        assert_eq!(dashboard.0.load(Ordering::SeqCst), 1);
    }
}
