use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::{ApiClient, CreatedClient, NewClient};
use crate::refresh::RefreshTarget;
use crate::types::ConsoleError;

/// Backend calls behind the client lifecycle.
#[async_trait]
pub trait ClientAdmin: Send + Sync + 'static {
    async fn create_client(&self, client: &NewClient) -> Result<CreatedClient, ConsoleError>;
    async fn client_token(&self, client_id: &str) -> Result<String, ConsoleError>;
    async fn regenerate_token(&self, client_id: &str) -> Result<String, ConsoleError>;
    async fn delete_client(&self, client_id: &str) -> Result<(), ConsoleError>;
}

#[async_trait]
impl ClientAdmin for ApiClient {
    async fn create_client(&self, client: &NewClient) -> Result<CreatedClient, ConsoleError> {
        ApiClient::create_client(self, client).await
    }

    async fn client_token(&self, client_id: &str) -> Result<String, ConsoleError> {
        ApiClient::client_token(self, client_id).await
    }

    async fn regenerate_token(&self, client_id: &str) -> Result<String, ConsoleError> {
        ApiClient::regenerate_token(self, client_id).await
    }

    async fn delete_client(&self, client_id: &str) -> Result<(), ConsoleError> {
        ApiClient::delete_client(self, client_id).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateClientForm {
    pub name: String,
    pub company_name: String,
}

impl CreateClientForm {
    pub fn new(name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company_name: company_name.into(),
        }
    }

    /// Builds the request body. The company falls back to the client name.
    pub fn validate(&self) -> Result<NewClient, ConsoleError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConsoleError::Validation("Client name is required".into()));
        }
        let company_name = match self.company_name.trim() {
            "" => name,
            company => company,
        };
        Ok(NewClient {
            name: name.to_string(),
            company_name: company_name.to_string(),
        })
    }
}

/// Result of a successful create. This is the only place the new token is
/// ever shown; dropping the notice forgets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedClientNotice {
    pub id: String,
    pub name: String,
    pub company_name: String,
    token: String,
}

impl CreatedClientNotice {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Closes the notice, copied or not, and reloads the client list.
    pub async fn dismiss(self, client_list: &dyn RefreshTarget) -> String {
        client_list.request_refresh().await;
        self.id
    }
}

pub async fn create_client<A: ClientAdmin + ?Sized>(
    admin: &A,
    form: &CreateClientForm,
) -> Result<CreatedClientNotice, ConsoleError> {
    let request = form.validate()?;
    let created = admin.create_client(&request).await.map_err(|err| {
        warn!(name = %request.name, error = %err, "Client creation failed");
        err
    })?;
    info!(client_id = %created.id, name = %created.name, "Client created");

    let company_name = created
        .company_name
        .filter(|company| !company.trim().is_empty())
        .unwrap_or(request.company_name);
    Ok(CreatedClientNotice {
        id: created.id,
        name: created.name,
        company_name,
        token: created.token,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenPhase {
    #[default]
    Hidden,
    Revealed,
    ConfirmingRegenerate,
    Regenerating,
}

/// Token modal of an existing client. Nothing is cached: a new panel starts
/// hidden and every reveal is a fresh fetch.
pub struct TokenPanel<A: ClientAdmin + ?Sized> {
    admin: Arc<A>,
    client_id: String,
    client_name: String,
    phase: TokenPhase,
    token: Option<String>,
    error: Option<String>,
}

impl<A: ClientAdmin + ?Sized> TokenPanel<A> {
    pub fn open(admin: Arc<A>, client_id: &str, client_name: &str) -> Self {
        Self {
            admin,
            client_id: client_id.to_string(),
            client_name: client_name.to_string(),
            phase: TokenPhase::Hidden,
            token: None,
            error: None,
        }
    }

    pub fn phase(&self) -> TokenPhase {
        self.phase
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn reveal(&mut self) -> Result<&str, ConsoleError> {
        if matches!(
            self.phase,
            TokenPhase::ConfirmingRegenerate | TokenPhase::Regenerating
        ) {
            return Err(ConsoleError::InvalidState(
                "token regeneration is pending".into(),
            ));
        }
        match self.admin.client_token(&self.client_id).await {
            Ok(token) => {
                self.error = None;
                self.phase = TokenPhase::Revealed;
                Ok(self.token.insert(token).as_str())
            }
            Err(err) => {
                warn!(client_id = %self.client_id, error = %err, "Token reveal failed");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// First step of regeneration; returns the warning to confirm.
    pub fn request_regenerate(&mut self) -> String {
        if self.phase != TokenPhase::Regenerating {
            self.phase = TokenPhase::ConfirmingRegenerate;
        }
        format!(
            "Regenerate the token for {}? Every agent still using the current token will lose connectivity until it is updated.",
            self.client_name
        )
    }

    pub fn decline_regenerate(&mut self) {
        if self.phase == TokenPhase::ConfirmingRegenerate {
            self.phase = self.settled_phase();
        }
    }

    /// Issues the regeneration and shows the new token in place.
    pub async fn confirm_regenerate(&mut self) -> Result<&str, ConsoleError> {
        if self.phase != TokenPhase::ConfirmingRegenerate {
            return Err(ConsoleError::InvalidState(
                "token regeneration was not confirmed".into(),
            ));
        }
        self.phase = TokenPhase::Regenerating;
        match self.admin.regenerate_token(&self.client_id).await {
            Ok(token) => {
                info!(client_id = %self.client_id, "Client token regenerated");
                self.error = None;
                self.phase = TokenPhase::Revealed;
                Ok(self.token.insert(token).as_str())
            }
            Err(err) => {
                warn!(client_id = %self.client_id, error = %err, "Token regeneration failed");
                self.error = Some(err.to_string());
                self.phase = self.settled_phase();
                Err(err)
            }
        }
    }

    fn settled_phase(&self) -> TokenPhase {
        if self.token.is_some() {
            TokenPhase::Revealed
        } else {
            TokenPhase::Hidden
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { client_id: String },
    NotConfirmed,
}

/// Delete confirmation: enabled only once the exact client name is typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteClientGate {
    client_id: String,
    client_name: String,
    typed: String,
}

impl DeleteClientGate {
    pub fn new(client_id: &str, client_name: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_name: client_name.to_string(),
            typed: String::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn type_confirmation(&mut self, typed: &str) {
        self.typed = typed.to_string();
    }

    pub fn can_delete(&self) -> bool {
        !self.client_name.is_empty() && self.typed == self.client_name
    }

    pub async fn confirm<A: ClientAdmin + ?Sized>(
        &self,
        admin: &A,
    ) -> Result<DeleteOutcome, ConsoleError> {
        if !self.can_delete() {
            return Ok(DeleteOutcome::NotConfirmed);
        }
        admin.delete_client(&self.client_id).await.map_err(|err| {
            warn!(client_id = %self.client_id, error = %err, "Client deletion failed");
            err
        })?;
        info!(client_id = %self.client_id, name = %self.client_name, "Client deleted");
        Ok(DeleteOutcome::Deleted {
            client_id: self.client_id.clone(),
        })
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

    fn admin_for(server: &MockServer) -> Arc<ApiClient> {
        Arc::new(ApiClient::with_http(Client::new(), &server.uri()))
    }

    #[derive(Default)]
    struct ListRefresh(AtomicUsize);

    #[async_trait]
    impl RefreshTarget for ListRefresh {
        async fn request_refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn acme_is_created_and_token_shown_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/clients/create"))
            .and(body_json(json!({"name": "Acme", "company_name": "Acme"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {"id": "c1", "name": "Acme", "token": "tok_abc"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/admin/clients/c1/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok_abc"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let admin = admin_for(&server);
        let list = ListRefresh::default();

        let notice = create_client(admin.as_ref(), &CreateClientForm::new("Acme", ""))
            .await
            .unwrap();
        assert_eq!(notice.id, "c1");
        assert_eq!(notice.company_name, "Acme");
        assert_eq!(notice.token(), "tok_abc");
        assert_eq!(notice.dismiss(&list).await, "c1");
        assert_eq!(list.0.load(Ordering::SeqCst), 1);

        let mut panel = TokenPanel::open(Arc::clone(&admin), "c1", "Acme");
        assert_eq!(panel.token(), None);
        assert_eq!(panel.reveal().await.unwrap(), "tok_abc");
        assert_eq!(panel.phase(), TokenPhase::Revealed);
    }

    #[tokio::test]
    async fn blank_name_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/clients/create"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = create_client(
            admin_for(&server).as_ref(),
            &CreateClientForm::new("   ", "Acme Corp"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn regenerate_requires_confirmation_and_replaces_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/clients/c1/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok_old"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/admin/clients/c1/regenerate-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok_new"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let mut panel = TokenPanel::open(admin_for(&server), "c1", "Acme");
        panel.reveal().await.unwrap();

        let err = panel.confirm_regenerate().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidState);

        let warning = panel.request_regenerate();
        assert!(warning.contains("lose connectivity"));
        panel.decline_regenerate();
        assert_eq!(panel.phase(), TokenPhase::Revealed);
        assert_eq!(panel.token(), Some("tok_old"));

        panel.request_regenerate();
        assert_eq!(panel.confirm_regenerate().await.unwrap(), "tok_new");
        assert_eq!(panel.token(), Some("tok_new"));
        assert_eq!(panel.phase(), TokenPhase::Revealed);
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_old_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/clients/c1/regenerate-token"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
            .mount(&server)
            .await;
        let mut panel = TokenPanel::open(admin_for(&server), "c1", "Acme");

        panel.request_regenerate();
        let err = panel.confirm_regenerate().await.unwrap_err();
        assert_eq!(err.to_string(), "db down");
        assert_eq!(panel.phase(), TokenPhase::Hidden);
        assert_eq!(panel.error(), Some("db down"));
        assert_eq!(panel.token(), None);
    }

    #[test]
    fn delete_gate_is_case_sensitive() {
        let mut gate = DeleteClientGate::new("c1", "Acme");
        assert!(!gate.can_delete());
        gate.type_confirmation("acme");
        assert!(!gate.can_delete());
        gate.type_confirmation("Acme ");
        assert!(!gate.can_delete());
        gate.type_confirmation("Acme");
        assert!(gate.can_delete());
    }

    #[tokio::test]
    async fn unconfirmed_delete_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/admin/clients/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        let admin = admin_for(&server);
        let mut gate = DeleteClientGate::new("c1", "Acme");

        gate.type_confirmation("acme");
        assert_eq!(
            gate.confirm(admin.as_ref()).await.unwrap(),
            DeleteOutcome::NotConfirmed
        );

        gate.type_confirmation("Acme");
        assert_eq!(
            gate.confirm(admin.as_ref()).await.unwrap(),
            DeleteOutcome::Deleted {
                client_id: "c1".into()
            }
        );
    }
}
