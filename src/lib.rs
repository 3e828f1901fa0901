pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod storage;

use std::sync::Arc;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
pub use config::Settings;

pub use api::{EvaluationsClient, EventsClient, SubmissionsClient, TeamsClient};
pub use gateway::{ApiGateway, SessionEvent};
pub use session::{Session, SessionHandle, SessionManager, TokenPair, User, UserRole};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Fully wired platform client.
///
/// Owns the shared session cell and the gateway; the session manager is the
/// only writer of session state, and every resource client dispatches
/// through the same gateway.
pub struct Client {
    pub session: SessionHandle,
    pub auth: Arc<SessionManager>,
    pub gateway: Arc<ApiGateway>,
    pub teams: TeamsClient,
    pub events: EventsClient,
    pub submissions: SubmissionsClient,
    pub evaluations: EvaluationsClient,
}

impl Client {
    pub fn new(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(&settings.storage.credentials_path));
        Self::with_store(settings, store)
    }

    /// Build against a caller-supplied token store (in-memory for tests).
    pub fn with_store(settings: &Settings, store: Arc<dyn TokenStore>) -> Result<Self> {
        let session = SessionHandle::new();
        let gateway = Arc::new(ApiGateway::new(
            &settings.api,
            session.clone(),
            store.clone(),
        )?);
        let auth = Arc::new(SessionManager::new(
            session.clone(),
            gateway.clone(),
            store,
        ));

        Ok(Self {
            session,
            auth,
            teams: TeamsClient::new(gateway.clone()),
            events: EventsClient::new(gateway.clone()),
            submissions: SubmissionsClient::new(gateway.clone()),
            evaluations: EvaluationsClient::new(gateway.clone()),
            gateway,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_wiring() {
        let settings = Settings::new_for_test().expect("Failed to load test config");
        let client = Client::with_store(&settings, Arc::new(MemoryTokenStore::new()))
            .expect("Failed to build client");

        // A fresh client starts unauthenticated and unsettled
        assert!(client.session.is_bootstrapping().await);
        assert!(!client.session.is_authenticated().await);
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let mut settings = Settings::new_for_test().expect("Failed to load test config");
        settings.api.base_url = "::not-a-url::".to_string();
        let result = Client::with_store(&settings, Arc::new(MemoryTokenStore::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
