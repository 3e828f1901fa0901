//! Resilient API gateway.
//!
//! The single dispatch point for platform HTTP calls. Attaches the current
//! access token at send time, and on an unauthenticated response performs a
//! one-shot token refresh and retries the original request once.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::Error;
use crate::session::{SessionHandle, TokenPair};
use crate::storage::TokenStore;

/// Session-level conditions the application shell reacts to, e.g. by
/// redirecting to the login view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
}

/// Per-request retry state. A request is refreshed and re-issued at most
/// once; a second unauthenticated response fails immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

pub struct ApiGateway {
    http: Client,
    prefix: Url,
    session: SessionHandle,
    store: Arc<dyn TokenStore>,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiGateway {
    pub fn new(
        config: &ApiConfig,
        session: SessionHandle,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let prefix = Url::parse(&format!(
            "{}/api/{}/",
            config.base_url.trim_end_matches('/'),
            config.version
        ))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            prefix,
            session,
            store,
            refresh_gate: Mutex::new(()),
            events,
        })
    }

    /// Subscribe to session-level events (credential expiry).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self
            .execute(Method::GET, path, None::<&()>, true)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, Some(body), true).await?;
        Ok(response.json().await?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::PUT, path, Some(body), true).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.execute(Method::DELETE, path, None::<&()>, true)
            .await?;
        Ok(())
    }

    /// Issue a request without a bearer credential (login, register).
    pub async fn post_unauthenticated<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, Some(body), false).await?;
        Ok(response.json().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.prefix.join(path.trim_start_matches('/'))?)
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<reqwest::Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let mut attempt = Attempt::First;

        loop {
            // Credential is read at send time, so a rotation performed by
            // the session manager or by a concurrent refresh applies here.
            let token = if authenticated {
                self.session.access_token().await
            } else {
                None
            };

            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(token) = token.as_deref() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && authenticated {
                match attempt {
                    Attempt::First => {
                        debug!(%method, %url, "request rejected as unauthenticated, attempting refresh");
                        attempt = Attempt::Retried;
                        self.refresh_credentials(token.as_deref()).await?;
                        continue;
                    }
                    Attempt::Retried => {
                        warn!(%method, %url, "retried request rejected again");
                        return Err(error_from_response(response).await);
                    }
                }
            }

            if status.is_success() {
                return Ok(response);
            }

            // Validation errors, server errors: propagate unchanged.
            return Err(error_from_response(response).await);
        }
    }

    /// Rotate the credential pair using the stored refresh token.
    ///
    /// Single-flight: concurrent rejected requests queue on the gate, and a
    /// waiter that finds the credential already rotated skips the call.
    async fn refresh_credentials(&self, stale: Option<&str>) -> Result<(), Error> {
        let _gate = self.refresh_gate.lock().await;

        if self.session.access_token().await.as_deref() != stale {
            debug!("credentials already rotated by a concurrent refresh");
            return Ok(());
        }

        let refresh_token = match self.session.refresh_token().await {
            Some(token) => token,
            None => {
                warn!("no refresh token available, session expired");
                self.expire_session().await;
                return Err(Error::SessionExpired);
            }
        };

        info!("access token rejected, refreshing credentials");
        let url = self.endpoint("/auth/refresh")?;
        let outcome = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        let tokens: TokenPair = match outcome {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!("malformed refresh response: {}", e);
                    self.expire_session().await;
                    return Err(Error::SessionExpired);
                }
            },
            Ok(response) => {
                warn!(status = %response.status(), "token refresh rejected");
                self.expire_session().await;
                return Err(Error::SessionExpired);
            }
            Err(e) => {
                warn!("token refresh failed: {}", e);
                self.expire_session().await;
                return Err(Error::SessionExpired);
            }
        };

        self.store
            .save(&tokens.access_token, &tokens.refresh_token)
            .await?;
        self.session.set_tokens(&tokens).await;
        info!("credentials refreshed");

        Ok(())
    }

    async fn expire_session(&self) {
        self.session.clear().await;
        if let Err(e) = self.store.clear().await {
            warn!("failed to clear stored credentials: {}", e);
        }
        let _ = self.events.send(SessionEvent::Expired);
    }
}

async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(|detail| detail.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| "request failed".to_string());

    Error::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            version: "v1".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_endpoint_prefixing() {
        let gateway = ApiGateway::new(
            &test_config("http://localhost:8000"),
            SessionHandle::new(),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        let url = gateway.endpoint("/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/auth/login");

        let url = gateway.endpoint("/teams/123").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/teams/123");
    }

    #[test]
    fn test_endpoint_prefixing_with_trailing_slash() {
        let gateway = ApiGateway::new(
            &test_config("http://localhost:8000/"),
            SessionHandle::new(),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        let url = gateway.endpoint("/auth/me").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/auth/me");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiGateway::new(
            &test_config("not a url"),
            SessionHandle::new(),
            Arc::new(MemoryTokenStore::new()),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
