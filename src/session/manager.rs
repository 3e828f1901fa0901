use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::gateway::ApiGateway;
use crate::session::models::{SessionHandle, TokenPair, User, UserRole};
use crate::storage::TokenStore;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
    role: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthPayload {
    user: User,
    tokens: TokenPair,
}

/// Single authority over session state and its persisted shadow.
///
/// All session mutation goes through the four operations here; the gateway
/// and the route guard only read.
pub struct SessionManager {
    session: SessionHandle,
    gateway: Arc<ApiGateway>,
    store: Arc<dyn TokenStore>,
    bootstrapped: AtomicBool,
}

impl SessionManager {
    pub fn new(
        session: SessionHandle,
        gateway: Arc<ApiGateway>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            session,
            gateway,
            store,
            bootstrapped: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Restore the session from persisted credentials, if any.
    ///
    /// Runs once per process; later calls return immediately. Always settles
    /// the bootstrapping flag, whatever the outcome. With no persisted access
    /// token this makes no network call at all.
    pub async fn bootstrap(&self) {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            debug!("bootstrap already performed");
            return;
        }

        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("failed to load stored credentials: {}", e);
                None
            }
        };

        let stored = match stored {
            Some(stored) => stored,
            None => {
                debug!("no persisted credentials, starting unauthenticated");
                self.session.settle().await;
                return;
            }
        };

        // Optimistically attach the persisted pair, then validate it by
        // fetching the profile. The gateway may refresh along the way.
        self.session
            .set_tokens(&TokenPair {
                access_token: stored.access_token,
                refresh_token: stored.refresh_token,
            })
            .await;

        match self.gateway.get::<User>("/auth/me").await {
            Ok(user) => {
                info!("session restored for {}", user.email);
                self.session.set_user(user).await;
            }
            Err(e) => {
                warn!("stored credentials rejected: {}", e);
                self.session.clear().await;
                if let Err(e) = self.store.clear().await {
                    warn!("failed to clear stored credentials: {}", e);
                }
            }
        }

        self.session.settle().await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "email and password must not be empty".to_string(),
            ));
        }

        info!("login attempt for {}", email);
        let payload: AuthPayload = match self
            .gateway
            .post_unauthenticated("/auth/login", &LoginRequest { email, password })
            .await
        {
            Ok(payload) => payload,
            Err(Error::Api { message, .. }) => {
                warn!("login rejected for {}", email);
                return Err(Error::Authentication(message));
            }
            Err(e) => return Err(e),
        };

        let user = self.install(payload).await?;
        info!("login successful for {}", user.email);
        Ok(user)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: &str,
    ) -> Result<User, Error> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "email and password must not be empty".to_string(),
            ));
        }
        let role: UserRole = role.parse()?;

        info!("registration attempt for {}", email);
        let payload: AuthPayload = match self
            .gateway
            .post_unauthenticated(
                "/auth/register",
                &RegisterRequest {
                    email,
                    password,
                    name,
                    role: role.as_str(),
                },
            )
            .await
        {
            Ok(payload) => payload,
            Err(Error::Api { message, .. }) => {
                warn!("registration rejected for {}", email);
                return Err(Error::Registration(message));
            }
            Err(e) => return Err(e),
        };

        let user = self.install(payload).await?;
        info!("registration successful for {}", user.email);
        Ok(user)
    }

    /// Clear the session and its persisted shadow. Never fails; idempotent.
    pub async fn logout(&self) {
        info!("logging out");
        self.session.clear().await;
        if let Err(e) = self.store.clear().await {
            warn!("failed to clear stored credentials: {}", e);
        }
    }

    /// Persist the issued pair, then populate the session. Persisting first
    /// keeps the session untouched if storage fails.
    async fn install(&self, payload: AuthPayload) -> Result<User, Error> {
        self.store
            .save(
                &payload.tokens.access_token,
                &payload.tokens.refresh_token,
            )
            .await?;
        self.session.install(payload.user.clone(), &payload.tokens).await;
        Ok(payload.user)
    }
}
