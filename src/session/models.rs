use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "PARTICIPANT")]
    Participant,
    #[serde(rename = "ORGANIZER")]
    Organizer,
    #[serde(rename = "JUDGE")]
    Judge,
}

impl UserRole {
    /// Canonical wire form, uppercase as the platform expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Participant => "PARTICIPANT",
            UserRole::Organizer => "ORGANIZER",
            UserRole::Judge => "JUDGE",
        }
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PARTICIPANT" => Ok(UserRole::Participant),
            "ORGANIZER" => Ok(UserRole::Organizer),
            "JUDGE" => Ok(UserRole::Judge),
            other => Err(Error::Validation(format!("unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-issued credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authenticated state of the client process.
///
/// Created empty with `bootstrapping = true`; populated by login,
/// registration or a successful bootstrap; cleared by logout or a failed
/// refresh. All mutation funnels through [`SessionHandle`].
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub bootstrapping: bool,
}

impl Session {
    fn empty() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            bootstrapping: true,
        }
    }
}

/// Shared handle to the session cell.
///
/// The session manager is the writer; the gateway reads the access token
/// at send time so a credential change takes effect on the next request.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session::empty())),
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.read().await.refresh_token.clone()
    }

    pub async fn is_bootstrapping(&self) -> bool {
        self.inner.read().await.bootstrapping
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.user.is_some()
    }

    /// Atomically install a user and its token pair (login/register).
    pub(crate) async fn install(&self, user: User, tokens: &TokenPair) {
        let mut session = self.inner.write().await;
        session.user = Some(user);
        session.access_token = Some(tokens.access_token.clone());
        session.refresh_token = Some(tokens.refresh_token.clone());
    }

    /// Rotate just the token pair (refresh path; user identity unchanged).
    pub(crate) async fn set_tokens(&self, tokens: &TokenPair) {
        let mut session = self.inner.write().await;
        session.access_token = Some(tokens.access_token.clone());
        session.refresh_token = Some(tokens.refresh_token.clone());
    }

    pub(crate) async fn set_user(&self, user: User) {
        self.inner.write().await.user = Some(user);
    }

    pub(crate) async fn clear(&self) {
        let mut session = self.inner.write().await;
        session.user = None;
        session.access_token = None;
        session.refresh_token = None;
    }

    /// Marks the initial token-validation attempt as resolved. One-way:
    /// the session never returns to bootstrapping within a process.
    pub(crate) async fn settle(&self) {
        self.inner.write().await.bootstrapping = false;
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
