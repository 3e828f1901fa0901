use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;
use crate::gateway::ApiGateway;

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub winner_team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EventCreate {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

pub struct EventsClient {
    gateway: Arc<ApiGateway>,
}

impl EventsClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Event>, Error> {
        self.gateway.get("/events/").await
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Event, Error> {
        self.gateway.get(&format!("/events/{}", event_id)).await
    }

    pub async fn create(&self, event: &EventCreate) -> Result<Event, Error> {
        if event.end_date <= event.start_date {
            return Err(Error::Validation(
                "end_date must be after start_date".to_string(),
            ));
        }
        self.gateway.post("/events/", event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_rejects_inverted_dates() {
        let session = crate::session::SessionHandle::new();
        let store = Arc::new(crate::storage::MemoryTokenStore::new());
        let config = crate::config::ApiConfig {
            base_url: "http://localhost:8000".to_string(),
            version: "v1".to_string(),
            timeout_seconds: 5,
        };
        let gateway = Arc::new(ApiGateway::new(&config, session, store).unwrap());
        let client = EventsClient::new(gateway);

        let start = Utc::now();
        let event = EventCreate {
            title: "Regional Qualifier".to_string(),
            start_date: start,
            end_date: start - Duration::hours(1),
        };
        assert!(matches!(
            client.create(&event).await,
            Err(Error::Validation(_))
        ));
    }
}
