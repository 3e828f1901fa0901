use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;
use crate::gateway::ApiGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub submission_id: Uuid,
    pub team_id: Uuid,
    pub event_id: Uuid,
    pub file_url: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct SubmissionsClient {
    gateway: Arc<ApiGateway>,
}

impl SubmissionsClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Submission>, Error> {
        self.gateway.get("/submissions/").await
    }

    pub async fn create(&self, team_id: Uuid, event_id: Uuid) -> Result<(), Error> {
        let _: serde_json::Value = self
            .gateway
            .post(
                "/submissions/",
                &json!({ "team_id": team_id, "event_id": event_id }),
            )
            .await?;
        Ok(())
    }
}
