use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;
use crate::gateway::ApiGateway;

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub team_id: Uuid,
    pub name: String,
    pub captain_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamWithMembers {
    pub team_id: Uuid,
    pub name: String,
    pub captain_id: Uuid,
    pub captain_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub member_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamSummary {
    pub team_id: Uuid,
    pub name: String,
    pub captain_name: String,
    pub member_count: u32,
}

#[derive(Debug, Serialize)]
struct TeamCreate<'a> {
    name: &'a str,
}

pub struct TeamsClient {
    gateway: Arc<ApiGateway>,
}

impl TeamsClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<TeamSummary>, Error> {
        self.gateway.get("/teams/").await
    }

    pub async fn get(&self, team_id: Uuid) -> Result<TeamWithMembers, Error> {
        self.gateway.get(&format!("/teams/{}", team_id)).await
    }

    pub async fn create(&self, name: &str) -> Result<TeamWithMembers, Error> {
        if name.is_empty() {
            return Err(Error::Validation("team name must not be empty".to_string()));
        }
        self.gateway.post("/teams/", &TeamCreate { name }).await
    }

    pub async fn join(&self, team_id: Uuid) -> Result<(), Error> {
        let _: serde_json::Value = self
            .gateway
            .post("/teams/join", &json!({ "team_id": team_id }))
            .await?;
        Ok(())
    }

    pub async fn leave(&self) -> Result<(), Error> {
        let _: serde_json::Value = self.gateway.post("/teams/leave", &json!({})).await?;
        Ok(())
    }

    pub async fn delete(&self, team_id: Uuid) -> Result<(), Error> {
        self.gateway.delete(&format!("/teams/{}", team_id)).await
    }
}
