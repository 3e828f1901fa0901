use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;
use crate::gateway::ApiGateway;

#[derive(Debug, Clone, Deserialize)]
pub struct Evaluation {
    pub evaluation_id: Uuid,
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub score: u8,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationCreate {
    pub submission_id: Uuid,
    pub score: u8,
    pub comments: Option<String>,
}

pub struct EvaluationsClient {
    gateway: Arc<ApiGateway>,
}

impl EvaluationsClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Evaluation>, Error> {
        self.gateway.get("/evaluations/").await
    }

    pub async fn create(&self, evaluation: &EvaluationCreate) -> Result<Evaluation, Error> {
        // Scores are judged on a 0-100 scale
        if evaluation.score > 100 {
            return Err(Error::Validation(
                "score must be between 0 and 100".to_string(),
            ));
        }
        self.gateway.post("/evaluations/", evaluation).await
    }
}
