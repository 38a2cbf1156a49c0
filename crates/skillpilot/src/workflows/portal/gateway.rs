use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::matching::MatchPair;
use crate::workflows::ranking::{OpportunityId, RankSubmission, StudentId};
use crate::workflows::rows::EntityRef;

/// Every request the coordinator makes. Implementations report failures; they never retry.
#[async_trait]
pub trait PortalGateway: Send + Sync {
    async fn submit_ranking(&self, submission: &RankSubmission) -> Result<(), GatewayError>;

    /// Returns the server's confirmation message.
    async fn send_match_notification(&self, pair: &MatchPair) -> Result<String, GatewayError>;

    async fn send_bulk_notifications(
        &self,
        pairs: &[MatchPair],
    ) -> Result<BulkDispatchReply, GatewayError>;

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), GatewayError>;
}

/// Failures from a portal request. Display treats them alike; the variants exist for logs
/// and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("portal unreachable: {0}")]
    Transport(String),
    #[error("portal responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("portal rejected the request: {0}")]
    Rejected(String),
    #[error("unexpected portal response: {0}")]
    Decode(String),
    #[error("portal base URL is not usable: {0}")]
    InvalidBaseUrl(String),
}

impl GatewayError {
    /// Text suitable for the page's error region.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Transport(_) => {
                "Unable to reach the portal. Please try again later.".to_string()
            }
            GatewayError::Status { message, .. } | GatewayError::Rejected(message) => {
                message.clone()
            }
            GatewayError::Decode(_) => "The portal returned an unexpected response.".to_string(),
            GatewayError::InvalidBaseUrl(_) => "The portal address is misconfigured.".to_string(),
        }
    }
}

/// The `{message}` / `{error}` envelope every portal endpoint answers with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PairResult>>,
}

/// Body of the bulk endpoint: every pair to notify in one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDispatchRequest {
    pub students: Vec<MatchPair>,
}

/// Outcome for one pair inside a bulk dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    pub student: StudentId,
    pub opportunity: OpportunityId,
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PairResult {
    pub fn pair(&self) -> MatchPair {
        MatchPair {
            student: self.student.clone(),
            opportunity: self.opportunity.clone(),
        }
    }
}

/// Successful bulk reply. `results` is absent when the endpoint only reports an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDispatchReply {
    pub message: String,
    pub results: Option<Vec<PairResult>>,
}
