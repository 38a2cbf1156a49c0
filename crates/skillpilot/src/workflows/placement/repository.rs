use super::domain::{MatchEmail, OpportunityRecord, StudentRecord};
use crate::workflows::ranking::{OpportunityId, StudentId};
use crate::workflows::rows::EntityRef;

/// Storage abstraction so the placement service can be exercised in isolation.
pub trait PlacementRepository: Send + Sync {
    fn student(&self, id: &StudentId) -> Result<Option<StudentRecord>, RepositoryError>;
    fn opportunity(&self, id: &OpportunityId)
        -> Result<Option<OpportunityRecord>, RepositoryError>;
    fn set_student_preferences(
        &self,
        id: &StudentId,
        preferences: Vec<OpportunityId>,
    ) -> Result<(), RepositoryError>;
    fn set_opportunity_preferences(
        &self,
        id: &OpportunityId,
        preferences: Vec<StudentId>,
    ) -> Result<(), RepositoryError>;
    /// Removes the entity itself. `NotFound` when nothing was stored under that id.
    fn delete(&self, entity: &EntityRef) -> Result<(), RepositoryError>;
    /// Removes a deleted entity from every preference list that mentions it and returns how
    /// many lists changed.
    fn purge_preferences(&self, entity: &EntityRef) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound mail hook (SMTP relay or a recording double).
pub trait MatchMailer: Send + Sync {
    fn send(&self, email: &MatchEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("mail rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
}
