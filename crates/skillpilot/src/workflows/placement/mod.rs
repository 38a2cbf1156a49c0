//! Server-side placement endpoints: ranking storage, match emails and entity deletion,
//! gated by the round's deadlines.

pub mod deadlines;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use deadlines::{DeadlineOrderError, RankingDeadlines};
pub use domain::{MatchEmail, OpportunityRecord, StudentRecord};
pub use repository::{MailError, MatchMailer, PlacementRepository, RepositoryError};
pub use router::placement_router;
pub use service::{PlacementError, PlacementService};
