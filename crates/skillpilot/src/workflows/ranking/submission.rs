use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{RankSubmission, RankingActor};
use crate::workflows::portal::{GatewayError, PortalGateway};

/// Message shown when the ranking endpoint fails for any reason.
pub const SUBMISSION_FAILED_MESSAGE: &str = "An error occurred. Please try again later";

/// Neutral view the screen moves to once the portal accepted a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationView {
    StudentUpdateSuccess,
    OpportunityList,
}

impl ConfirmationView {
    pub fn for_actor(actor: &RankingActor) -> Self {
        match actor {
            RankingActor::Student(_) => Self::StudentUpdateSuccess,
            RankingActor::Opportunity(_) => Self::OpportunityList,
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::StudentUpdateSuccess => "/students/update_success",
            Self::OpportunityList => "/opportunities/search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Navigate(ConfirmationView),
    Failed {
        message: String,
        cause: GatewayError,
    },
}

/// Sends validated rankings. One request per call and no automatic retry: whether a
/// repeated submission double-applies is the endpoint's concern.
pub struct RankSubmitter<G> {
    gateway: Arc<G>,
}

impl<G> RankSubmitter<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn submit(&self, submission: &RankSubmission) -> SubmissionOutcome {
        match self.gateway.submit_ranking(submission).await {
            Ok(()) => {
                info!(
                    actor = submission.actor.label(),
                    actor_id = submission.actor.id(),
                    ranked = submission.targets.len(),
                    "ranking accepted"
                );
                SubmissionOutcome::Navigate(ConfirmationView::for_actor(&submission.actor))
            }
            Err(cause) => {
                warn!(
                    actor = submission.actor.label(),
                    actor_id = submission.actor.id(),
                    error = %cause,
                    "ranking submission failed"
                );
                SubmissionOutcome::Failed {
                    message: SUBMISSION_FAILED_MESSAGE.to_string(),
                    cause,
                }
            }
        }
    }
}
