//! Preference rankings: validating what a student or employer entered and sending the
//! ordered list to the portal.

pub mod domain;
mod policy;
mod submission;
mod validator;

#[cfg(test)]
mod tests;

pub use domain::{
    OpportunityId, RankEntry, RankInput, RankSubmission, RankingActor, StudentId, TargetId,
};
pub use policy::{CoveragePolicy, PolicyParseError};
pub use submission::{
    ConfirmationView, RankSubmitter, SubmissionOutcome, SUBMISSION_FAILED_MESSAGE,
};
pub use validator::{
    AssignOutcome, DuplicateRankCorrection, RankForm, RankingError, RankingValidator,
};

use crate::workflows::portal::PortalGateway;

/// Validation followed by submission. Validation finishes before any request starts, and a
/// failed validation never reaches the gateway.
pub async fn validate_and_submit<G>(
    validator: &RankingValidator,
    submitter: &RankSubmitter<G>,
    form: &mut RankForm,
) -> Result<SubmissionOutcome, RankingError>
where
    G: PortalGateway + 'static,
{
    let submission = form.take_submission(validator)?;
    Ok(submitter.submit(&submission).await)
}
