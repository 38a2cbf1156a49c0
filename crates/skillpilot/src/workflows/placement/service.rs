use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::deadlines::RankingDeadlines;
use super::domain::{MatchEmail, OpportunityRecord, StudentRecord};
use super::repository::{MailError, MatchMailer, PlacementRepository, RepositoryError};
use crate::workflows::matching::MatchPair;
use crate::workflows::portal::{PairResult, PortalReply};
use crate::workflows::ranking::{OpportunityId, StudentId};
use crate::workflows::rows::{EntityKind, EntityRef};

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Server side of the portal: stores rankings, sends match emails and deletes entities.
pub struct PlacementService<R, M> {
    repository: Arc<R>,
    mailer: Arc<M>,
    deadlines: Option<RankingDeadlines>,
    today: Today,
}

impl<R, M> PlacementService<R, M>
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    pub fn new(repository: Arc<R>, mailer: Arc<M>) -> Self {
        Self {
            repository,
            mailer,
            deadlines: None,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Without deadlines, ranking and matching are always open.
    pub fn with_deadlines(mut self, deadlines: Option<RankingDeadlines>) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn deadlines(&self) -> Option<RankingDeadlines> {
        self.deadlines
    }

    /// Replaces a student's ranked opportunity list. Returns how many were stored.
    pub fn rank_opportunities(
        &self,
        student: &StudentId,
        ranks: Vec<String>,
    ) -> Result<usize, PlacementError> {
        if let Some(deadlines) = self.deadlines {
            if !deadlines.student_ranking_open((self.today)()) {
                return Err(PlacementError::StudentRankingClosed(
                    deadlines.student_ranking(),
                ));
            }
        }
        self.find_student(student)?;
        let preferences: Vec<OpportunityId> = cleaned(ranks).map(OpportunityId).collect();
        if preferences.is_empty() {
            return Err(PlacementError::EmptyRanking);
        }

        let count = preferences.len();
        self.repository
            .set_student_preferences(student, preferences)?;
        info!(%student, ranked = count, "student preferences updated");
        Ok(count)
    }

    /// Replaces an opportunity's ranked student list. Returns how many were stored.
    pub fn rank_students(
        &self,
        opportunity: &OpportunityId,
        ranks: Vec<String>,
    ) -> Result<usize, PlacementError> {
        if let Some(deadlines) = self.deadlines {
            if !deadlines.opportunity_ranking_open((self.today)()) {
                return Err(PlacementError::OpportunityRankingClosed(
                    deadlines.opportunity_ranking(),
                ));
            }
        }
        self.find_opportunity(opportunity)?;
        let preferences: Vec<StudentId> = cleaned(ranks).map(StudentId).collect();
        if preferences.is_empty() {
            return Err(PlacementError::EmptyRanking);
        }

        let count = preferences.len();
        self.repository
            .set_opportunity_preferences(opportunity, preferences)?;
        info!(%opportunity, ranked = count, "opportunity preferences updated");
        Ok(count)
    }

    /// Sends one match email and returns the confirmation shown to the admin.
    pub fn send_match_email(&self, pair: &MatchPair) -> Result<String, PlacementError> {
        self.ensure_matching_open()?;
        self.deliver(pair)
    }

    fn deliver(&self, pair: &MatchPair) -> Result<String, PlacementError> {
        let student = self.find_student(&pair.student)?;
        let opportunity = self.find_opportunity(&pair.opportunity)?;
        let email = MatchEmail::compose(&student, &opportunity);

        self.mailer.send(&email)?;
        info!(
            student = %pair.student,
            opportunity = %pair.opportunity,
            "match email sent"
        );
        Ok(format!("Email sent to {}", student.email))
    }

    /// Attempts every pair once and reports each one. Repeated pairs in the batch are sent
    /// once.
    pub fn send_match_emails(&self, pairs: &[MatchPair]) -> Result<PortalReply, PlacementError> {
        self.ensure_matching_open()?;
        if pairs.is_empty() {
            return Err(PlacementError::EmptyBatch);
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for pair in pairs.iter().filter(|pair| seen.insert(*pair)) {
            let outcome = self.deliver(pair);
            if let Err(err) = &outcome {
                warn!(
                    student = %pair.student,
                    opportunity = %pair.opportunity,
                    error = %err,
                    "match email in batch failed"
                );
            }
            results.push(PairResult {
                student: pair.student.clone(),
                opportunity: pair.opportunity.clone(),
                sent: outcome.is_ok(),
                error: outcome.err().map(|err| err.to_string()),
            });
        }

        let sent = results.iter().filter(|result| result.sent).count();
        Ok(PortalReply {
            message: Some(format!("Sent {} of {} match emails", sent, results.len())),
            error: None,
            results: Some(results),
        })
    }

    /// Deletes an entity. Students and opportunities are also removed from the other side's
    /// preference lists.
    pub fn delete(&self, entity: &EntityRef) -> Result<(), PlacementError> {
        self.repository.delete(entity).map_err(|err| match err {
            RepositoryError::NotFound => PlacementError::EntityNotFound(entity.clone()),
            other => PlacementError::Repository(other),
        })?;

        if matches!(entity.kind, EntityKind::Student | EntityKind::Opportunity) {
            let purged = self.repository.purge_preferences(entity)?;
            info!(%entity, purged, "entity deleted and preference lists purged");
        } else {
            info!(%entity, "entity deleted");
        }
        Ok(())
    }

    fn ensure_matching_open(&self) -> Result<(), PlacementError> {
        match self.deadlines {
            Some(deadlines) if !deadlines.matching_open((self.today)()) => Err(
                PlacementError::MatchingNotOpen(deadlines.opportunity_ranking()),
            ),
            _ => Ok(()),
        }
    }

    fn find_student(&self, id: &StudentId) -> Result<StudentRecord, PlacementError> {
        self.repository
            .student(id)?
            .ok_or_else(|| PlacementError::StudentNotFound(id.clone()))
    }

    fn find_opportunity(&self, id: &OpportunityId) -> Result<OpportunityRecord, PlacementError> {
        self.repository
            .opportunity(id)?
            .ok_or_else(|| PlacementError::OpportunityNotFound(id.clone()))
    }
}

fn cleaned(ranks: Vec<String>) -> impl Iterator<Item = String> {
    ranks
        .into_iter()
        .map(|rank| rank.trim().to_string())
        .filter(|rank| !rank.is_empty())
}

/// Error raised by the placement service.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("Student not found")]
    StudentNotFound(StudentId),
    #[error("Opportunity not found")]
    OpportunityNotFound(OpportunityId),
    #[error("{} not found", .0.kind.title())]
    EntityNotFound(EntityRef),
    #[error("Please rank at least one entry")]
    EmptyRanking,
    #[error("No match emails to send")]
    EmptyBatch,
    #[error("Missing {0}")]
    MissingKey(&'static str),
    #[error("Student ranking closed on {0}")]
    StudentRankingClosed(NaiveDate),
    #[error("Opportunity ranking closed on {0}")]
    OpportunityRankingClosed(NaiveDate),
    #[error("The final deadline must have passed to do matching, wait till {0}")]
    MatchingNotOpen(NaiveDate),
    #[error("Failed to send match email: {0}")]
    Mail(#[from] MailError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PlacementError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlacementError::StudentNotFound(_)
            | PlacementError::OpportunityNotFound(_)
            | PlacementError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            PlacementError::EmptyRanking | PlacementError::EmptyBatch => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PlacementError::MissingKey(_) => StatusCode::BAD_REQUEST,
            PlacementError::StudentRankingClosed(_)
            | PlacementError::OpportunityRankingClosed(_)
            | PlacementError::MatchingNotOpen(_) => StatusCode::FORBIDDEN,
            PlacementError::Mail(_) => StatusCode::BAD_GATEWAY,
            PlacementError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
