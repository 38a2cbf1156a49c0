use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{MatchPair, NotificationRecord, NotificationState, RenderedPair};
use crate::workflows::portal::{BulkDispatchReply, GatewayError, PortalGateway};
use crate::workflows::ranking::{OpportunityId, StudentId};
use crate::workflows::rows::{
    ConfirmationPrompt, DeletionListener, EntityKind, EntityRef, StatusRegion,
};

/// Dispatches refused locally; the portal is never contacted for these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("a bulk dispatch is in progress")]
    BulkInFlight,
    #[error("the match email for {0} is already being sent")]
    DispatchInFlight(MatchPair),
    #[error("the match email for {0} was already sent")]
    AlreadySent(MatchPair),
    #[error("{0} is not shown on this page")]
    UnknownPair(MatchPair),
    #[error("every shown pair has already been notified")]
    NothingToSend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Cancelled,
    Sent { message: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The endpoint answered for the batch as a whole.
    Aggregate {
        delivered: bool,
        message: String,
        pairs: usize,
    },
    /// The endpoint reported each pair individually.
    PerPair {
        message: String,
        sent: Vec<MatchPair>,
        failed: Vec<(MatchPair, String)>,
    },
}

/// What the page should enable right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub send_all_enabled: bool,
    pub busy: bool,
}

#[derive(Debug, Default)]
struct MatchBoard {
    records: Vec<NotificationRecord>,
    bulk_in_flight: bool,
    generation: u64,
    status: StatusRegion,
}

impl MatchBoard {
    fn record(&self, pair: &MatchPair) -> Option<&NotificationRecord> {
        self.records.iter().find(|record| &record.pair == pair)
    }

    fn record_mut(&mut self, pair: &MatchPair) -> Option<&mut NotificationRecord> {
        self.records.iter_mut().find(|record| &record.pair == pair)
    }

    fn check_single(&self, pair: &MatchPair) -> Result<(), NotifyError> {
        if self.bulk_in_flight {
            return Err(NotifyError::BulkInFlight);
        }
        let record = self
            .record(pair)
            .ok_or_else(|| NotifyError::UnknownPair(pair.clone()))?;
        if record.dispatching {
            return Err(NotifyError::DispatchInFlight(pair.clone()));
        }
        if record.state == NotificationState::Sent {
            return Err(NotifyError::AlreadySent(pair.clone()));
        }
        Ok(())
    }

    fn settle(&mut self, generation: u64, pair: &MatchPair, state: NotificationState, message: String) {
        if self.generation != generation {
            return;
        }
        if let Some(record) = self.record_mut(pair) {
            record.settle(state, message);
        }
    }

    fn any_dispatching(&self) -> Option<&MatchPair> {
        self.records
            .iter()
            .find(|record| record.dispatching)
            .map(|record| &record.pair)
    }
}

/// Clears in-flight markers when a dispatch ends, including when its future is dropped
/// because the page went away.
struct InFlight<'a> {
    board: &'a Mutex<MatchBoard>,
    generation: u64,
    pairs: Vec<MatchPair>,
    bulk: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut board = self.board.lock().unwrap_or_else(|err| err.into_inner());
        if board.generation != self.generation {
            return;
        }
        for pair in &self.pairs {
            if let Some(record) = board.record_mut(pair) {
                record.dispatching = false;
            }
        }
        if self.bulk {
            board.bulk_in_flight = false;
        }
    }
}

/// Sends match emails for the pairs shown on the matching page and tracks each pair's
/// delivery state for the current session.
pub struct MatchNotifier<G> {
    gateway: Arc<G>,
    board: Mutex<MatchBoard>,
}

impl<G> MatchNotifier<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            board: Mutex::new(MatchBoard::default()),
        }
    }

    /// Rebuilds the board from server state. Anything remembered from before is dropped and
    /// responses to earlier requests are ignored.
    pub fn load(&self, pairs: impl IntoIterator<Item = RenderedPair>) {
        let mut board = self.board();
        board.generation += 1;
        board.bulk_in_flight = false;
        board.status.clear();
        board.records.clear();
        for rendered in pairs {
            if board.record(&rendered.pair).is_some() {
                continue;
            }
            let state = if rendered.already_sent {
                NotificationState::Sent
            } else {
                NotificationState::Unsent
            };
            board
                .records
                .push(NotificationRecord::new(rendered.pair, state));
        }
        debug!(pairs = board.records.len(), "match board loaded");
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.board().records.clone()
    }

    pub fn state_of(&self, pair: &MatchPair) -> Option<NotificationState> {
        self.board().record(pair).map(|record| record.state)
    }

    pub fn status(&self) -> StatusRegion {
        self.board().status.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.board().bulk_in_flight
    }

    pub fn controls(&self) -> ControlState {
        let board = self.board();
        let has_unsent = board
            .records
            .iter()
            .any(|record| record.state != NotificationState::Sent);
        ControlState {
            send_all_enabled: !board.bulk_in_flight
                && board.any_dispatching().is_none()
                && has_unsent,
            busy: board.bulk_in_flight,
        }
    }

    pub fn can_send(&self, pair: &MatchPair) -> bool {
        self.board().check_single(pair).is_ok()
    }

    /// Sends one pair's email after the user confirms.
    pub async fn send<P>(&self, pair: &MatchPair, prompt: &P) -> Result<DispatchOutcome, NotifyError>
    where
        P: ConfirmationPrompt + ?Sized,
    {
        self.board()
            .check_single(pair)
            .inspect_err(|err| warn!(%err, "match email refused"))?;

        let question = format!(
            "Send the match email to student {} for opportunity {}?",
            pair.student, pair.opportunity
        );
        if !prompt.confirm(&question) {
            return Ok(DispatchOutcome::Cancelled);
        }

        let generation = {
            let mut board = self.board();
            board.check_single(pair)?;
            let generation = board.generation;
            if let Some(record) = board.record_mut(pair) {
                record.dispatching = true;
                record.attempted_at = Some(Utc::now());
            }
            generation
        };
        let _flight = InFlight {
            board: &self.board,
            generation,
            pairs: vec![pair.clone()],
            bulk: false,
        };

        info!(student = %pair.student, opportunity = %pair.opportunity, "sending match email");
        let result = self.gateway.send_match_notification(pair).await;

        let mut board = self.board();
        let current = board.generation == generation;
        match result {
            Ok(message) => {
                board.settle(generation, pair, NotificationState::Sent, message.clone());
                if current {
                    board.status.success(message.clone());
                }
                Ok(DispatchOutcome::Sent { message })
            }
            Err(err) => {
                let error = err.user_message();
                warn!(
                    student = %pair.student,
                    opportunity = %pair.opportunity,
                    error = %err,
                    "match email failed"
                );
                board.settle(generation, pair, NotificationState::Failed, error.clone());
                if current {
                    board.status.error(error.clone());
                }
                Ok(DispatchOutcome::Failed { error })
            }
        }
    }

    /// Sends every shown pair that has not been notified yet, in one request.
    pub async fn send_all(&self) -> Result<BulkOutcome, NotifyError> {
        let (pairs, generation) = {
            let mut board = self.board();
            if board.bulk_in_flight {
                warn!("bulk dispatch refused while another is in flight");
                return Err(NotifyError::BulkInFlight);
            }
            if let Some(pair) = board.any_dispatching() {
                warn!(%pair, "bulk dispatch refused while a single dispatch is in flight");
                return Err(NotifyError::DispatchInFlight(pair.clone()));
            }

            let now = Utc::now();
            let mut pairs = Vec::new();
            for record in board
                .records
                .iter_mut()
                .filter(|record| record.state != NotificationState::Sent)
            {
                record.dispatching = true;
                record.attempted_at = Some(now);
                pairs.push(record.pair.clone());
            }
            if pairs.is_empty() {
                return Err(NotifyError::NothingToSend);
            }
            board.bulk_in_flight = true;
            (pairs, board.generation)
        };
        let _flight = InFlight {
            board: &self.board,
            generation,
            pairs: pairs.clone(),
            bulk: true,
        };

        info!(pairs = pairs.len(), "sending match emails in bulk");
        let result = self.gateway.send_bulk_notifications(&pairs).await;

        let mut board = self.board();
        let outcome = apply_bulk_result(&mut board, generation, &pairs, result);
        Ok(outcome)
    }

    /// Drops every pair involving a deleted entity. Returns how many pairs were removed.
    pub fn forget(&self, entity: &EntityRef) -> usize {
        match entity.kind {
            EntityKind::Student => self.forget_student(&StudentId(entity.id.clone())),
            EntityKind::Opportunity => {
                self.forget_opportunity(&OpportunityId(entity.id.clone()))
            }
            _ => 0,
        }
    }

    pub fn forget_student(&self, student: &StudentId) -> usize {
        self.retain(|pair| &pair.student != student)
    }

    pub fn forget_opportunity(&self, opportunity: &OpportunityId) -> usize {
        self.retain(|pair| &pair.opportunity != opportunity)
    }

    fn retain(&self, keep: impl Fn(&MatchPair) -> bool) -> usize {
        let mut board = self.board();
        let before = board.records.len();
        board.records.retain(|record| keep(&record.pair));
        before - board.records.len()
    }

    fn board(&self) -> MutexGuard<'_, MatchBoard> {
        self.board.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl<G> DeletionListener for MatchNotifier<G>
where
    G: PortalGateway + 'static,
{
    fn entity_deleted(&self, entity: &EntityRef) {
        let dropped = self.forget(entity);
        if dropped > 0 {
            info!(entity = %entity, dropped, "match pairs dropped after delete");
        }
    }
}

fn apply_bulk_result(
    board: &mut MatchBoard,
    generation: u64,
    pairs: &[MatchPair],
    result: Result<BulkDispatchReply, GatewayError>,
) -> BulkOutcome {
    let current = board.generation == generation;

    match result {
        Ok(BulkDispatchReply {
            message,
            results: Some(results),
        }) => {
            let mut sent = Vec::new();
            let mut failed = Vec::new();
            for pair in pairs {
                match results.iter().find(|result| &result.pair() == pair) {
                    Some(result) if result.sent => {
                        board.settle(generation, pair, NotificationState::Sent, message.clone());
                        sent.push(pair.clone());
                    }
                    Some(result) => {
                        let error = result
                            .error
                            .clone()
                            .unwrap_or_else(|| "Failed to send match email".to_string());
                        board.settle(generation, pair, NotificationState::Failed, error.clone());
                        failed.push((pair.clone(), error));
                    }
                    None => {
                        let error = "No result reported for this pair".to_string();
                        board.settle(generation, pair, NotificationState::Failed, error.clone());
                        failed.push((pair.clone(), error));
                    }
                }
            }

            if current {
                if failed.is_empty() {
                    board.status.success(message.clone());
                } else {
                    board.status.error(message.clone());
                }
            }
            info!(
                sent = sent.len(),
                failed = failed.len(),
                "bulk match emails settled per pair"
            );
            BulkOutcome::PerPair {
                message,
                sent,
                failed,
            }
        }
        Ok(BulkDispatchReply {
            message,
            results: None,
        }) => {
            for pair in pairs {
                board.settle(generation, pair, NotificationState::Sent, message.clone());
            }
            if current {
                board.status.success(message.clone());
            }
            BulkOutcome::Aggregate {
                delivered: true,
                message,
                pairs: pairs.len(),
            }
        }
        Err(err) => {
            let error = err.user_message();
            warn!(pairs = pairs.len(), error = %err, "bulk match emails failed");
            for pair in pairs {
                board.settle(generation, pair, NotificationState::Failed, error.clone());
            }
            if current {
                board.status.error(error.clone());
            }
            BulkOutcome::Aggregate {
                delivered: false,
                message: error,
                pairs: pairs.len(),
            }
        }
    }
}
