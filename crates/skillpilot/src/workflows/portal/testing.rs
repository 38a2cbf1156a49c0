use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::gateway::{BulkDispatchReply, GatewayError, PortalGateway};
use crate::workflows::matching::MatchPair;
use crate::workflows::ranking::RankSubmission;
use crate::workflows::rows::EntityRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordedCall {
    Ranking(RankSubmission),
    Single(MatchPair),
    Bulk(Vec<MatchPair>),
    Delete(EntityRef),
}

/// Gateway double that records every call and answers from canned responses.
#[derive(Default)]
pub(crate) struct SpyGateway {
    calls: Mutex<Vec<RecordedCall>>,
    ranking_error: Mutex<Option<GatewayError>>,
    single_errors: Mutex<HashMap<MatchPair, GatewayError>>,
    bulk_reply: Mutex<Option<Result<BulkDispatchReply, GatewayError>>>,
    delete_errors: Mutex<HashMap<String, GatewayError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl SpyGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls mutex").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex").len()
    }

    pub(crate) fn fail_ranking(&self, error: GatewayError) {
        *self.ranking_error.lock().expect("ranking mutex") = Some(error);
    }

    pub(crate) fn fail_single(&self, pair: MatchPair, error: GatewayError) {
        self.single_errors
            .lock()
            .expect("single mutex")
            .insert(pair, error);
    }

    pub(crate) fn reply_bulk(&self, reply: Result<BulkDispatchReply, GatewayError>) {
        *self.bulk_reply.lock().expect("bulk mutex") = Some(reply);
    }

    pub(crate) fn fail_delete(&self, id: &str, error: GatewayError) {
        self.delete_errors
            .lock()
            .expect("delete mutex")
            .insert(id.to_string(), error);
    }

    /// Holds every subsequent request until the returned handle is notified.
    pub(crate) fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().expect("gate mutex") = Some(gate.clone());
        gate
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("calls mutex").push(call);
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().expect("gate mutex").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl PortalGateway for SpyGateway {
    async fn submit_ranking(&self, submission: &RankSubmission) -> Result<(), GatewayError> {
        self.record(RecordedCall::Ranking(submission.clone()));
        self.wait_for_gate().await;
        match self.ranking_error.lock().expect("ranking mutex").clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn send_match_notification(&self, pair: &MatchPair) -> Result<String, GatewayError> {
        self.record(RecordedCall::Single(pair.clone()));
        self.wait_for_gate().await;
        match self.single_errors.lock().expect("single mutex").get(pair) {
            Some(error) => Err(error.clone()),
            None => Ok(format!("Email sent to {}", pair.student)),
        }
    }

    async fn send_bulk_notifications(
        &self,
        pairs: &[MatchPair],
    ) -> Result<BulkDispatchReply, GatewayError> {
        self.record(RecordedCall::Bulk(pairs.to_vec()));
        self.wait_for_gate().await;
        match self.bulk_reply.lock().expect("bulk mutex").clone() {
            Some(reply) => reply,
            None => Ok(BulkDispatchReply {
                message: format!("{} match emails sent", pairs.len()),
                results: None,
            }),
        }
    }

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), GatewayError> {
        self.record(RecordedCall::Delete(entity.clone()));
        self.wait_for_gate().await;
        match self.delete_errors.lock().expect("delete mutex").get(&entity.id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Prompt double answering every confirmation the same way.
pub(crate) struct FixedPrompt {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl FixedPrompt {
    pub(crate) fn yes() -> Self {
        Self {
            answer: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn no() -> Self {
        Self {
            answer: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn questions(&self) -> Vec<String> {
        self.asked.lock().expect("prompt mutex").clone()
    }
}

impl crate::workflows::rows::ConfirmationPrompt for FixedPrompt {
    fn confirm(&self, question: &str) -> bool {
        self.asked
            .lock()
            .expect("prompt mutex")
            .push(question.to_string());
        self.answer
    }
}
