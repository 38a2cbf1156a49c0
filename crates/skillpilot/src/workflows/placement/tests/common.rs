use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::placement::{
    MailError, MatchEmail, MatchMailer, OpportunityRecord, PlacementRepository,
    PlacementService, RepositoryError, StudentRecord,
};
use crate::workflows::ranking::{OpportunityId, StudentId};
use crate::workflows::rows::{EntityKind, EntityRef};

#[derive(Default)]
pub(super) struct MemoryRepository {
    students: Mutex<BTreeMap<StudentId, StudentRecord>>,
    opportunities: Mutex<BTreeMap<OpportunityId, OpportunityRecord>>,
    others: Mutex<HashSet<EntityRef>>,
}

impl MemoryRepository {
    pub(super) fn seeded() -> Arc<Self> {
        let repository = Self::default();
        for (id, first, last) in [
            ("s-100", "Ada", "Lovelace"),
            ("s-200", "Alan", "Turing"),
            ("s-300", "Grace", "Hopper"),
        ] {
            repository.students.lock().expect("students").insert(
                StudentId(id.to_string()),
                StudentRecord {
                    id: StudentId(id.to_string()),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: format!("{}@example.ac.uk", first.to_lowercase()),
                    preferences: vec![OpportunityId("opp-1".to_string())],
                },
            );
        }
        for (id, title) in [("opp-1", "Backend Intern"), ("opp-2", "Data Analyst")] {
            repository.opportunities.lock().expect("opportunities").insert(
                OpportunityId(id.to_string()),
                OpportunityRecord {
                    id: OpportunityId(id.to_string()),
                    title: title.to_string(),
                    employer: "Acme Ltd".to_string(),
                    spots_available: 2,
                    preferences: vec![
                        StudentId("s-100".to_string()),
                        StudentId("s-200".to_string()),
                    ],
                },
            );
        }
        repository
            .others
            .lock()
            .expect("others")
            .insert(EntityRef::new(EntityKind::Course, "c-1"));
        Arc::new(repository)
    }

    pub(super) fn student_record(&self, id: &str) -> Option<StudentRecord> {
        self.students
            .lock()
            .expect("students")
            .get(&StudentId(id.to_string()))
            .cloned()
    }

    pub(super) fn opportunity_record(&self, id: &str) -> Option<OpportunityRecord> {
        self.opportunities
            .lock()
            .expect("opportunities")
            .get(&OpportunityId(id.to_string()))
            .cloned()
    }
}

impl PlacementRepository for MemoryRepository {
    fn student(&self, id: &StudentId) -> Result<Option<StudentRecord>, RepositoryError> {
        Ok(self.students.lock().expect("students").get(id).cloned())
    }

    fn opportunity(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<OpportunityRecord>, RepositoryError> {
        Ok(self
            .opportunities
            .lock()
            .expect("opportunities")
            .get(id)
            .cloned())
    }

    fn set_student_preferences(
        &self,
        id: &StudentId,
        preferences: Vec<OpportunityId>,
    ) -> Result<(), RepositoryError> {
        let mut students = self.students.lock().expect("students");
        let record = students.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.preferences = preferences;
        Ok(())
    }

    fn set_opportunity_preferences(
        &self,
        id: &OpportunityId,
        preferences: Vec<StudentId>,
    ) -> Result<(), RepositoryError> {
        let mut opportunities = self.opportunities.lock().expect("opportunities");
        let record = opportunities.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.preferences = preferences;
        Ok(())
    }

    fn delete(&self, entity: &EntityRef) -> Result<(), RepositoryError> {
        let removed = match entity.kind {
            EntityKind::Student => self
                .students
                .lock()
                .expect("students")
                .remove(&StudentId(entity.id.clone()))
                .is_some(),
            EntityKind::Opportunity => self
                .opportunities
                .lock()
                .expect("opportunities")
                .remove(&OpportunityId(entity.id.clone()))
                .is_some(),
            _ => self.others.lock().expect("others").remove(entity),
        };
        if removed {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn purge_preferences(&self, entity: &EntityRef) -> Result<usize, RepositoryError> {
        let mut changed = 0;
        match entity.kind {
            EntityKind::Student => {
                for record in self.opportunities.lock().expect("opportunities").values_mut() {
                    let before = record.preferences.len();
                    record.preferences.retain(|id| id.0 != entity.id);
                    changed += usize::from(record.preferences.len() != before);
                }
            }
            EntityKind::Opportunity => {
                for record in self.students.lock().expect("students").values_mut() {
                    let before = record.preferences.len();
                    record.preferences.retain(|id| id.0 != entity.id);
                    changed += usize::from(record.preferences.len() != before);
                }
            }
            _ => {}
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub(super) struct MemoryMailer {
    sent: Mutex<Vec<MatchEmail>>,
    bounce: Mutex<HashMap<String, String>>,
}

impl MemoryMailer {
    pub(super) fn bounce(&self, recipient: &str, reason: &str) {
        self.bounce
            .lock()
            .expect("bounce")
            .insert(recipient.to_string(), reason.to_string());
    }

    pub(super) fn sent(&self) -> Vec<MatchEmail> {
        self.sent.lock().expect("sent").clone()
    }
}

impl MatchMailer for MemoryMailer {
    fn send(&self, email: &MatchEmail) -> Result<(), MailError> {
        if let Some(reason) = self.bounce.lock().expect("bounce").get(&email.recipient) {
            return Err(MailError::Rejected {
                recipient: email.recipient.clone(),
                reason: reason.clone(),
            });
        }
        self.sent.lock().expect("sent").push(email.clone());
        Ok(())
    }
}

pub(super) fn service() -> (
    Arc<MemoryRepository>,
    Arc<MemoryMailer>,
    PlacementService<MemoryRepository, MemoryMailer>,
) {
    let repository = MemoryRepository::seeded();
    let mailer = Arc::new(MemoryMailer::default());
    let service = PlacementService::new(repository.clone(), mailer.clone());
    (repository, mailer, service)
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
