use metrics_exporter_prometheus::PrometheusHandle;
use skillpilot::config::RankingConfig;
use skillpilot::workflows::placement::{
    MailError, MatchEmail, MatchMailer, OpportunityRecord, PlacementRepository,
    RepositoryError, StudentRecord,
};
use skillpilot::workflows::ranking::{OpportunityId, StudentId};
use skillpilot::workflows::rows::{EntityKind, EntityRef};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) ranking: RankingConfig,
}

#[derive(Default)]
struct PlacementTables {
    students: BTreeMap<StudentId, StudentRecord>,
    opportunities: BTreeMap<OpportunityId, OpportunityRecord>,
    others: HashSet<EntityRef>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPlacementRepository {
    tables: Arc<Mutex<PlacementTables>>,
}

impl InMemoryPlacementRepository {
    /// A small cohort used by the demo and the bundled server.
    pub(crate) fn seeded() -> Self {
        let repository = Self::default();
        let cohort = [
            ("s-1001", "Ada", "Lovelace"),
            ("s-1002", "Alan", "Turing"),
            ("s-1003", "Grace", "Hopper"),
            ("s-1004", "Edsger", "Dijkstra"),
        ];
        for (id, first, last) in cohort {
            repository.insert_student(StudentRecord {
                id: StudentId(id.to_string()),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{}.{}@students.example.ac.uk", first, last).to_lowercase(),
                preferences: Vec::new(),
            });
        }

        let openings = [
            ("opp-1", "Backend Engineering Intern", "Northwind Systems"),
            ("opp-2", "Data Analyst Placement", "Contoso Analytics"),
            ("opp-3", "Embedded Firmware Intern", "Tailspin Devices"),
            ("opp-4", "Security Operations Intern", "Fabrikam Security"),
            ("opp-5", "Platform Reliability Intern", "Northwind Systems"),
            ("opp-6", "Machine Learning Placement", "Contoso Analytics"),
            ("opp-7", "Mobile Developer Intern", "Adventure Works"),
            ("opp-8", "QA Automation Intern", "Tailspin Devices"),
        ];
        for (id, title, employer) in openings {
            repository.insert_opportunity(OpportunityRecord {
                id: OpportunityId(id.to_string()),
                title: title.to_string(),
                employer: employer.to_string(),
                spots_available: 2,
                preferences: Vec::new(),
            });
        }

        repository.insert_entity(EntityRef::new(EntityKind::Course, "c-cs"));
        repository.insert_entity(EntityRef::new(EntityKind::Skill, "sk-rust"));
        repository
    }

    pub(crate) fn insert_student(&self, record: StudentRecord) {
        if let Ok(mut tables) = self.tables() {
            tables.students.insert(record.id.clone(), record);
        }
    }

    pub(crate) fn insert_opportunity(&self, record: OpportunityRecord) {
        if let Ok(mut tables) = self.tables() {
            tables.opportunities.insert(record.id.clone(), record);
        }
    }

    pub(crate) fn insert_entity(&self, entity: EntityRef) {
        if let Ok(mut tables) = self.tables() {
            tables.others.insert(entity);
        }
    }

    pub(crate) fn students(&self) -> Result<Vec<StudentRecord>, RepositoryError> {
        Ok(self.tables()?.students.values().cloned().collect())
    }

    pub(crate) fn opportunities(&self) -> Result<Vec<OpportunityRecord>, RepositoryError> {
        Ok(self.tables()?.opportunities.values().cloned().collect())
    }

    fn tables(&self) -> Result<MutexGuard<'_, PlacementTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("placement tables poisoned".to_string()))
    }
}

impl PlacementRepository for InMemoryPlacementRepository {
    fn student(&self, id: &StudentId) -> Result<Option<StudentRecord>, RepositoryError> {
        Ok(self.tables()?.students.get(id).cloned())
    }

    fn opportunity(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<OpportunityRecord>, RepositoryError> {
        Ok(self.tables()?.opportunities.get(id).cloned())
    }

    fn set_student_preferences(
        &self,
        id: &StudentId,
        preferences: Vec<OpportunityId>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let record = tables
            .students
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.preferences = preferences;
        Ok(())
    }

    fn set_opportunity_preferences(
        &self,
        id: &OpportunityId,
        preferences: Vec<StudentId>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let record = tables
            .opportunities
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.preferences = preferences;
        Ok(())
    }

    fn delete(&self, entity: &EntityRef) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let removed = match entity.kind {
            EntityKind::Student => tables
                .students
                .remove(&StudentId(entity.id.clone()))
                .is_some(),
            EntityKind::Opportunity => tables
                .opportunities
                .remove(&OpportunityId(entity.id.clone()))
                .is_some(),
            _ => tables.others.remove(entity),
        };
        if removed {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn purge_preferences(&self, entity: &EntityRef) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let mut changed = 0;
        match entity.kind {
            EntityKind::Student => {
                for record in tables.opportunities.values_mut() {
                    changed += usize::from(strip(&mut record.preferences, |id| id.0 == entity.id));
                }
            }
            EntityKind::Opportunity => {
                for record in tables.students.values_mut() {
                    changed += usize::from(strip(&mut record.preferences, |id| id.0 == entity.id));
                }
            }
            _ => {}
        }
        Ok(changed)
    }
}

fn strip<T>(list: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = list.len();
    list.retain(|item| !matches(item));
    list.len() != before
}

/// Mailer that keeps an outbox instead of talking to an SMTP relay.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMailer {
    outbox: Arc<Mutex<Vec<MatchEmail>>>,
    bounces: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryMailer {
    pub(crate) fn bounce(&self, recipient: &str) {
        if let Ok(mut bounces) = self.bounces.lock() {
            bounces.insert(recipient.to_string());
        }
    }

    pub(crate) fn outbox(&self) -> Vec<MatchEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl MatchMailer for InMemoryMailer {
    fn send(&self, email: &MatchEmail) -> Result<(), MailError> {
        let bounced = self
            .bounces
            .lock()
            .map_err(|_| MailError::Transport("bounce list poisoned".to_string()))?
            .contains(&email.recipient);
        if bounced {
            return Err(MailError::Rejected {
                recipient: email.recipient.clone(),
                reason: "mailbox unavailable".to_string(),
            });
        }

        self.outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox poisoned".to_string()))?
            .push(email.clone());
        info!(recipient = %email.recipient, subject = %email.subject, "match email queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleting_a_student_strips_them_from_opportunity_rankings() {
        let repository = InMemoryPlacementRepository::seeded();
        repository
            .set_opportunity_preferences(
                &OpportunityId("opp-1".to_string()),
                vec![
                    StudentId("s-1002".to_string()),
                    StudentId("s-1001".to_string()),
                ],
            )
            .expect("stored");

        let entity = EntityRef::new(EntityKind::Student, "s-1002");
        repository.delete(&entity).expect("deleted");
        let changed = repository.purge_preferences(&entity).expect("purged");

        assert_eq!(changed, 1);
        let opportunity = repository
            .opportunity(&OpportunityId("opp-1".to_string()))
            .expect("lookup")
            .expect("present");
        assert_eq!(opportunity.preferences, vec![StudentId("s-1001".to_string())]);
        assert!(matches!(
            repository.delete(&entity),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn bounced_recipient_is_rejected_and_not_queued() {
        let mailer = InMemoryMailer::default();
        mailer.bounce("ada.lovelace@students.example.ac.uk");
        let repository = InMemoryPlacementRepository::seeded();
        let student = repository
            .student(&StudentId("s-1001".to_string()))
            .expect("lookup")
            .expect("present");
        let opportunity = repository
            .opportunity(&OpportunityId("opp-2".to_string()))
            .expect("lookup")
            .expect("present");

        let result = mailer.send(&MatchEmail::compose(&student, &opportunity));

        assert!(matches!(result, Err(MailError::Rejected { .. })));
        assert!(mailer.outbox().is_empty());
    }
}
