use serde::{Deserialize, Serialize};

use crate::workflows::matching::MatchPair;
use crate::workflows::ranking::{OpportunityId, StudentId};

/// Stored student profile with the opportunities they ranked, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Vec<OpportunityId>,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Stored placement opportunity with the students its employer ranked, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: OpportunityId,
    pub title: String,
    pub employer: String,
    pub spots_available: u32,
    #[serde(default)]
    pub preferences: Vec<StudentId>,
}

/// Outbound "you have been matched" email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEmail {
    pub pair: MatchPair,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl MatchEmail {
    pub fn compose(student: &StudentRecord, opportunity: &OpportunityRecord) -> Self {
        let body = format!(
            "Dear {},\n\nYou have been matched with the placement \"{}\" at {}. \
             The employer will be in touch with next steps.\n\nBest regards,\nSkillpilot Team",
            student.full_name(),
            opportunity.title,
            opportunity.employer
        );
        Self {
            pair: MatchPair {
                student: student.id.clone(),
                opportunity: opportunity.id.clone(),
            },
            recipient: student.email.clone(),
            subject: "Skillpilot: You have been matched".to_string(),
            body,
        }
    }
}
