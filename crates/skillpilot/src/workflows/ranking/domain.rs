use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for students as the portal knows them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

/// Identifier wrapper for placement opportunities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(pub String);

/// Something an actor ranks: an opportunity for a student, a student for an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&StudentId> for TargetId {
    fn from(value: &StudentId) -> Self {
        Self(value.0.clone())
    }
}

impl From<&OpportunityId> for TargetId {
    fn from(value: &OpportunityId) -> Self {
        Self(value.0.clone())
    }
}

/// The side of the bipartite relationship submitting a preference list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RankingActor {
    Student(StudentId),
    Opportunity(OpportunityId),
}

impl RankingActor {
    pub const fn label(&self) -> &'static str {
        match self {
            RankingActor::Student(_) => "student",
            RankingActor::Opportunity(_) => "opportunity",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RankingActor::Student(id) => &id.0,
            RankingActor::Opportunity(id) => &id.0,
        }
    }
}

/// One rankable row as the user left it: the target plus whatever was typed into its box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankInput {
    pub target: TargetId,
    pub raw_rank: Option<String>,
}

impl RankInput {
    pub fn ranked(target: impl Into<String>, rank: u32) -> Self {
        Self {
            target: TargetId(target.into()),
            raw_rank: Some(rank.to_string()),
        }
    }

    pub fn unranked(target: impl Into<String>) -> Self {
        Self {
            target: TargetId(target.into()),
            raw_rank: None,
        }
    }

    /// Blank and whitespace-only boxes count as "not ranked".
    pub fn rank_text(&self) -> Option<&str> {
        self.raw_rank
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// A parsed, positive rank bound to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub position: u32,
    pub target: TargetId,
}

/// Ordered preference list ready for the wire. Positions are dropped once sorted; order is
/// the only signal the endpoint receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSubmission {
    pub actor: RankingActor,
    pub targets: Vec<TargetId>,
}

impl RankSubmission {
    /// Form value for the `ranks` field, joined the way a browser serialises an array.
    pub fn ranks_field(&self) -> String {
        self.targets
            .iter()
            .map(|target| target.0.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
