use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::domain::{RankEntry, RankInput, RankSubmission, RankingActor, TargetId};
use super::policy::CoveragePolicy;

/// Local validation failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    #[error("'{value}' is not a valid rank for {target}; use a whole number of 1 or more")]
    InvalidRank { target: TargetId, value: String },
    #[error("rank {position} is used by both {first} and {second}")]
    DuplicateRank {
        position: u32,
        first: TargetId,
        second: TargetId,
    },
    #[error("{0} appears more than once in the ranking")]
    DuplicateTarget(TargetId),
    #[error("please rank at least {required} of the {total} entries ({ranked} ranked)")]
    CoverageNotMet {
        ranked: usize,
        required: usize,
        total: usize,
    },
    #[error("a duplicate rank was just cleared; review the ranking before submitting")]
    CorrectionPending,
}

/// Checks a full set of rank inputs against a coverage policy and produces the ordered
/// submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingValidator {
    policy: CoveragePolicy,
}

impl RankingValidator {
    pub fn new(policy: CoveragePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CoveragePolicy {
        self.policy
    }

    pub fn validate(
        &self,
        actor: RankingActor,
        inputs: &[RankInput],
    ) -> Result<RankSubmission, RankingError> {
        let mut seen_targets = HashSet::with_capacity(inputs.len());
        let mut holders: HashMap<u32, &TargetId> = HashMap::new();
        let mut entries = Vec::new();

        for input in inputs {
            if !seen_targets.insert(&input.target) {
                return Err(RankingError::DuplicateTarget(input.target.clone()));
            }

            let Some(text) = input.rank_text() else {
                continue;
            };
            let position = parse_rank(&input.target, text)?;

            if let Some(first) = holders.insert(position, &input.target) {
                return Err(RankingError::DuplicateRank {
                    position,
                    first: first.clone(),
                    second: input.target.clone(),
                });
            }

            entries.push(RankEntry {
                position,
                target: input.target.clone(),
            });
        }

        let total = inputs.len();
        let required = self.policy.required(total);
        if entries.len() < required {
            return Err(RankingError::CoverageNotMet {
                ranked: entries.len(),
                required,
                total,
            });
        }

        entries.sort_by_key(|entry| entry.position);
        debug!(
            actor = actor.label(),
            actor_id = actor.id(),
            ranked = entries.len(),
            total,
            "ranking validated"
        );

        Ok(RankSubmission {
            actor,
            targets: entries.into_iter().map(|entry| entry.target).collect(),
        })
    }
}

fn parse_rank(target: &TargetId, text: &str) -> Result<u32, RankingError> {
    match text.parse::<u32>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(RankingError::InvalidRank {
            target: target.clone(),
            value: text.to_string(),
        }),
    }
}

/// Warning raised when a newly typed rank collides with one already on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRankCorrection {
    pub position: String,
    pub cleared: TargetId,
    pub held_by: TargetId,
}

impl DuplicateRankCorrection {
    pub fn message(&self) -> String {
        format!(
            "Rank {} is already given to {}; each rank can only be used once, so the rank for {} was cleared.",
            self.position, self.held_by, self.cleared
        )
    }
}

/// Result of typing into one rank box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Accepted,
    Cleared,
    Corrected(DuplicateRankCorrection),
}

/// Live state of a ranking screen. Duplicates are corrected as they are typed: the entry
/// just assigned loses its value and the current interaction may not submit.
#[derive(Debug, Clone)]
pub struct RankForm {
    actor: RankingActor,
    inputs: Vec<RankInput>,
    correction_pending: bool,
}

impl RankForm {
    pub fn new(actor: RankingActor, targets: impl IntoIterator<Item = TargetId>) -> Self {
        let inputs = targets
            .into_iter()
            .map(|target| RankInput {
                target,
                raw_rank: None,
            })
            .collect();
        Self {
            actor,
            inputs,
            correction_pending: false,
        }
    }

    pub fn actor(&self) -> &RankingActor {
        &self.actor
    }

    pub fn inputs(&self) -> &[RankInput] {
        &self.inputs
    }

    pub fn rank_of(&self, target: &TargetId) -> Option<&str> {
        self.inputs
            .iter()
            .find(|input| &input.target == target)
            .and_then(RankInput::rank_text)
    }

    /// Returns `None` when `target` is not on this form.
    pub fn assign(&mut self, target: &TargetId, raw: &str) -> Option<AssignOutcome> {
        let index = self
            .inputs
            .iter()
            .position(|input| &input.target == target)?;

        let value = raw.trim();
        if value.is_empty() {
            self.inputs[index].raw_rank = None;
            return Some(AssignOutcome::Cleared);
        }

        let holder = self
            .inputs
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .find(|(_, input)| {
                input
                    .rank_text()
                    .is_some_and(|existing| same_rank(existing, value))
            })
            .map(|(_, input)| input.target.clone());

        match holder {
            Some(held_by) => {
                self.inputs[index].raw_rank = None;
                self.correction_pending = true;
                Some(AssignOutcome::Corrected(DuplicateRankCorrection {
                    position: value.to_string(),
                    cleared: target.clone(),
                    held_by,
                }))
            }
            None => {
                self.inputs[index].raw_rank = Some(value.to_string());
                Some(AssignOutcome::Accepted)
            }
        }
    }

    /// Validates and builds the submission. The first attempt after a duplicate correction
    /// is refused so the user sees the cleared box before anything is sent.
    pub fn take_submission(
        &mut self,
        validator: &RankingValidator,
    ) -> Result<RankSubmission, RankingError> {
        if std::mem::take(&mut self.correction_pending) {
            return Err(RankingError::CorrectionPending);
        }
        validator.validate(self.actor.clone(), &self.inputs)
    }
}

fn same_rank(left: &str, right: &str) -> bool {
    match (left.parse::<u32>(), right.parse::<u32>()) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}
