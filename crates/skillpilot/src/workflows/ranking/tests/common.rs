use crate::workflows::ranking::{
    CoveragePolicy, RankForm, RankInput, RankingActor, RankingValidator, StudentId, TargetId,
};

pub(super) fn student() -> RankingActor {
    RankingActor::Student(StudentId("s-100".to_string()))
}

pub(super) fn opportunity_targets(count: usize) -> Vec<TargetId> {
    (1..=count).map(|n| TargetId(format!("opp-{n}"))).collect()
}

pub(super) fn student_validator() -> RankingValidator {
    RankingValidator::new(CoveragePolicy::FixedCount(5))
}

/// Eight opportunities with the first `ranked` of them ranked in reverse order.
pub(super) fn inputs_with_ranked(ranked: usize) -> Vec<RankInput> {
    opportunity_targets(8)
        .into_iter()
        .enumerate()
        .map(|(index, target)| {
            if index < ranked {
                RankInput::ranked(target.0, (ranked - index) as u32)
            } else {
                RankInput::unranked(target.0)
            }
        })
        .collect()
}

pub(super) fn form_with_ranked(ranked: usize) -> RankForm {
    let mut form = RankForm::new(student(), opportunity_targets(8));
    for input in inputs_with_ranked(ranked) {
        if let Some(rank) = input.raw_rank.as_deref() {
            form.assign(&input.target, rank).expect("target on form");
        }
    }
    form
}
