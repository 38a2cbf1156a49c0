use crate::infra::{InMemoryMailer, InMemoryPlacementRepository};
use clap::Args;
use skillpilot::config::{AppConfig, PortalConfig, RankingConfig};
use skillpilot::error::AppError;
use skillpilot::workflows::matching::{
    BulkOutcome, DispatchOutcome, MatchNotifier, MatchPair, RenderedPair,
};
use skillpilot::workflows::placement::{placement_router, PlacementService};
use skillpilot::workflows::portal::HttpPortalGateway;
use skillpilot::workflows::ranking::{
    validate_and_submit, AssignOutcome, CoveragePolicy, OpportunityId, RankForm, RankSubmitter,
    RankingActor, RankingError, RankingValidator, StudentId, SubmissionOutcome, TargetId,
};
use skillpilot::workflows::rows::{
    ConfirmationPrompt, DeleteOutcome, EntityKind, EntityRef, EntityRow, EntityRowSync,
    ListViewModel,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Coverage rule for student rankings, e.g. `fixed:5`; defaults to STUDENT_RANK_POLICY
    #[arg(long)]
    pub(crate) student_policy: Option<CoveragePolicy>,
    /// Coverage rule for employer rankings; defaults to OPPORTUNITY_RANK_POLICY
    #[arg(long)]
    pub(crate) opportunity_policy: Option<CoveragePolicy>,
    /// Skip the match email portion of the demo.
    #[arg(long)]
    pub(crate) skip_matching: bool,
}

/// Flags win; otherwise the demo enforces what the configured portal advertises.
fn resolve_policies(
    student: Option<CoveragePolicy>,
    opportunity: Option<CoveragePolicy>,
    configured: RankingConfig,
) -> (CoveragePolicy, CoveragePolicy) {
    (
        student.unwrap_or(configured.student_policy),
        opportunity.unwrap_or(configured.opportunity_policy),
    )
}

/// Answers every confirmation with yes and echoes the question.
struct AutoConfirm;

impl ConfirmationPrompt for AutoConfirm {
    fn confirm(&self, question: &str) -> bool {
        println!("  ? {question} [yes]");
        true
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        student_policy,
        opportunity_policy,
        skip_matching,
    } = args;
    let (student_policy, opportunity_policy) = resolve_policies(
        student_policy,
        opportunity_policy,
        AppConfig::load()?.ranking,
    );

    let repository = InMemoryPlacementRepository::seeded();
    let mailer = InMemoryMailer::default();
    mailer.bounce("edsger.dijkstra@students.example.ac.uk");
    let service = Arc::new(PlacementService::new(
        Arc::new(repository.clone()),
        Arc::new(mailer.clone()),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let portal = tokio::spawn(axum::serve(listener, placement_router(service)).into_future());

    let gateway = Arc::new(HttpPortalGateway::new(&PortalConfig {
        base_url: format!("http://{addr}"),
        request_timeout: Duration::from_secs(5),
    })?);

    println!("Skillpilot coordinator demo (portal on http://{addr})");

    student_ranking(&gateway, student_policy).await;
    employer_ranking(&gateway, opportunity_policy).await;

    let notifier = Arc::new(MatchNotifier::new(gateway.clone()));
    notifier.load(demo_pairs().into_iter().map(RenderedPair::from));
    if !skip_matching {
        match_emails(&notifier).await;
        println!("  Outbox now holds {} email(s)", mailer.outbox().len());
    }

    row_deletion(&gateway, &notifier, &repository).await;

    portal.abort();
    Ok(())
}

async fn student_ranking(gateway: &Arc<HttpPortalGateway>, policy: CoveragePolicy) {
    println!("\nStudent ranking ({})", policy.describe());
    let targets: Vec<TargetId> = (1..=8).map(|n| TargetId(format!("opp-{n}"))).collect();
    let actor = RankingActor::Student(StudentId("s-1001".to_string()));
    let mut form = RankForm::new(actor, targets.clone());
    let validator = RankingValidator::new(policy);
    let submitter = RankSubmitter::new(gateway.clone());

    for (target, rank) in targets.iter().zip(["2", "4", "1", "3"]) {
        form.assign(target, rank);
    }
    report_submission(validate_and_submit(&validator, &submitter, &mut form).await);

    if let Some(AssignOutcome::Corrected(correction)) =
        form.assign(&targets[4], "1")
    {
        println!("  ! {}", correction.message());
    }
    report_submission(validate_and_submit(&validator, &submitter, &mut form).await);

    form.assign(&targets[4], "5");
    form.assign(&targets[6], "6");
    report_submission(validate_and_submit(&validator, &submitter, &mut form).await);
}

async fn employer_ranking(gateway: &Arc<HttpPortalGateway>, policy: CoveragePolicy) {
    println!("\nEmployer ranking for opp-2 ({})", policy.describe());
    let applicants: Vec<TargetId> = ["s-1001", "s-1002", "s-1003", "s-1004"]
        .iter()
        .map(|id| TargetId(id.to_string()))
        .collect();
    let actor = RankingActor::Opportunity(OpportunityId("opp-2".to_string()));
    let mut form = RankForm::new(actor, applicants.clone());
    let validator = RankingValidator::new(policy);
    let submitter = RankSubmitter::new(gateway.clone());

    form.assign(&applicants[2], "1");
    form.assign(&applicants[0], "2");
    report_submission(validate_and_submit(&validator, &submitter, &mut form).await);
}

fn report_submission(result: Result<SubmissionOutcome, RankingError>) {
    match result {
        Err(err) => println!("  - Blocked before sending: {err}"),
        Ok(SubmissionOutcome::Navigate(view)) => {
            println!("  - Accepted; navigating to {}", view.path())
        }
        Ok(SubmissionOutcome::Failed { message, cause }) => {
            println!("  - {message} ({cause})")
        }
    }
}

fn demo_pairs() -> Vec<MatchPair> {
    vec![
        MatchPair::new("s-1001", "opp-1"),
        MatchPair::new("s-1002", "opp-2"),
        MatchPair::new("s-1003", "opp-3"),
        MatchPair::new("s-1004", "opp-4"),
    ]
}

async fn match_emails(notifier: &MatchNotifier<HttpPortalGateway>) {
    println!("\nMatch emails");
    let pairs = demo_pairs();

    match notifier.send(&pairs[0], &AutoConfirm).await {
        Ok(DispatchOutcome::Sent { message }) => println!("  - {}: {message}", pairs[0]),
        Ok(DispatchOutcome::Failed { error }) => println!("  - {} failed: {error}", pairs[0]),
        Ok(DispatchOutcome::Cancelled) => println!("  - {} cancelled", pairs[0]),
        Err(err) => println!("  - {} refused: {err}", pairs[0]),
    }

    match notifier.send_all().await {
        Ok(BulkOutcome::PerPair {
            message,
            sent,
            failed,
        }) => {
            println!("  - Bulk: {message}");
            for pair in sent {
                println!("    sent   {pair}");
            }
            for (pair, error) in failed {
                println!("    failed {pair}: {error}");
            }
        }
        Ok(BulkOutcome::Aggregate { message, .. }) => println!("  - Bulk: {message}"),
        Err(err) => println!("  - Bulk refused: {err}"),
    }

    for record in notifier.records() {
        println!("  {} -> {}", record.pair, record.state.label());
    }
}

async fn row_deletion(
    gateway: &Arc<HttpPortalGateway>,
    notifier: &Arc<MatchNotifier<HttpPortalGateway>>,
    repository: &InMemoryPlacementRepository,
) {
    println!("\nStudent list");
    let rows = repository
        .students()
        .unwrap_or_default()
        .into_iter()
        .map(|student| {
            EntityRow::new(
                EntityRef::new(EntityKind::Student, student.id.0.clone()),
                [("name", student.full_name()), ("email", student.email)],
            )
        });
    let sync = EntityRowSync::new(
        gateway.clone(),
        ListViewModel::from_rows(EntityKind::Student, rows),
    )
    .on_deleted(notifier.clone());

    for id in ["s-1003", "s-9999"] {
        match sync.delete(id, &AutoConfirm).await {
            Ok(DeleteOutcome::Deleted(row)) => {
                println!("  - Removed {}", row.display_name())
            }
            Ok(DeleteOutcome::Failed { message }) => println!("  - Kept {id}: {message}"),
            Ok(DeleteOutcome::Cancelled) => println!("  - Cancelled {id}"),
            Err(err) => println!("  - Refused: {err}"),
        }
    }
    if let Some(status) = sync.status().current() {
        println!("  Status: {}", status.text);
    }
    println!("  Remaining: {}", sync.indexed_ids().join(", "));
    let pairs: Vec<_> = notifier
        .records()
        .into_iter()
        .map(|record| record.pair.to_string())
        .collect();
    println!("  Match pairs still shown: {}", pairs.join("; "));

    let ranked_by = repository
        .opportunities()
        .unwrap_or_default()
        .into_iter()
        .filter(|opportunity| !opportunity.preferences.is_empty())
        .map(|opportunity| {
            let students: Vec<_> = opportunity.preferences.iter().map(|id| id.0.as_str()).collect();
            format!("{} [{}]", opportunity.id, students.join(", "))
        })
        .collect::<Vec<_>>();
    println!("  Employer rankings after deletion: {}", ranked_by.join("; "));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RankingConfig {
        RankingConfig {
            student_policy: CoveragePolicy::FixedCount(3),
            opportunity_policy: CoveragePolicy::FractionOfTotal(0.25),
            deadlines: None,
        }
    }

    #[test]
    fn configured_policies_apply_without_flags() {
        assert_eq!(
            resolve_policies(None, None, configured()),
            (
                CoveragePolicy::FixedCount(3),
                CoveragePolicy::FractionOfTotal(0.25)
            )
        );
    }

    #[test]
    fn flags_override_one_screen_at_a_time() {
        assert_eq!(
            resolve_policies(Some(CoveragePolicy::FixedCount(6)), None, configured()),
            (
                CoveragePolicy::FixedCount(6),
                CoveragePolicy::FractionOfTotal(0.25)
            )
        );
    }
}
