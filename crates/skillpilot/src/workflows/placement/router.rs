use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, post, MethodRouter},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::repository::{MatchMailer, PlacementRepository};
use super::service::{PlacementError, PlacementService};
use crate::error::AppError;
use crate::workflows::matching::MatchPair;
use crate::workflows::portal::{BulkDispatchRequest, PortalReply};
use crate::workflows::ranking::{OpportunityId, StudentId};
use crate::workflows::rows::{EntityKind, EntityRef};

type SharedService<R, M> = Arc<PlacementService<R, M>>;
type Reply = Result<Json<Value>, AppError>;

#[derive(Debug, Deserialize)]
pub(crate) struct RanksForm {
    #[serde(default)]
    ranks: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpportunityQuery {
    opportunity_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchForm {
    student: String,
    opportunity: String,
}

/// Router builder exposing the portal endpoints the coordinator talks to.
pub fn placement_router<R, M>(service: SharedService<R, M>) -> Router
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    let mut router = Router::new()
        .route(
            "/students/rank_preferences/:student_id",
            post(rank_opportunities_handler::<R, M>),
        )
        .route("/employers/rank_students", post(rank_students_handler::<R, M>))
        .route("/user/send_match_email", post(send_match_email_handler::<R, M>))
        .route(
            "/user/send_match_emails",
            post(send_match_emails_handler::<R, M>),
        );

    // Delete routes come from the same table the client uses; `:id` doubles as the axum
    // path parameter.
    for kind in EntityKind::ordered() {
        let route = EntityRef::new(kind, ":id").delete_route();
        let handler = match route.query {
            Some((key, _)) => delete_by_query::<R, M>(kind, key),
            None => delete_by_path::<R, M>(kind),
        };
        router = router.route(&route.joined(), handler);
    }

    router.with_state(service)
}

pub(crate) async fn rank_opportunities_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(student_id): Path<String>,
    Form(form): Form<RanksForm>,
) -> Reply
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    let student = StudentId(student_id);
    service.rank_opportunities(&student, split_ranks(&form.ranks))?;
    Ok(message("Preferences updated"))
}

pub(crate) async fn rank_students_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Query(query): Query<OpportunityQuery>,
    Form(form): Form<RanksForm>,
) -> Reply
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    let opportunity = OpportunityId(query.opportunity_id);
    service.rank_students(&opportunity, split_ranks(&form.ranks))?;
    Ok(message("Preferences updated"))
}

pub(crate) async fn send_match_email_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Form(form): Form<MatchForm>,
) -> Reply
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    let pair = MatchPair::new(form.student, form.opportunity);
    let sent = service.send_match_email(&pair)?;
    Ok(message(sent))
}

pub(crate) async fn send_match_emails_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Json(request): Json<BulkDispatchRequest>,
) -> Result<Json<PortalReply>, AppError>
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    let reply = service.send_match_emails(&request.students)?;
    Ok(Json(reply))
}

fn delete_by_path<R, M>(kind: EntityKind) -> MethodRouter<SharedService<R, M>>
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    delete(
        move |State(service): State<SharedService<R, M>>, Path(id): Path<String>| async move {
            remove(&service, EntityRef::new(kind, id))
        },
    )
}

fn delete_by_query<R, M>(kind: EntityKind, key: &'static str) -> MethodRouter<SharedService<R, M>>
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    delete(
        move |State(service): State<SharedService<R, M>>,
              Query(params): Query<HashMap<String, String>>| async move {
            match params.get(key).map(|id| id.trim()).filter(|id| !id.is_empty()) {
                Some(id) => remove(&service, EntityRef::new(kind, id)),
                None => Err(PlacementError::MissingKey(key).into()),
            }
        },
    )
}

fn remove<R, M>(service: &PlacementService<R, M>, entity: EntityRef) -> Reply
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    service.delete(&entity)?;
    Ok(message(format!("{} deleted", entity.kind.title())))
}

fn split_ranks(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}
