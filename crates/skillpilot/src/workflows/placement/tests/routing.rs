use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::placement::placement_router;
use crate::workflows::ranking::{OpportunityId, StudentId};

fn app() -> (Arc<MemoryRepository>, Arc<MemoryMailer>, axum::Router) {
    let (repository, mailer, service) = service();
    (repository, mailer, placement_router(Arc::new(service)))
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn student_ranking_form_is_stored() {
    let (repository, _mailer, app) = app();

    let response = app
        .oneshot(form_request(
            "/students/rank_preferences/s-300",
            "ranks=opp-2%2Copp-1",
        ))
        .await
        .expect("response");

    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Preferences updated" }));
    assert_eq!(
        repository.student_record("s-300").expect("student").preferences,
        vec![
            OpportunityId("opp-2".to_string()),
            OpportunityId("opp-1".to_string())
        ]
    );
}

#[tokio::test]
async fn employer_ranking_uses_the_query_string() {
    let (repository, _mailer, app) = app();

    let response = app
        .oneshot(form_request(
            "/employers/rank_students?opportunity_id=opp-2",
            "ranks=s-300%2Cs-100",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        repository
            .opportunity_record("opp-2")
            .expect("opportunity")
            .preferences,
        vec![StudentId("s-300".to_string()), StudentId("s-100".to_string())]
    );
}

#[tokio::test]
async fn unknown_student_is_404_and_empty_ranks_are_422() {
    let (_repository, _mailer, app) = app();

    let missing = app
        .clone()
        .oneshot(form_request("/students/rank_preferences/s-404", "ranks=opp-1"))
        .await
        .expect("response");
    let empty = app
        .oneshot(form_request("/students/rank_preferences/s-100", "ranks="))
        .await
        .expect("response");

    let (status, body) = json_body(missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Student not found" }));
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bounced_match_email_is_502() {
    let (_repository, mailer, app) = app();
    mailer.bounce("ada@example.ac.uk", "no such user");

    let response = app
        .oneshot(form_request(
            "/user/send_match_email",
            "student=s-100&opportunity=opp-1",
        ))
        .await
        .expect("response");

    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .is_some_and(|error| error.contains("no such user")));
}

#[tokio::test]
async fn bulk_endpoint_returns_per_pair_results() {
    let (_repository, _mailer, app) = app();
    let payload = json!({
        "students": [
            { "student": "s-100", "opportunity": "opp-1" },
            { "student": "s-200", "opportunity": "opp-404" }
        ]
    });

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/user/send_match_emails")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sent 1 of 2 match emails");
    assert_eq!(body["results"][0]["sent"], true);
    assert_eq!(body["results"][1]["sent"], false);
    assert_eq!(body["results"][1]["error"], "Opportunity not found");
}

#[tokio::test]
async fn delete_routes_accept_path_and_query_ids() {
    let (repository, _mailer, app) = app();

    let by_path = app
        .clone()
        .oneshot(delete_request("/students/delete_student/s-200"))
        .await
        .expect("response");
    let course = app
        .clone()
        .oneshot(delete_request("/courses/delete_course/c-1"))
        .await
        .expect("response");
    let opportunity = app
        .clone()
        .oneshot(delete_request(
            "/opportunities/employer_delete_opportunity?opportunity_id=opp-2",
        ))
        .await
        .expect("response");
    let missing_key = app
        .oneshot(delete_request("/skills/delete"))
        .await
        .expect("response");

    let (status, body) = json_body(by_path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Student deleted" }));
    assert_eq!(course.status(), StatusCode::OK);
    assert_eq!(opportunity.status(), StatusCode::OK);
    assert_eq!(missing_key.status(), StatusCode::BAD_REQUEST);
    assert!(repository.student_record("s-200").is_none());
    assert!(repository.opportunity_record("opp-2").is_none());
}

#[tokio::test]
async fn deleting_an_unknown_user_is_404() {
    let (_repository, _mailer, app) = app();

    let response = app
        .oneshot(delete_request("/users/delete?uuid=u-1"))
        .await
        .expect("response");

    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));
}
