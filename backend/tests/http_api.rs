//! End-to-end HTTP tests over the in-memory store.
//!
//! Each test builds the real application tree (every route, the tracing
//! middleware, the bearer gate) against `InMemoryStore`, so request and
//! response shapes match what a deployed server produces.

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use chrono::Duration;
use serde_json::{json, Value};

use microlend::domain::{Role, TokenCodec, UserId};
use microlend::inbound::http::{HealthState, HttpState};
use microlend::outbound::persistence::InMemoryStore;
use microlend::server::build_app;

struct Fixture {
    store: Arc<InMemoryStore>,
    tokens: TokenCodec,
    health: web::Data<HealthState>,
    http: web::Data<HttpState>,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::default());
    let tokens = TokenCodec::new(b"integration-secret", Duration::hours(1));
    let http = web::Data::new(HttpState::in_memory(store.clone(), tokens.clone()));
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    Fixture {
        store,
        tokens,
        health,
        http,
    }
}

async fn service(
    fixture: &Fixture,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(build_app(fixture.health.clone(), fixture.http.clone())).await
}

fn admin_token(fixture: &Fixture) -> String {
    fixture
        .tokens
        .issue(UserId::generate(), Role::Admin)
        .expect("admin token")
}

async fn send<S>(app: &S, req: test::TestRequest) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(app, req.to_request()).await
}

fn get(path: &str, token: Option<&str>) -> test::TestRequest {
    let req = test::TestRequest::get().uri(path);
    match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {token}"))),
        None => req,
    }
}

fn post(path: &str, token: Option<&str>, body: Option<Value>) -> test::TestRequest {
    let req = test::TestRequest::post().uri(path);
    let req = match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {token}"))),
        None => req,
    };
    match body {
        Some(body) => req.set_json(body),
        None => req,
    }
}

/// Register a borrower and return `(token, user_id)`.
async fn register_borrower<S>(app: &S, email: &str) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = send(
        app,
        post(
            "/api/auth/register",
            None,
            Some(json!({
                "full_name": "Maria Santos",
                "email": email,
                "password": "hunter2!",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let token = body["token"].as_str().expect("token").to_owned();
    let user_id = body["user"]["id"].as_str().expect("user id").to_owned();
    (token, user_id)
}

/// Apply for a loan as the given borrower and return the loan id.
async fn apply_for_loan<S>(app: &S, token: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = send(
        app,
        post(
            "/api/loans/apply",
            Some(token),
            Some(json!({
                "amount_requested": "50000",
                "purpose": "sari-sari store stock",
                "repayment_term_months": 12,
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "pending");
    body["id"].as_str().expect("loan id").to_owned()
}

#[actix_web::test]
async fn register_login_me_round_trip() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let (_, user_id) = register_borrower(&app, "maria@example.com").await;

    let res = send(
        &app,
        post(
            "/api/auth/login",
            None,
            Some(json!({"email": "maria@example.com", "password": "hunter2!"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let token = body["token"].as_str().expect("token");

    let res = send(&app, get("/api/auth/me", Some(token))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = test::read_body_json(res).await;
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["fullName"], "Maria Santos");
    assert_eq!(me["role"], "borrower");
    assert!(me.get("passwordHash").is_none());
}

#[actix_web::test]
async fn register_accepts_camel_case_full_name() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let res = send(
        &app,
        post(
            "/api/auth/register",
            None,
            Some(json!({
                "fullName": "Jose Reyes",
                "email": "jose@example.com",
                "password": "hunter2!",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["user"]["fullName"], "Jose Reyes");
}

#[actix_web::test]
async fn duplicate_email_registration_conflicts() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let _ = register_borrower(&app, "maria@example.com").await;
    let res = send(
        &app,
        post(
            "/api/auth/register",
            None,
            Some(json!({
                "full_name": "Other Maria",
                "email": "MARIA@example.com",
                "password": "different",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(fixture.store.user_count(), 1);
}

#[actix_web::test]
async fn invalid_registration_is_rejected() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let res = send(
        &app,
        post(
            "/api/auth/register",
            None,
            Some(json!({"full_name": "Maria", "email": "not-an-email", "password": "pw"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
}

#[actix_web::test]
async fn missing_or_garbage_tokens_are_unauthorized() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let res = send(&app, get("/api/loans/my-loans", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, get("/api/loans/my-loans", Some("not-a-jwt"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn borrower_token_cannot_reach_admin_endpoints() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let (token, _) = register_borrower(&app, "maria@example.com").await;
    for path in [
        "/api/admin/loans",
        "/api/admin/loans/pending",
        "/api/admin/dashboard-stats",
    ] {
        let res = send(&app, get(path, Some(&token))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "path {path}");
    }
}

#[actix_web::test]
async fn lifecycle_apply_approve_disburse_updates_balance() {
    let fixture = fixture();
    let app = service(&fixture).await;
    let admin = admin_token(&fixture);

    let (borrower, _) = register_borrower(&app, "maria@example.com").await;
    let loan_id = apply_for_loan(&app, &borrower).await;

    // Balance is zero until the loan is actually disbursed.
    let res = send(&app, get("/api/users/balance", Some(&borrower))).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balance"], "0");

    let res = send(&app, get("/api/admin/loans/pending", Some(&admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let pending: Value = test::read_body_json(res).await;
    assert_eq!(pending[0]["id"], loan_id.as_str());
    assert_eq!(pending[0]["fullName"], "Maria Santos");

    let res = send(
        &app,
        post(&format!("/api/admin/loans/{loan_id}/approve"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "approved");

    let res = send(
        &app,
        post(&format!("/api/admin/disburse/{loan_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["loan"]["status"], "active");
    assert_eq!(body["transaction"]["kind"], "loan_disbursement");
    assert_eq!(body["transaction"]["amount"], "50000");

    let res = send(&app, get("/api/users/balance", Some(&borrower))).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balance"], "50000");

    let res = send(&app, get("/api/transactions/my", Some(&borrower))).await;
    let entries: Value = test::read_body_json(res).await;
    assert_eq!(entries.as_array().expect("array").len(), 1);
    assert_eq!(entries[0]["loanId"], loan_id.as_str());

    let res = send(&app, get("/api/admin/dashboard-stats", Some(&admin))).await;
    let stats: Value = test::read_body_json(res).await;
    assert_eq!(stats["borrowerCount"], 1);
    assert_eq!(stats["activeLoanCount"], 1);
    assert_eq!(stats["pendingApprovalCount"], 0);
    assert_eq!(stats["totalDisbursed"], "50000");
}

#[actix_web::test]
async fn disbursing_a_pending_loan_conflicts() {
    let fixture = fixture();
    let app = service(&fixture).await;
    let admin = admin_token(&fixture);

    let (borrower, _) = register_borrower(&app, "maria@example.com").await;
    let loan_id = apply_for_loan(&app, &borrower).await;

    let res = send(
        &app,
        post(&format!("/api/admin/disburse/{loan_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "conflict");

    // Nothing was written to the ledger.
    let res = send(&app, get("/api/users/balance", Some(&borrower))).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balance"], "0");
}

#[actix_web::test]
async fn rejection_records_note_and_is_terminal() {
    let fixture = fixture();
    let app = service(&fixture).await;
    let admin = admin_token(&fixture);

    let (borrower, _) = register_borrower(&app, "maria@example.com").await;
    let loan_id = apply_for_loan(&app, &borrower).await;

    let res = send(
        &app,
        post(
            &format!("/api/admin/loans/{loan_id}/reject"),
            Some(&admin),
            Some(json!({"note": "income not verifiable"})),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["decisionNote"], "income not verifiable");

    let res = send(
        &app,
        post(&format!("/api/admin/loans/{loan_id}/approve"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unknown_loan_returns_not_found() {
    let fixture = fixture();
    let app = service(&fixture).await;
    let admin = admin_token(&fixture);

    let missing = uuid::Uuid::new_v4();
    let res = send(
        &app,
        post(&format!("/api/admin/loans/{missing}/approve"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn failed_disbursement_leaves_no_partial_state() {
    let fixture = fixture();
    let app = service(&fixture).await;
    let admin = admin_token(&fixture);

    let (borrower, _) = register_borrower(&app, "maria@example.com").await;
    let loan_id = apply_for_loan(&app, &borrower).await;
    let res = send(
        &app,
        post(&format!("/api/admin/loans/{loan_id}/approve"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    fixture.store.fail_next_disburse();
    let res = send(
        &app,
        post(&format!("/api/admin/disburse/{loan_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Loan still approved, ledger untouched; the retry succeeds.
    let res = send(&app, get("/api/users/balance", Some(&borrower))).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balance"], "0");

    let res = send(
        &app,
        post(&format!("/api/admin/disburse/{loan_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn health_reflects_readiness() {
    let fixture = fixture();
    let app = service(&fixture).await;

    let res = send(&app, get("/api/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");

    fixture.health.mark_unhealthy();
    let res = send(&app, get("/api/health", None)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}
