//! Admin endpoints: loan review, disbursement, and the dashboard.
//!
//! Every handler checks `Principal::require_role(Role::Admin)` before doing
//! any work, so a borrower token yields 403 without touching the store.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LedgerEntry, Loan, LoanId, Principal, Role};
use crate::domain::ports::{DashboardStats, PendingLoan};

use super::error::ApiResult;
use super::state::HttpState;

/// Optional reviewer note attached to a rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectRequest {
    /// Free-text reason shown to the borrower.
    #[serde(default, alias = "decisionNote", alias = "decision_note")]
    pub note: Option<String>,
}

/// Disbursement result: the activated loan plus its ledger entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisburseResponse {
    /// Loan now in `active`.
    pub loan: Loan,
    /// The paired disbursement transaction.
    pub transaction: LedgerEntry,
}

/// List every loan in the system, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/loans",
    responses(
        (status = 200, description = "All loans", body = [Loan]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    tags = ["admin"],
    operation_id = "listAllLoans"
)]
#[get("/api/admin/loans")]
pub async fn list_loans(
    state: web::Data<HttpState>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let loans = state.loans.list_all().await?;
    Ok(HttpResponse::Ok().json(loans))
}

/// List loans awaiting a decision, with borrower names.
#[utoipa::path(
    get,
    path = "/api/admin/loans/pending",
    responses(
        (status = 200, description = "Pending loans", body = [PendingLoan]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    tags = ["admin"],
    operation_id = "listPendingLoans"
)]
#[get("/api/admin/loans/pending")]
pub async fn list_pending(
    state: web::Data<HttpState>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let loans = state.loans.list_pending().await?;
    Ok(HttpResponse::Ok().json(loans))
}

/// Approve a pending loan.
#[utoipa::path(
    post,
    path = "/api/admin/loans/{id}/approve",
    params(("id" = LoanId, Path, description = "Loan identifier")),
    responses(
        (status = 200, description = "Loan approved", body = Loan),
        (status = 404, description = "No such loan"),
        (status = 409, description = "Loan is not pending")
    ),
    tags = ["admin"],
    operation_id = "approveLoan"
)]
#[post("/api/admin/loans/{id}/approve")]
pub async fn approve(
    state: web::Data<HttpState>,
    principal: Principal,
    id: web::Path<LoanId>,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let loan = state.loans.approve(*id).await?;
    Ok(HttpResponse::Ok().json(loan))
}

/// Reject a pending loan, optionally recording a reviewer note.
#[utoipa::path(
    post,
    path = "/api/admin/loans/{id}/reject",
    params(("id" = LoanId, Path, description = "Loan identifier")),
    request_body(content = RejectRequest, description = "Optional note"),
    responses(
        (status = 200, description = "Loan rejected", body = Loan),
        (status = 404, description = "No such loan"),
        (status = 409, description = "Loan is not pending")
    ),
    tags = ["admin"],
    operation_id = "rejectLoan"
)]
#[post("/api/admin/loans/{id}/reject")]
pub async fn reject(
    state: web::Data<HttpState>,
    principal: Principal,
    id: web::Path<LoanId>,
    body: Option<web::Json<RejectRequest>>,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let note = body.and_then(|b| b.into_inner().note);
    let loan = state.loans.reject(*id, note.as_deref()).await?;
    Ok(HttpResponse::Ok().json(loan))
}

/// Disburse an approved loan: one atomic unit pairing the ledger credit
/// with the move to `active`.
#[utoipa::path(
    post,
    path = "/api/admin/disburse/{id}",
    params(("id" = LoanId, Path, description = "Loan identifier")),
    responses(
        (status = 200, description = "Loan disbursed", body = DisburseResponse),
        (status = 404, description = "No such loan"),
        (status = 409, description = "Loan is not approved"),
        (status = 503, description = "Store unavailable; nothing committed")
    ),
    tags = ["admin"],
    operation_id = "disburseLoan"
)]
#[post("/api/admin/disburse/{id}")]
pub async fn disburse(
    state: web::Data<HttpState>,
    principal: Principal,
    id: web::Path<LoanId>,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let (loan, transaction) = state.loans.disburse(*id).await?;
    Ok(HttpResponse::Ok().json(DisburseResponse { loan, transaction }))
}

/// Aggregate counters for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/dashboard-stats",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    tags = ["admin"],
    operation_id = "dashboardStats"
)]
#[get("/api/admin/dashboard-stats")]
pub async fn dashboard_stats(
    state: web::Data<HttpState>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    principal.require_role(Role::Admin)?;
    let stats = state.ledger.dashboard_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
