//! Borrower account endpoints: derived balance and recent transactions.

use actix_web::{get, web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{LedgerEntry, Principal};

use super::error::ApiResult;
use super::state::HttpState;

/// Balance payload. The value is re-derived from the ledger on every call.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Signed sum of all ledger entries, serialized as a decimal string.
    #[schema(value_type = String, example = "50000")]
    pub balance: BigDecimal,
}

/// Paging controls for the recent-transactions listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum entries to return; defaults to 10, minimum 1.
    pub limit: Option<i64>,
}

/// Return the caller's current balance.
#[utoipa::path(
    get,
    path = "/api/users/balance",
    responses(
        (status = 200, description = "Derived balance", body = BalanceResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["accounts"],
    operation_id = "balance"
)]
#[get("/api/users/balance")]
pub async fn balance(
    state: web::Data<HttpState>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    let balance = state.ledger.balance(principal.id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { balance }))
}

/// Return the caller's most recent transactions, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions/my",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent transactions", body = [LedgerEntry]),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["accounts"],
    operation_id = "myTransactions"
)]
#[get("/api/transactions/my")]
pub async fn my_transactions(
    state: web::Data<HttpState>,
    principal: Principal,
    query: web::Query<RecentQuery>,
) -> ApiResult<HttpResponse> {
    let entries = state.ledger.recent(principal.id, query.limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}
