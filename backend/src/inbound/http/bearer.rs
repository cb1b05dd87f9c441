//! Bearer-token extraction: turns an `Authorization` header into a
//! [`Principal`] before any handler body runs.
//!
//! The extractor fails the request at the gate — handlers that take a
//! `Principal` parameter never execute for unauthenticated callers.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};

use crate::domain::{DomainError, Principal};

use super::error::ApiError;
use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

fn extract_principal(req: &HttpRequest) -> Result<Principal, ApiError> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| ApiError::from(DomainError::internal("HTTP state not configured")))?;

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| DomainError::unauthorized("missing bearer token"))?;
    let raw = header_value
        .to_str()
        .map_err(|_| DomainError::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| DomainError::unauthorized("authorization header must use Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(DomainError::unauthorized("missing bearer token").into());
    }

    Ok(state.tokens.verify(token)?)
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_principal(req))
    }
}
