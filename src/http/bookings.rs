//! `GET /api/get-bookings` handler.

use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};

use crate::bookings::LookupOutcome;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::{GateError, LookupParams};

/// Route of the lookup endpoint.
pub const BOOKINGS_PATH: &str = "/api/get-bookings";

/// Signature gate, then booking resolver.
pub async fn get_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<LookupOutcome>, ApiError> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let result = lookup(&state, query).await;

    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status().as_u16(),
    };
    metrics::record_request(status, start);

    if let Err(ApiError::Gate(e)) = &result {
        tracing::warn!(request_id = %request_id, status, reason = %e, "Lookup rejected");
    }

    result.map(Json)
}

async fn lookup(
    state: &AppState,
    query: Result<Query<LookupParams>, QueryRejection>,
) -> Result<LookupOutcome, ApiError> {
    let Query(params) = query.map_err(|e| {
        tracing::debug!(error = %e, "Unparseable query string");
        GateError::InvalidFormat
    })?;

    let user_id = state.gate.verify(&params)?;
    Ok(state.resolver.resolve(&user_id).await?)
}
