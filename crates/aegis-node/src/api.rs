//! HTTP API server for the Aegis claim node.
//!
//! The reference JSON-over-HTTP surface for the inbound operations:
//! claims, verification, booking settlement, and policy/settlement reads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use aegis_core::refund::RefundPolicyEngine;
use aegis_core::types::{Amount, BookingId, Currency, Policy, PolicyId, TripId, TripType};
use aegis_settlement::types::Settlement;

use crate::bookings::Booking;
use crate::error::ClaimError;
use crate::service::{ClaimOutcome, ClaimService};

// --- Request / response types ---

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub name: String,
    pub settlements: usize,
    pub bookings: usize,
}

#[derive(Deserialize)]
pub struct CreatePolicyRequest {
    pub owner: String,
    pub trip_id: String,
    pub trip_type: String,
    pub travel_date: NaiveDate,
    pub threshold_minutes: u32,
    pub payout_amount: u128,
    pub currency: String,
    /// Days from now until the policy can be expired.
    pub deadline_days: i64,
}

#[derive(Deserialize)]
pub struct InitiateClaimRequest {
    pub policy_id: Uuid,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub trip_id: String,
    pub trip_type: String,
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub trip_status: aegis_core::types::TripStatus,
    pub verification: aegis_verify::types::VerificationResult,
}

#[derive(Deserialize)]
pub struct RegisterBookingRequest {
    pub booking_id: String,
    pub trip_id: String,
    pub trip_type: String,
    pub travel_date: NaiveDate,
    pub total_amount: u128,
    pub currency: String,
}

#[derive(Deserialize)]
pub struct SettleRequest {
    pub booking_id: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API-facing error wrapper mapping the taxonomy to status codes.
pub struct ApiError(ClaimError);

impl From<ClaimError> for ApiError {
    fn from(e: ClaimError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClaimError::Validation(_) => StatusCode::BAD_REQUEST,
            ClaimError::NotFound(_) => StatusCode::NOT_FOUND,
            ClaimError::Conflict(_) => StatusCode::CONFLICT,
            ClaimError::VerificationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClaimError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn parse_trip_type(raw: &str) -> Result<TripType, ApiError> {
    TripType::from_label(raw)
        .ok_or_else(|| ClaimError::Validation(format!("unknown trip type: {raw}")).into())
}

fn parse_currency(raw: &str) -> Result<Currency, ApiError> {
    Currency::from_code(raw)
        .ok_or_else(|| ClaimError::Validation(format!("unknown currency: {raw}")).into())
}

fn parse_trip_id(raw: &str) -> Result<TripId, ApiError> {
    TripId::new(raw).map_err(|e| ClaimError::Validation(e.to_string()).into())
}

// --- Handlers ---

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: state.name.clone(),
        settlements: state.service.settlement_count(),
        bookings: state.service.booking_count(),
    })
}

async fn handle_refund_table() -> Json<Vec<aegis_core::refund::TierRule>> {
    Json(RefundPolicyEngine::policy_breakdown())
}

async fn handle_create_policy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePolicyRequest>,
) -> Result<Json<Policy>, ApiError> {
    let trip_id = parse_trip_id(&req.trip_id)?;
    let trip_type = parse_trip_type(&req.trip_type)?;
    let currency = parse_currency(&req.currency)?;

    let policy = state.service.seed_policy(
        req.owner,
        trip_id,
        trip_type,
        req.travel_date,
        req.threshold_minutes,
        Amount::new(req.payout_amount, currency),
        Utc::now() + chrono::Duration::days(req.deadline_days),
    )?;
    Ok(Json(policy))
}

async fn handle_get_policy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Policy>, ApiError> {
    let policy = state.service.get_policy(PolicyId::from_uuid(id)).await?;
    Ok(Json(policy))
}

async fn handle_initiate_claim(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiateClaimRequest>,
) -> Result<Json<ClaimOutcome>, ApiError> {
    let outcome = state
        .service
        .initiate_claim(PolicyId::from_uuid(req.policy_id))
        .await?;
    Ok(Json(outcome))
}

async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let trip_id = parse_trip_id(&req.trip_id)?;
    let trip_type = parse_trip_type(&req.trip_type)?;
    let (trip_status, verification) =
        state.service.verify_trip(trip_id, trip_type, req.date).await?;
    Ok(Json(VerifyResponse {
        trip_status,
        verification,
    }))
}

async fn handle_register_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = Booking {
        booking_id: BookingId::new(req.booking_id)
            .map_err(|e| ClaimError::Validation(e.to_string()))?,
        trip_id: parse_trip_id(&req.trip_id)?,
        trip_type: parse_trip_type(&req.trip_type)?,
        travel_date: req.travel_date,
        total_amount: Amount::new(req.total_amount, parse_currency(&req.currency)?),
    };
    state.service.register_booking(booking.clone());
    Ok(Json(booking))
}

async fn handle_settle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let booking_id =
        BookingId::new(req.booking_id).map_err(|e| ClaimError::Validation(e.to_string()))?;
    let settlement = state.service.settle_booking(booking_id).await?;
    Ok(Json(settlement))
}

async fn handle_get_settlement(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Settlement>, ApiError> {
    let booking_id =
        BookingId::new(booking_id).map_err(|e| ClaimError::Validation(e.to_string()))?;
    let settlement = state.service.get_settlement(&booking_id).await?;
    Ok(Json(settlement))
}

// --- Server ---

/// Shared state accessible from HTTP handlers.
pub struct AppState {
    pub name: String,
    pub service: ClaimService,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/refund-table", get(handle_refund_table))
        .route("/policies", post(handle_create_policy))
        .route("/policies/{id}", get(handle_get_policy))
        .route("/claims", post(handle_initiate_claim))
        .route("/verify", post(handle_verify))
        .route("/bookings", post(handle_register_booking))
        .route("/settlements", post(handle_settle))
        .route("/settlements/{booking_id}", get(handle_get_settlement))
        .with_state(state)
}

/// Serve the API until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
