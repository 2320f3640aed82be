//! HTTP API boundary
//!
//! Thin glue only: each handler authenticates the caller, checks the
//! required roles, and forwards to a service. No business logic lives
//! here.

pub mod handler;

use crate::core::AppState;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use shared::models::AuthEntry;
use shared::AppError;
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route("/api/orders", post(handler::submit_order))
        .route("/api/sessions/{session_id}", get(handler::get_session))
        .route("/api/sessions/{session_id}/paid", post(handler::mark_paid))
        .route("/api/barcode/resolve", post(handler::resolve_barcode))
        .route("/api/auth/grant", post(handler::grant_role))
        .route("/api/tickets/mine", get(handler::my_tickets))
        .route("/api/tickets/{ticket_id}/status", post(handler::update_ticket_status))
        .route("/api/shops/{shop_id}/tickets", get(handler::list_shop_tickets))
        .route("/api/shops/{shop_id}/sequence", post(handler::provision_sequence))
        .route("/api/shops/{shop_id}/barcodes", post(handler::register_barcodes))
        .route("/api/goods", post(handler::upsert_goods))
        .route("/api/goods/{goods_id}/inventory", put(handler::set_inventory))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Authenticated caller, extracted from the bearer token
///
/// Verification is delegated to the configured [`IdentityVerifier`];
/// the resulting uid is mapped to its stored role entry.
///
/// [`IdentityVerifier`]: crate::auth::IdentityVerifier
pub struct Caller {
    pub entry: AuthEntry,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AppError::not_authenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::invalid_token("Expected a Bearer credential"))?;

        let uid = state.verifier.verify(token).await?;
        let entry = state.gate.entry(&uid)?;
        Ok(Caller { entry })
    }
}
