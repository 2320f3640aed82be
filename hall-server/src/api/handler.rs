//! API handlers
//!
//! Request/response DTOs and one handler per operation. Role checks
//! happen here; everything else is delegated.

use super::Caller;
use crate::auth::PermissionGate;
use crate::core::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::models::{
    AuthEntry, AuthRole, Good, InventoryRecord, OrderLine, PaidInput, PaymentSession, Stock,
    Ticket, TicketStatus,
};
use shared::{ApiResponse, AppError, AppResult};

// ========== DTOs ==========

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub order: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    pub ticket_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBarcodeRequest {
    pub barcode: String,
    #[serde(default)]
    pub candidate_ticket_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveBarcodeResponse {
    pub ticket_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub target_uid: String,
    pub role: String,
    pub shop_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    #[serde(default)]
    pub include_delivered: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionSequenceRequest {
    pub start_num: u64,
    pub leading: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBarcodesRequest {
    pub prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetInventoryRequest {
    pub stock: Stock,
}

// ========== Handlers ==========

pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

/// POST /api/orders (any authenticated caller, ordering for themselves)
pub async fn submit_order(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<SubmitOrderRequest>,
) -> AppResult<ApiResponse<SubmitOrderResponse>> {
    let session_id = state.sessions.create(&caller.entry.uid, req.order).await?;
    Ok(ApiResponse::success(SubmitOrderResponse { session_id }))
}

/// GET /api/sessions/{session_id} (till staff, admin, or the owner)
pub async fn get_session(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> AppResult<ApiResponse<PaymentSession>> {
    let session = state.sessions.get(&session_id).await?;
    if !PermissionGate::authorize(&caller.entry, &[AuthRole::Admin, AuthRole::Cashier])
        && session.customer_id != caller.entry.uid
    {
        return Err(AppError::permission_denied("Not your session"));
    }
    Ok(ApiResponse::success(session))
}

/// POST /api/sessions/{session_id}/paid (till staff only)
pub async fn mark_paid(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
    Json(paid): Json<PaidInput>,
) -> AppResult<ApiResponse<MarkPaidResponse>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin, AuthRole::Cashier])?;
    let ticket_ids = state
        .sessions
        .settle(&session_id, &caller.entry.uid, paid)
        .await?;
    Ok(ApiResponse::success(MarkPaidResponse { ticket_ids }))
}

/// POST /api/barcode/resolve (till staff only)
pub async fn resolve_barcode(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<ResolveBarcodeRequest>,
) -> AppResult<ApiResponse<ResolveBarcodeResponse>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin, AuthRole::Cashier])?;
    let ticket_id = state
        .barcode
        .resolve_ticket(&req.barcode, &req.candidate_ticket_ids)?;
    Ok(ApiResponse::success(ResolveBarcodeResponse { ticket_id }))
}

/// POST /api/auth/grant (admin only)
pub async fn grant_role(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<GrantRoleRequest>,
) -> AppResult<ApiResponse<AuthEntry>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin])?;
    let entry = state.gate.grant(&req.target_uid, &req.role, req.shop_id)?;
    Ok(ApiResponse::success(entry))
}

/// GET /api/tickets/mine (the caller's own tickets)
pub async fn my_tickets(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<ApiResponse<Vec<Ticket>>> {
    let tickets = state.tickets.list_customer_tickets(&caller.entry.uid)?;
    Ok(ApiResponse::success(tickets))
}

/// POST /api/tickets/{ticket_id}/status (the owning shop, or admin)
pub async fn update_ticket_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateTicketStatusRequest>,
) -> AppResult<ApiResponse<Ticket>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin, AuthRole::Shop])?;
    if caller.entry.auth_type == AuthRole::Shop {
        let ticket = state.tickets.get(&ticket_id)?;
        if caller.entry.shop_id.as_deref() != Some(ticket.shop_id.as_str()) {
            return Err(AppError::permission_denied("Ticket belongs to another shop"));
        }
    }
    let ticket = state.tickets.update_status(&ticket_id, req.status).await?;
    Ok(ApiResponse::success(ticket))
}

/// GET /api/shops/{shop_id}/tickets (the shop itself, till staff, admin)
pub async fn list_shop_tickets(
    State(state): State<AppState>,
    caller: Caller,
    Path(shop_id): Path<String>,
    Query(query): Query<ListTicketsQuery>,
) -> AppResult<ApiResponse<Vec<Ticket>>> {
    PermissionGate::require(
        &caller.entry,
        &[AuthRole::Admin, AuthRole::Cashier, AuthRole::Shop],
    )?;
    if caller.entry.auth_type == AuthRole::Shop
        && caller.entry.shop_id.as_deref() != Some(shop_id.as_str())
    {
        return Err(AppError::permission_denied("Not your shop"));
    }
    let tickets = state
        .tickets
        .list_shop_tickets(&shop_id, query.include_delivered)?;
    Ok(ApiResponse::success(tickets))
}

/// POST /api/shops/{shop_id}/sequence (admin only)
pub async fn provision_sequence(
    State(state): State<AppState>,
    caller: Caller,
    Path(shop_id): Path<String>,
    Json(req): Json<ProvisionSequenceRequest>,
) -> AppResult<ApiResponse<()>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin])?;
    state
        .tickets
        .provision_shop(&shop_id, req.start_num, req.leading)?;
    Ok(ApiResponse::ok())
}

/// POST /api/shops/{shop_id}/barcodes (admin only)
pub async fn register_barcodes(
    State(state): State<AppState>,
    caller: Caller,
    Path(shop_id): Path<String>,
    Json(req): Json<RegisterBarcodesRequest>,
) -> AppResult<ApiResponse<()>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin])?;
    state.barcode.register(&shop_id, req.prefixes)?;
    Ok(ApiResponse::ok())
}

/// POST /api/goods (admin only)
pub async fn upsert_goods(
    State(state): State<AppState>,
    caller: Caller,
    Json(good): Json<Good>,
) -> AppResult<ApiResponse<()>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin])?;
    if good.price < 0 {
        return Err(AppError::validation("price must not be negative"));
    }
    state.store.put_goods(&good)?;
    Ok(ApiResponse::ok())
}

/// PUT /api/goods/{goods_id}/inventory (admin only)
///
/// Replaces the stock shape; an existing waiting count is preserved.
pub async fn set_inventory(
    State(state): State<AppState>,
    caller: Caller,
    Path(goods_id): Path<String>,
    Json(req): Json<SetInventoryRequest>,
) -> AppResult<ApiResponse<()>> {
    PermissionGate::require(&caller.entry, &[AuthRole::Admin])?;
    let waiting_count = state
        .store
        .get_inventory(&goods_id)?
        .map(|r| r.waiting_count)
        .unwrap_or(0);
    state.store.put_inventory(&InventoryRecord {
        goods_id,
        stock: req.stock,
        waiting_count,
    })?;
    Ok(ApiResponse::ok())
}
