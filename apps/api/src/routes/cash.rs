//! # Cash Routes
//!
//! Handlers for the register lifecycle, the ledger and the voucher feed.
//! Every handler acts for the business in [`OperatorContext`]; a register of
//! another business is indistinguishable from a missing one.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use octo_core::validation::validate_uuid;
use octo_core::{
    CashRegister, CashSummary, CloseRequest, ClosureReport, ManualMovementRequest, Money,
    Movement, OpenRequest, RegisterListing, RegisterView, VoucherEvent, DEFAULT_HISTORY_LIMIT,
};

use crate::context::OperatorContext;
use crate::error::ApiResult;
use crate::AppState;

/// Query parameters for `GET /cash/history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

fn register_id(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(id) = path?;
    validate_uuid(&id)?;
    Ok(id)
}

// ---------------------------------------------------------------------------
// GET /cash/current
// ---------------------------------------------------------------------------

/// The open register with its movements, or `null`.
pub(crate) async fn current(
    State(state): State<AppState>,
    ctx: OperatorContext,
) -> ApiResult<Json<Option<RegisterView>>> {
    let current = state.db.registers().current(&ctx.business_id).await?;
    Ok(Json(current))
}

// ---------------------------------------------------------------------------
// POST /cash/open
// ---------------------------------------------------------------------------

pub(crate) async fn open(
    State(state): State<AppState>,
    ctx: OperatorContext,
    payload: Result<Json<OpenRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterView>)> {
    let Json(request) = payload?;

    let register = state
        .db
        .registers()
        .open(
            &ctx.business_id,
            Money::from_cents(request.opening_amount_cents),
            &ctx.operator_id,
        )
        .await?;

    info!(
        business_id = %ctx.business_id,
        register_id = %register.id,
        operator = %ctx.operator_id,
        "cash/open"
    );
    let view = RegisterView::new(register, Utc::now(), state.db.policy());
    Ok((StatusCode::CREATED, Json(view)))
}

// ---------------------------------------------------------------------------
// POST /cash/{id}/close
// ---------------------------------------------------------------------------

/// Reconciles and closes the register. Returns the closed register.
pub(crate) async fn close(
    State(state): State<AppState>,
    ctx: OperatorContext,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<CloseRequest>, JsonRejection>,
) -> ApiResult<Json<CashRegister>> {
    let id = register_id(path)?;
    let Json(request) = payload?;

    let closed = state
        .db
        .registers()
        .close(&ctx.business_id, &id, &request, &ctx.operator_id)
        .await?;

    info!(
        business_id = %ctx.business_id,
        register_id = %id,
        difference_cents = ?closed.difference_cents,
        "cash/close"
    );
    Ok(Json(closed))
}

// ---------------------------------------------------------------------------
// GET /cash/history
// ---------------------------------------------------------------------------

pub(crate) async fn history(
    State(state): State<AppState>,
    ctx: OperatorContext,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<RegisterListing>>> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let history = state
        .db
        .registers()
        .list_history(&ctx.business_id, limit)
        .await?;
    Ok(Json(history))
}

// ---------------------------------------------------------------------------
// GET/POST /cash/{id}/movements
// ---------------------------------------------------------------------------

pub(crate) async fn list_movements(
    State(state): State<AppState>,
    ctx: OperatorContext,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Movement>>> {
    let id = register_id(path)?;
    let movements = state.db.movements().list(&ctx.business_id, &id).await?;
    Ok(Json(movements))
}

/// Records a manual INCOME or EXPENSE.
pub(crate) async fn add_movement(
    State(state): State<AppState>,
    ctx: OperatorContext,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ManualMovementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    let id = register_id(path)?;
    let Json(request) = payload?;
    debug!(register_id = %id, amount_cents = request.amount_cents, "cash/movements");

    let movement = state
        .db
        .movements()
        .append(&ctx.business_id, &id, request.into_draft(), &ctx.operator_id)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

// ---------------------------------------------------------------------------
// GET /cash/{id}/summary, GET /cash/{id}/report
// ---------------------------------------------------------------------------

pub(crate) async fn summary(
    State(state): State<AppState>,
    ctx: OperatorContext,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<CashSummary>> {
    let id = register_id(path)?;
    let summary = state.db.registers().summary(&ctx.business_id, &id).await?;
    Ok(Json(summary))
}

/// Data for the closure document.
pub(crate) async fn report(
    State(state): State<AppState>,
    ctx: OperatorContext,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ClosureReport>> {
    let id = register_id(path)?;
    let report = state.db.registers().report(&ctx.business_id, &id).await?;
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// POST /cash/voucher-events
// ---------------------------------------------------------------------------

/// SALE / PAYMENT_RECEIVED posted by the voucher subsystem.
pub(crate) async fn voucher_event(
    State(state): State<AppState>,
    ctx: OperatorContext,
    payload: Result<Json<VoucherEvent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    let Json(event) = payload?;

    let movement = state
        .db
        .movements()
        .record_voucher_event(&ctx.business_id, &event, &ctx.operator_id)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}
