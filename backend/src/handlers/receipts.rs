//! HTTP handlers for stock receipts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::Receipt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ledger::ReceiveStockInput;
use crate::services::LedgerService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ReceiptQuery {
    pub medicine_id: Option<Uuid>,
}

/// Receive stock into a medicine
pub async fn receive_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<ReceiveStockInput>, AppError>,
) -> AppResult<(StatusCode, Json<Receipt>)> {
    let service = LedgerService::new(state.db).with_timeouts(&state.config.database);
    let receipt = service
        .receive_stock(Some(current_user.0.user_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// List receipts, newest first
pub async fn list_receipts(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ReceiptQuery>, AppError>,
) -> AppResult<Json<Vec<Receipt>>> {
    let service = LedgerService::new(state.db);
    Ok(Json(service.list_receipts(query.medicine_id).await?))
}

/// Get a receipt by ID
pub async fn get_receipt(
    State(state): State<AppState>,
    WithRejection(Path(receipt_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Receipt>> {
    let service = LedgerService::new(state.db);
    Ok(Json(service.get_receipt(receipt_id).await?))
}
