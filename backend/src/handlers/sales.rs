//! HTTP handlers for recording, editing and reversing sales

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::Sale;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ledger::{EditSaleInput, RecordSaleInput, SaleFilter};
use crate::services::LedgerService;
use crate::AppState;

fn ledger(state: &AppState) -> LedgerService {
    LedgerService::new(state.db.clone()).with_timeouts(&state.config.database)
}

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<RecordSaleInput>, AppError>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    let sale = ledger(&state)
        .record_sale(Some(current_user.0.user_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// List sales, newest first
pub async fn list_sales(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<SaleFilter>, AppError>,
) -> AppResult<Json<Vec<Sale>>> {
    let sales = ledger(&state).list_sales(&filter).await?;
    Ok(Json(sales))
}

/// Get a sale by ID
pub async fn get_sale(
    State(state): State<AppState>,
    WithRejection(Path(sale_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Sale>> {
    let sale = ledger(&state).get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Change a sale's quantity or payment method
pub async fn edit_sale(
    State(state): State<AppState>,
    WithRejection(Path(sale_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<EditSaleInput>, AppError>,
) -> AppResult<Json<Sale>> {
    let sale = ledger(&state).edit_sale(sale_id, input).await?;
    Ok(Json(sale))
}

/// Reverse a sale, returning its units to stock
pub async fn reverse_sale(
    State(state): State<AppState>,
    WithRejection(Path(sale_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    ledger(&state).reverse_sale(sale_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
