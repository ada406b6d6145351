//! HTTP handlers for the medicine catalogue and stock alerts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use shared::{Medicine, MedicineView};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::today;
use crate::services::medicine::{
    CreateMedicineInput, MedicineQuery, MedicineService, UpdateMedicineInput,
};
use crate::AppState;

#[derive(Serialize)]
pub struct ClearCatalogueResponse {
    pub deleted: u64,
}

fn views(state: &AppState, medicines: Vec<Medicine>) -> Vec<MedicineView> {
    let today = today();
    let window = state.config.inventory.expiring_soon_days;
    medicines
        .into_iter()
        .map(|m| MedicineView::new(m, today, window))
        .collect()
}

fn view(state: &AppState, medicine: Medicine) -> MedicineView {
    MedicineView::new(medicine, today(), state.config.inventory.expiring_soon_days)
}

/// List medicines ordered by code
pub async fn list_medicines(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<MedicineQuery>, AppError>,
) -> AppResult<Json<Vec<MedicineView>>> {
    let service = MedicineService::new(state.db.clone());
    let medicines = service.list_medicines(&query).await?;
    Ok(Json(views(&state, medicines)))
}

/// Get a medicine by ID
pub async fn get_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<MedicineView>> {
    let service = MedicineService::new(state.db.clone());
    let medicine = service.get_medicine(medicine_id).await?;
    Ok(Json(view(&state, medicine)))
}

/// Add a medicine to the catalogue
pub async fn create_medicine(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateMedicineInput>, AppError>,
) -> AppResult<(StatusCode, Json<MedicineView>)> {
    let service = MedicineService::new(state.db.clone());
    let medicine = service.create_medicine(input).await?;
    Ok((StatusCode::CREATED, Json(view(&state, medicine))))
}

/// Update a medicine
pub async fn update_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateMedicineInput>, AppError>,
) -> AppResult<Json<MedicineView>> {
    let service = MedicineService::new(state.db.clone());
    let medicine = service.update_medicine(medicine_id, input).await?;
    Ok(Json(view(&state, medicine)))
}

/// Delete a medicine with no sales or receipts
pub async fn delete_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    let service = MedicineService::new(state.db);
    service.delete_medicine(medicine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every unreferenced medicine
pub async fn clear_catalogue(
    State(state): State<AppState>,
) -> AppResult<Json<ClearCatalogueResponse>> {
    let service = MedicineService::new(state.db);
    let deleted = service.clear_catalogue().await?;
    Ok(Json(ClearCatalogueResponse { deleted }))
}

/// Medicines at or below their displayed quantity
pub async fn low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<MedicineView>>> {
    let service = MedicineService::new(state.db.clone());
    Ok(Json(views(&state, service.low_stock().await?)))
}

/// Medicines past their expiry date
pub async fn expired(State(state): State<AppState>) -> AppResult<Json<Vec<MedicineView>>> {
    let service = MedicineService::new(state.db.clone());
    Ok(Json(views(&state, service.expired(today()).await?)))
}

/// Medicines expiring within the configured window
pub async fn expiring_soon(State(state): State<AppState>) -> AppResult<Json<Vec<MedicineView>>> {
    let days = state.config.inventory.expiring_soon_days;
    let service = MedicineService::new(state.db.clone());
    Ok(Json(views(&state, service.expiring_soon(today(), days).await?)))
}
