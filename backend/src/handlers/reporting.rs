//! Reporting handlers for the dashboard and sales report export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::today;
use crate::services::reporting::{DashboardMetrics, ReportFilter, ReportingService};
use crate::AppState;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get dashboard metrics
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db);
    let metrics = service.get_dashboard_metrics(today()).await?;
    Ok(Json(metrics))
}

/// Get the sales report
pub async fn get_sales_report(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ReportQuery>, AppError>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);

    let filter = ReportFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let range = filter.range(today())?;

    let report = service.get_sales_report(range).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&report.sales)?;
        let disposition = format!(
            "attachment; filename=\"sales_{}_{}.csv\"",
            report.start_date, report.end_date
        );
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(report).into_response())
    }
}
