//! Reporting service for the dashboard, sales reports and CSV export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::DateRange;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_medicines: i64,
    pub low_stock_count: i64,
    pub expired_count: i64,
    pub total_sales: Decimal,
}

/// One sale in a sales report, flattened for CSV export
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesReportLine {
    pub sale_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub medicine_code: String,
    pub item_description: String,
    pub quantity: i32,
    pub total_price: Decimal,
    pub payment_method: String,
}

/// Sales over an inclusive date range
#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_quantity: i64,
    pub total_amount: Decimal,
    pub sales: Vec<SalesReportLine>,
}

impl SalesReport {
    fn new(range: DateRange, sales: Vec<SalesReportLine>) -> Self {
        let total_quantity = sales.iter().map(|s| i64::from(s.quantity)).sum();
        let total_amount = sales.iter().map(|s| s.total_price).sum();
        Self {
            start_date: range.start,
            end_date: range.end,
            total_quantity,
            total_amount,
            sales,
        }
    }
}

/// Report filter parameters
#[derive(Debug, Default)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    /// Resolve the requested range, defaulting to the month containing `today`
    pub fn range(&self, today: NaiveDate) -> AppResult<DateRange> {
        DateRange::resolve(self.start_date, self.end_date, today)
            .map_err(|m| AppError::validation("start_date", m))
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get dashboard metrics
    pub async fn get_dashboard_metrics(&self, today: NaiveDate) -> AppResult<DashboardMetrics> {
        let (total_medicines, low_stock_count, expired_count): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE quantity <= displayed_quantity) as low_stock,
                COUNT(*) FILTER (WHERE expiry_date < $1) as expired
            FROM medicines
            "#,
        )
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        let total_sales: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_price), 0) FROM sales")
                .fetch_one(&self.db)
                .await?;

        Ok(DashboardMetrics {
            total_medicines,
            low_stock_count,
            expired_count,
            total_sales,
        })
    }

    /// Get the sales report for a date range, newest sale first
    pub async fn get_sales_report(&self, range: DateRange) -> AppResult<SalesReport> {
        let sales = sqlx::query_as::<_, SalesReportLine>(
            r#"
            SELECT
                s.id as sale_id,
                s.created_at,
                m.code as medicine_code,
                m.item_description,
                s.quantity,
                s.total_price,
                s.payment_method
            FROM sales s
            JOIN medicines m ON m.id = s.medicine_id
            WHERE s.created_at::date >= $1 AND s.created_at::date <= $2
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(SalesReport::new(range, sales))
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
