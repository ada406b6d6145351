//! Medicine catalogue service
//!
//! Stock levels are owned by the ledger: nothing here changes `quantity`
//! on an existing medicine.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    next_medicine_code, validate_medicine_code, validate_price, Medicine, MEDICINE_CODE_PREFIX,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Medicine catalogue service
#[derive(Clone)]
pub struct MedicineService {
    db: PgPool,
}

/// Input for adding a medicine to the catalogue
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicineInput {
    /// Generated as the next `HM-NNN` code when absent
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Item description is required"))]
    pub item_description: String,
    /// Opening stock
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "Displayed quantity cannot be negative"))]
    pub displayed_quantity: i32,
    pub unit_price: Decimal,
    pub selling_price: Decimal,
    pub expiry_date: NaiveDate,
}

/// Input for updating a medicine. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMedicineInput {
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Item description is required"))]
    pub item_description: Option<String>,
    #[validate(range(min = 0, message = "Displayed quantity cannot be negative"))]
    pub displayed_quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
}

/// Catalogue listing query
#[derive(Debug, Default, Deserialize)]
pub struct MedicineQuery {
    /// Case-insensitive match on code or description
    pub search: Option<String>,
}

#[derive(Debug, FromRow)]
struct MedicineRow {
    id: Uuid,
    code: String,
    item_description: String,
    quantity: i32,
    displayed_quantity: i32,
    unit_price: Decimal,
    selling_price: Decimal,
    expiry_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MedicineRow> for Medicine {
    fn from(row: MedicineRow) -> Self {
        Medicine {
            id: row.id,
            code: row.code,
            item_description: row.item_description,
            quantity: row.quantity,
            displayed_quantity: row.displayed_quantity,
            unit_price: row.unit_price,
            selling_price: row.selling_price,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEDICINE_COLUMNS: &str = "id, code, item_description, quantity, displayed_quantity, unit_price, selling_price, expiry_date, created_at, updated_at";

fn check_prices(unit_price: Option<Decimal>, selling_price: Option<Decimal>) -> AppResult<()> {
    if let Some(price) = unit_price {
        validate_price(price).map_err(|m| AppError::validation("unit_price", m))?;
    }
    if let Some(price) = selling_price {
        validate_price(price).map_err(|m| AppError::validation("selling_price", m))?;
    }
    Ok(())
}

impl MedicineService {
    /// Create a new MedicineService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a medicine to the catalogue
    pub async fn create_medicine(&self, input: CreateMedicineInput) -> AppResult<Medicine> {
        input.validate()?;
        check_prices(Some(input.unit_price), Some(input.selling_price))?;

        let code = match input.code.filter(|c| !c.trim().is_empty()) {
            Some(code) => {
                let code = code.trim().to_uppercase();
                validate_medicine_code(&code).map_err(|m| AppError::validation("code", m))?;
                self.ensure_code_free(&code, None).await?;
                code
            }
            None => self.next_code().await?,
        };

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            INSERT INTO medicines (code, item_description, quantity, displayed_quantity, unit_price, selling_price, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MEDICINE_COLUMNS
        ))
        .bind(&code)
        .bind(&input.item_description)
        .bind(input.quantity)
        .bind(input.displayed_quantity)
        .bind(input.unit_price)
        .bind(input.selling_price)
        .bind(input.expiry_date)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(medicine_id = %row.id, code = %row.code, quantity = row.quantity, "Medicine created");

        Ok(row.into())
    }

    /// Next free code in the `HM-NNN` sequence
    pub async fn next_code(&self) -> AppResult<String> {
        let last = sqlx::query_scalar::<_, String>(
            r#"
            SELECT code FROM medicines
            WHERE code ~ ('^' || $1 || '-[0-9]+$')
            ORDER BY CAST(substring(code from '[0-9]+$') AS numeric) DESC, code DESC
            LIMIT 1
            "#,
        )
        .bind(MEDICINE_CODE_PREFIX)
        .fetch_optional(&self.db)
        .await?;

        Ok(next_medicine_code(last.as_deref()))
    }

    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> AppResult<()> {
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM medicines WHERE code = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(code)
        .bind(except)
        .fetch_one(&self.db)
        .await?;

        if taken > 0 {
            return Err(AppError::Conflict {
                resource: "code".to_string(),
                message: format!("Medicine code {} already exists", code),
            });
        }
        Ok(())
    }

    /// Get a medicine by ID
    pub async fn get_medicine(&self, medicine_id: Uuid) -> AppResult<Medicine> {
        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {} FROM medicines WHERE id = $1",
            MEDICINE_COLUMNS
        ))
        .bind(medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        Ok(row.into())
    }

    /// List medicines ordered by code
    pub async fn list_medicines(&self, query: &MedicineQuery) -> AppResult<Vec<Medicine>> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            SELECT {}
            FROM medicines
            WHERE ($1::text IS NULL OR code ILIKE $1 OR item_description ILIKE $1)
            ORDER BY code
            "#,
            MEDICINE_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Medicine::from).collect())
    }

    /// Update a medicine's descriptive fields, prices, threshold or expiry
    pub async fn update_medicine(
        &self,
        medicine_id: Uuid,
        input: UpdateMedicineInput,
    ) -> AppResult<Medicine> {
        input.validate()?;
        check_prices(input.unit_price, input.selling_price)?;

        let code = match input.code.as_deref().map(str::trim) {
            Some(code) => {
                let code = code.to_uppercase();
                validate_medicine_code(&code).map_err(|m| AppError::validation("code", m))?;
                self.ensure_code_free(&code, Some(medicine_id)).await?;
                Some(code)
            }
            None => None,
        };

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            UPDATE medicines
            SET code = COALESCE($1, code),
                item_description = COALESCE($2, item_description),
                displayed_quantity = COALESCE($3, displayed_quantity),
                unit_price = COALESCE($4, unit_price),
                selling_price = COALESCE($5, selling_price),
                expiry_date = COALESCE($6, expiry_date)
            WHERE id = $7
            RETURNING {}
            "#,
            MEDICINE_COLUMNS
        ))
        .bind(code)
        .bind(&input.item_description)
        .bind(input.displayed_quantity)
        .bind(input.unit_price)
        .bind(input.selling_price)
        .bind(input.expiry_date)
        .bind(medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        tracing::info!(%medicine_id, "Medicine updated");

        Ok(row.into())
    }

    /// Delete a medicine that no sale or receipt refers to
    pub async fn delete_medicine(&self, medicine_id: Uuid) -> AppResult<()> {
        let (sales, receipts) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sales WHERE medicine_id = $1),
                (SELECT COUNT(*) FROM medicine_receipts WHERE medicine_id = $1)
            "#,
        )
        .bind(medicine_id)
        .fetch_one(&self.db)
        .await?;

        if sales > 0 || receipts > 0 {
            return Err(AppError::ReferentialIntegrity(format!(
                "Medicine is referenced by {} sale(s) and {} receipt(s)",
                sales, receipts
            )));
        }

        // A sale recorded after the count still trips the foreign key
        let deleted = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }

        tracing::info!(%medicine_id, "Medicine deleted");

        Ok(())
    }

    /// Remove every medicine that has no sales or receipts. Returns the number removed.
    pub async fn clear_catalogue(&self) -> AppResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM medicines m
            WHERE NOT EXISTS (SELECT 1 FROM sales s WHERE s.medicine_id = m.id)
              AND NOT EXISTS (SELECT 1 FROM medicine_receipts r WHERE r.medicine_id = m.id)
            "#,
        )
        .execute(&self.db)
        .await?
        .rows_affected();

        tracing::warn!(deleted, "Medicine catalogue cleared");

        Ok(deleted)
    }

    /// Medicines at or below their displayed quantity
    pub async fn low_stock(&self) -> AppResult<Vec<Medicine>> {
        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {} FROM medicines WHERE quantity <= displayed_quantity ORDER BY quantity, code",
            MEDICINE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Medicine::from).collect())
    }

    /// Medicines whose expiry date is before `today`
    pub async fn expired(&self, today: NaiveDate) -> AppResult<Vec<Medicine>> {
        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {} FROM medicines WHERE expiry_date < $1 ORDER BY expiry_date, code",
            MEDICINE_COLUMNS
        ))
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Medicine::from).collect())
    }

    /// Medicines not yet expired that expire within `days` of `today`
    pub async fn expiring_soon(&self, today: NaiveDate, days: i64) -> AppResult<Vec<Medicine>> {
        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            SELECT {}
            FROM medicines
            WHERE expiry_date > $1 AND expiry_date <= $2
            ORDER BY expiry_date, code
            "#,
            MEDICINE_COLUMNS
        ))
        .bind(today)
        .bind(today + Duration::days(days))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Medicine::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_prices_rejects_negative() {
        let err = check_prices(Some(Decimal::from(-1)), None).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "unit_price"));
    }

    #[test]
    fn test_check_prices_rejects_sub_cent_selling_price() {
        let err = check_prices(None, Some(Decimal::new(1005, 3))).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "selling_price"));
    }

    #[test]
    fn test_create_input_defaults_opening_stock_to_zero() {
        let input: CreateMedicineInput = serde_json::from_value(serde_json::json!({
            "item_description": "PARACETAMOL 500MG",
            "displayed_quantity": 10,
            "unit_price": "40.00",
            "selling_price": "70.00",
            "expiry_date": "2027-01-31"
        }))
        .unwrap();
        assert_eq!(input.quantity, 0);
        assert!(input.code.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_input_rejects_empty_description() {
        let input = CreateMedicineInput {
            code: None,
            item_description: String::new(),
            quantity: 0,
            displayed_quantity: 0,
            unit_price: Decimal::ZERO,
            selling_price: Decimal::ZERO,
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_input_has_no_quantity_field() {
        let input: UpdateMedicineInput =
            serde_json::from_value(serde_json::json!({ "quantity": 999, "selling_price": "75" }))
                .unwrap();
        assert_eq!(input.selling_price, Some(Decimal::from(75)));
    }
}
