//! Inventory ledger: the only code path that changes a medicine's stock.
//!
//! Invariant: a medicine's `quantity` never goes negative, and every sale or
//! receipt row exists if and only if its stock movement was applied. Each
//! operation is one transaction; a failure at any step drops the transaction
//! and leaves stock and records as they were.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    deduct, line_total, plan_edit, validate_price, PaymentMethod, Receipt, Sale,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Ledger service for recording, editing and reversing stock movements
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    lock_timeout_ms: u64,
    statement_timeout_ms: u64,
}

/// Input for recording a sale
#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Input for editing a recorded sale
#[derive(Debug, Deserialize, Validate)]
pub struct EditSaleInput {
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
    pub payment_method: Option<PaymentMethod>,
}

/// Input for receiving stock
#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveStockInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Optional filters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub medicine_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Sale row as stored
#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    medicine_id: Uuid,
    quantity: i32,
    total_price: Decimal,
    payment_method: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let payment_method = row.payment_method.parse().map_err(AppError::Internal)?;
        Ok(Sale {
            id: row.id,
            medicine_id: row.medicine_id,
            quantity: row.quantity,
            total_price: row.total_price,
            payment_method,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Receipt row as stored
#[derive(Debug, FromRow)]
struct ReceiptRow {
    id: Uuid,
    medicine_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ReceiptRow> for Receipt {
    fn from(row: ReceiptRow) -> Self {
        Receipt {
            id: row.id,
            medicine_id: row.medicine_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

const SALE_COLUMNS: &str =
    "id, medicine_id, quantity, total_price, payment_method, created_by, created_at, updated_at";

const RECEIPT_COLUMNS: &str =
    "id, medicine_id, quantity, unit_price, total_price, created_by, created_at";

impl LedgerService {
    /// Create a new LedgerService instance with default lock and statement timeouts
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            lock_timeout_ms: 5000,
            statement_timeout_ms: 15000,
        }
    }

    /// Use the timeouts from the database configuration
    pub fn with_timeouts(mut self, config: &DatabaseConfig) -> Self {
        self.lock_timeout_ms = config.lock_timeout_ms;
        self.statement_timeout_ms = config.statement_timeout_ms;
        self
    }

    /// Open a ledger transaction with bounded lock waits
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.db.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true), set_config('statement_timeout', $2, true)")
            .bind(format!("{}ms", self.lock_timeout_ms))
            .bind(format!("{}ms", self.statement_timeout_ms))
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    /// Record a sale, taking the sold units out of stock.
    ///
    /// The availability check and the decrement are a single conditional
    /// `UPDATE`, so two concurrent sales can never both pass the check
    /// against the same stock level.
    pub async fn record_sale(&self, actor: Option<Uuid>, input: RecordSaleInput) -> AppResult<Sale> {
        input.validate()?;

        let mut tx = self.begin().await?;

        let selling_price = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE medicines
            SET quantity = quantity - $1
            WHERE id = $2 AND quantity >= $1
            RETURNING selling_price
            "#,
        )
        .bind(input.quantity)
        .bind(input.medicine_id)
        .fetch_optional(&mut *tx)
        .await?;

        let selling_price = match selling_price {
            Some(price) => price,
            None => {
                let available = sqlx::query_scalar::<_, i32>(
                    "SELECT quantity FROM medicines WHERE id = $1",
                )
                .bind(input.medicine_id)
                .fetch_optional(&mut *tx)
                .await?;
                tx.rollback().await?;

                let err = match available {
                    None => AppError::NotFound("Medicine".to_string()),
                    Some(available) => match deduct(available, input.quantity) {
                        Err(short) => short.into(),
                        // Stock arrived between the update and the lookup
                        Ok(_) => AppError::Transient("Stock level changed concurrently".to_string()),
                    },
                };
                tracing::info!(
                    medicine_id = %input.medicine_id,
                    quantity = input.quantity,
                    error = %err,
                    "Sale rejected"
                );
                return Err(err);
            }
        };

        let total_price = line_total(selling_price, input.quantity)?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (medicine_id, quantity, total_price, payment_method, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SALE_COLUMNS
        ))
        .bind(input.medicine_id)
        .bind(input.quantity)
        .bind(total_price)
        .bind(input.payment_method.as_str())
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %row.id,
            medicine_id = %row.medicine_id,
            quantity = row.quantity,
            total_price = %row.total_price,
            "Sale recorded"
        );

        row.try_into()
    }

    /// Reverse (delete) a sale and hand its units back to stock
    pub async fn reverse_sale(&self, sale_id: Uuid) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let (medicine_id, quantity) = sqlx::query_as::<_, (Uuid, i32)>(
            "DELETE FROM sales WHERE id = $1 RETURNING medicine_id, quantity",
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let restored = sqlx::query_scalar::<_, i32>(
            "UPDATE medicines SET quantity = quantity + $1 WHERE id = $2 RETURNING quantity",
        )
        .bind(quantity)
        .bind(medicine_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            %sale_id,
            %medicine_id,
            quantity,
            restored,
            "Sale reversed"
        );

        Ok(())
    }

    /// Change a sale's quantity, moving only the difference in or out of stock.
    ///
    /// The sale row and then the medicine row are locked for the whole
    /// adjustment; the stored total is recomputed from the current selling price.
    pub async fn edit_sale(&self, sale_id: Uuid, input: EditSaleInput) -> AppResult<Sale> {
        input.validate()?;

        let mut tx = self.begin().await?;

        let (medicine_id, old_quantity) = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT medicine_id, quantity FROM sales WHERE id = $1 FOR UPDATE",
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let (available, selling_price) = sqlx::query_as::<_, (i32, Decimal)>(
            "SELECT quantity, selling_price FROM medicines WHERE id = $1 FOR UPDATE",
        )
        .bind(medicine_id)
        .fetch_one(&mut *tx)
        .await?;

        let edit = match plan_edit(old_quantity, input.quantity, available) {
            Ok(edit) => edit,
            Err(short) => {
                tx.rollback().await?;
                tracing::info!(
                    %sale_id,
                    %medicine_id,
                    available = short.available,
                    requested = short.requested,
                    "Sale edit rejected"
                );
                return Err(short.into());
            }
        };

        if edit.delta != 0 {
            sqlx::query("UPDATE medicines SET quantity = quantity - $1 WHERE id = $2")
                .bind(edit.delta)
                .bind(medicine_id)
                .execute(&mut *tx)
                .await?;
        }

        let total_price = line_total(selling_price, input.quantity)?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales
            SET quantity = $1, total_price = $2, payment_method = COALESCE($3, payment_method)
            WHERE id = $4
            RETURNING {}
            "#,
            SALE_COLUMNS
        ))
        .bind(input.quantity)
        .bind(total_price)
        .bind(input.payment_method.map(|m| m.as_str()))
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            %sale_id,
            %medicine_id,
            delta = edit.delta,
            remaining = edit.remaining,
            "Sale edited"
        );

        row.try_into()
    }

    /// Receive stock into a medicine and record the receipt
    pub async fn receive_stock(
        &self,
        actor: Option<Uuid>,
        input: ReceiveStockInput,
    ) -> AppResult<Receipt> {
        input.validate()?;
        validate_price(input.unit_price).map_err(|msg| AppError::validation("unit_price", msg))?;

        let total_price = line_total(input.unit_price, input.quantity)?;

        let mut tx = self.begin().await?;

        let on_hand = sqlx::query_scalar::<_, i32>(
            "UPDATE medicines SET quantity = quantity + $1 WHERE id = $2 RETURNING quantity",
        )
        .bind(input.quantity)
        .bind(input.medicine_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            r#"
            INSERT INTO medicine_receipts (medicine_id, quantity, unit_price, total_price, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            RECEIPT_COLUMNS
        ))
        .bind(input.medicine_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(total_price)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            receipt_id = %row.id,
            medicine_id = %row.medicine_id,
            quantity = row.quantity,
            on_hand,
            "Stock received"
        );

        Ok(row.into())
    }

    /// Get a sale by ID
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<Sale> {
        sqlx::query_as::<_, SaleRow>(&format!("SELECT {} FROM sales WHERE id = $1", SALE_COLUMNS))
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?
            .try_into()
    }

    /// List sales, newest first
    pub async fn list_sales(&self, filter: &SaleFilter) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {}
            FROM sales
            WHERE ($1::uuid IS NULL OR medicine_id = $1)
              AND ($2::date IS NULL OR created_at::date >= $2)
              AND ($3::date IS NULL OR created_at::date <= $3)
            ORDER BY created_at DESC
            "#,
            SALE_COLUMNS
        ))
        .bind(filter.medicine_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// Get a receipt by ID
    pub async fn get_receipt(&self, receipt_id: Uuid) -> AppResult<Receipt> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {} FROM medicine_receipts WHERE id = $1",
            RECEIPT_COLUMNS
        ))
        .bind(receipt_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Receipt".to_string()))?;

        Ok(row.into())
    }

    /// List receipts, newest first
    pub async fn list_receipts(&self, medicine_id: Option<Uuid>) -> AppResult<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, ReceiptRow>(&format!(
            r#"
            SELECT {}
            FROM medicine_receipts
            WHERE ($1::uuid IS NULL OR medicine_id = $1)
            ORDER BY created_at DESC
            "#,
            RECEIPT_COLUMNS
        ))
        .bind(medicine_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Receipt::from).collect())
    }
}
