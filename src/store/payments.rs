use chrono::{DateTime, Utc};
use sqlx::{MySqlExecutor, MySqlPool};

use crate::engine::revenue::PaymentLine;
use crate::model::payment::{Payment, PaymentMode, PaymentType};
use crate::store::{StoreError, StoreResult};
use crate::utils::query_spec::{Condition, QuerySpec, SqlValue, bind_values};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub member_id: u64,
    pub amount: f64,
    pub receipt_no: String,
    pub payment_mode: PaymentMode,
    pub payment_type: PaymentType,
}

pub fn validate_amount(amount: f64) -> StoreResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(StoreError::Validation(
            "amount must be a non-negative number".into(),
        ));
    }
    Ok(())
}

pub async fn insert_payment<'c>(
    exec: impl MySqlExecutor<'c>,
    payment: &NewPayment,
) -> StoreResult<u64> {
    validate_amount(payment.amount)?;

    let result = sqlx::query(
        r#"
        INSERT INTO payments (member_id, amount, receipt_no, payment_mode, payment_type)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payment.member_id)
    .bind(payment.amount)
    .bind(&payment.receipt_no)
    .bind(payment.payment_mode.to_string())
    .bind(payment.payment_type.to_string())
    .execute(exec)
    .await
    .map_err(|e| StoreError::classify(e, "receipt"))?;

    Ok(result.last_insert_id())
}

/// Newest first.
pub async fn member_payments(pool: &MySqlPool, member_id: u64) -> StoreResult<Vec<Payment>> {
    sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, member_id, amount, receipt_no, payment_mode, payment_type, created_at
        FROM payments
        WHERE member_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::classify(e, "payment"))
}

fn since_spec(since: Option<DateTime<Utc>>) -> QuerySpec {
    QuerySpec::new().and_if(since.map(|t| Condition::gte("p.created_at", SqlValue::DateTime(t))))
}

/// Payments made at or after `since` (all of them for `None`), with payer.
pub async fn payment_lines(
    pool: &MySqlPool,
    since: Option<DateTime<Utc>>,
) -> StoreResult<Vec<PaymentLine>> {
    let (where_sql, values) = since_spec(since).where_clause();
    let sql = format!(
        r#"
        SELECT p.member_id, m.full_name, m.phone, p.amount
        FROM payments p
        JOIN members m ON m.id = p.member_id
        {}
        "#,
        where_sql
    );

    bind_values!(sqlx::query_as::<_, PaymentLine>(&sql), values)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::classify(e, "payment"))
}

pub async fn revenue_total(pool: &MySqlPool, since: Option<DateTime<Utc>>) -> StoreResult<f64> {
    let (where_sql, values) = since_spec(since).where_clause();
    let sql = format!(
        "SELECT CAST(COALESCE(SUM(p.amount), 0) AS DOUBLE) FROM payments p{}",
        where_sql
    );

    bind_values!(sqlx::query_scalar::<_, f64>(&sql), values)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::classify(e, "payment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn amounts_must_be_non_negative_and_finite() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(1500.0).is_ok());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn since_filter_is_optional() {
        assert!(since_spec(None).is_empty());

        let t = Utc.with_ymd_and_hms(2024, 1, 31, 18, 30, 0).unwrap();
        let (sql, values) = since_spec(Some(t)).where_clause();
        assert_eq!(sql, " WHERE p.created_at >= ?");
        assert_eq!(values, vec![SqlValue::DateTime(t)]);
    }
}
