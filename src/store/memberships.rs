use chrono::NaiveDate;
use sqlx::{MySqlExecutor, MySqlPool};
use tracing::info;

use crate::model::membership::{MembershipInterval, Plan};
use crate::model::payment::{PaymentMode, PaymentType};
use crate::store::members::fetch_member;
use crate::store::payments::{NewPayment, insert_payment};
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct Renewal {
    pub plan: Plan,
    pub amount: f64,
    pub receipt_no: String,
    pub payment_mode: PaymentMode,
}

pub async fn insert_interval<'c>(
    exec: impl MySqlExecutor<'c>,
    member_id: u64,
    plan: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> StoreResult<u64> {
    if end_date < start_date {
        return Err(StoreError::Validation(
            "end_date cannot be before start_date".into(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO memberships (member_id, plan, start_date, end_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(member_id)
    .bind(plan)
    .bind(start_date)
    .bind(end_date)
    .execute(exec)
    .await
    .map_err(|e| StoreError::classify(e, "membership"))?;

    Ok(result.last_insert_id())
}

pub async fn fetch_intervals<'c>(
    exec: impl MySqlExecutor<'c>,
    member_id: u64,
) -> StoreResult<Vec<MembershipInterval>> {
    sqlx::query_as::<_, MembershipInterval>(
        r#"
        SELECT id, member_id, plan, start_date, end_date
        FROM memberships
        WHERE member_id = ?
        ORDER BY start_date ASC, id ASC
        "#,
    )
    .bind(member_id)
    .fetch_all(exec)
    .await
    .map_err(|e| StoreError::classify(e, "membership"))
}

/// Sells a new plan starting `today` and records the renewal payment.
/// Existing intervals are left untouched; the new one stacks on top.
pub async fn renew(
    pool: &MySqlPool,
    member_id: u64,
    renewal: Renewal,
    today: NaiveDate,
) -> StoreResult<MembershipInterval> {
    let end_date = renewal
        .plan
        .end_date(today)
        .ok_or_else(|| StoreError::Validation("plan end date out of range".into()))?;

    let mut tx = pool.begin().await?;

    if fetch_member(&mut *tx, member_id).await?.is_none() {
        return Err(StoreError::NotFound("member"));
    }

    let label = renewal.plan.to_string();
    let id = insert_interval(&mut *tx, member_id, &label, today, end_date).await?;

    insert_payment(
        &mut *tx,
        &NewPayment {
            member_id,
            amount: renewal.amount,
            receipt_no: renewal.receipt_no,
            payment_mode: renewal.payment_mode,
            payment_type: PaymentType::Renewal,
        },
    )
    .await?;

    tx.commit().await?;

    info!(member_id, interval_id = id, plan = %label, %end_date, "Membership renewed");

    Ok(MembershipInterval {
        id,
        member_id,
        plan: label,
        start_date: today,
        end_date,
    })
}
