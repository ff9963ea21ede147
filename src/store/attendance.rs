use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{MySqlExecutor, MySqlPool};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceEntry, AttendanceRecord};
use crate::store::members::search_condition;
use crate::store::{StoreError, StoreResult};
use crate::utils::calendar::{start_of_month, start_of_year};
use crate::utils::query_spec::{Condition, QuerySpec, SqlValue, bind_values};

/// Result of a check-in. A second check-in on the same day is reported, not
/// treated as a failure.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    Recorded(AttendanceRecord),
    AlreadyMarked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceFilter {
    #[default]
    Daily,
    Monthly,
    Yearly,
    /// A single day given separately
    Custom,
}

impl AttendanceFilter {
    /// Inclusive date range the filter selects. `Custom` without a date
    /// falls back to today.
    pub fn date_range(
        &self,
        today: NaiveDate,
        custom: Option<NaiveDate>,
    ) -> (NaiveDate, NaiveDate) {
        match self {
            AttendanceFilter::Daily => (today, today),
            AttendanceFilter::Monthly => (start_of_month(today), today),
            AttendanceFilter::Yearly => (start_of_year(today), today),
            AttendanceFilter::Custom => {
                let day = custom.unwrap_or(today);
                (day, day)
            }
        }
    }
}

pub fn listing_spec(from: NaiveDate, to: NaiveDate, search: Option<&str>) -> QuerySpec {
    QuerySpec::new()
        .and(Condition::gte("a.checkin_date", SqlValue::Date(from)))
        .and(Condition::lte("a.checkin_date", SqlValue::Date(to)))
        .and_if(search_condition(search))
}

pub async fn insert_attendance<'c>(
    exec: impl MySqlExecutor<'c>,
    member_id: u64,
    checkin_date: NaiveDate,
) -> StoreResult<CheckInOutcome> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (member_id, checkin_date)
        VALUES (?, ?)
        "#,
    )
    .bind(member_id)
    .bind(checkin_date)
    .execute(exec)
    .await
    .map(|done| done.last_insert_id())
    .map_err(|e| StoreError::classify(e, "attendance"));

    checkin_outcome(result, member_id, checkin_date)
}

/// A duplicate (member, day) row means the member is already marked.
fn checkin_outcome(
    inserted: StoreResult<u64>,
    member_id: u64,
    checkin_date: NaiveDate,
) -> StoreResult<CheckInOutcome> {
    match inserted {
        Ok(id) => Ok(CheckInOutcome::Recorded(AttendanceRecord {
            id,
            member_id,
            checkin_date,
        })),
        Err(StoreError::Duplicate(_)) => Ok(CheckInOutcome::AlreadyMarked),
        Err(other) => Err(other),
    }
}

/// Newest first.
pub async fn member_attendance(
    pool: &MySqlPool,
    member_id: u64,
) -> StoreResult<Vec<AttendanceRecord>> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, member_id, checkin_date
        FROM attendance
        WHERE member_id = ?
        ORDER BY checkin_date DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::classify(e, "attendance"))
}

pub async fn list_attendance(
    pool: &MySqlPool,
    spec: &QuerySpec,
) -> StoreResult<Vec<AttendanceEntry>> {
    let (where_sql, values) = spec.where_clause();
    let sql = format!(
        r#"
        SELECT a.member_id, m.full_name, m.phone, a.checkin_date
        FROM attendance a
        JOIN members m ON m.id = a.member_id
        {}
        ORDER BY a.checkin_date DESC, a.id DESC
        "#,
        where_sql
    );

    bind_values!(sqlx::query_as::<_, AttendanceEntry>(&sql), values)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::classify(e, "attendance"))
}

pub async fn count_on(pool: &MySqlPool, day: NaiveDate) -> StoreResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE checkin_date = ?")
        .bind(day)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::classify(e, "attendance"))
}

/// Check-ins that fall in the same calendar month as `today`.
pub fn count_in_month(records: &[AttendanceRecord], today: NaiveDate) -> usize {
    let first = start_of_month(today);
    records
        .iter()
        .filter(|r| start_of_month(r.checkin_date) == first)
        .count()
}
