use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub member_id: u64,
    #[schema(example = "2024-01-25", format = "date", value_type = String)]
    pub checkin_date: NaiveDate,
}

/// A check-in joined with the member it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceEntry {
    pub member_id: u64,
    pub full_name: String,
    pub phone: String,
    #[schema(example = "2024-01-25", format = "date", value_type = String)]
    pub checkin_date: NaiveDate,
}
