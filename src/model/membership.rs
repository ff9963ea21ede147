use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MembershipInterval {
    #[schema(example = 10)]
    pub id: u64,

    #[schema(example = 1)]
    pub member_id: u64,

    /// Plan label as sold, e.g. "Monthly"
    #[schema(example = "Monthly")]
    pub plan: String,

    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,

    /// Inclusive: the member may still train on this day
    #[schema(example = "2024-01-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

impl MembershipInterval {
    pub fn is_well_formed(&self) -> bool {
        self.start_date <= self.end_date
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum Plan {
    #[strum(to_string = "Monthly", serialize = "MONTHLY")]
    Monthly,
    #[strum(to_string = "Quarterly", serialize = "QUARTERLY")]
    Quarterly,
    #[strum(to_string = "Yearly", serialize = "YEARLY")]
    Yearly,
}

impl Plan {
    pub fn months(&self) -> u32 {
        match self {
            Plan::Monthly => 1,
            Plan::Quarterly => 3,
            Plan::Yearly => 12,
        }
    }

    /// Last valid day of a plan bought on `start`. Month arithmetic clamps to
    /// the end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn end_date(&self, start: NaiveDate) -> Option<NaiveDate> {
        start.checked_add_months(Months::new(self.months()))
    }
}
