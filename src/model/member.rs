use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::membership::MembershipInterval;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "full_name": "Kabir Khan",
        "phone": "919812345678",
        "age": 27,
        "gender": "Male",
        "emergency_contact": "Ayesha 9876543210",
        "created_at": "2024-01-01T04:30:00Z"
    })
)]
pub struct Member {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Kabir Khan")]
    pub full_name: String,

    /// Unique contact handle, also used for reminder deep links
    #[schema(example = "919812345678")]
    pub phone: String,

    #[schema(example = 27, nullable = true)]
    pub age: Option<u8>,

    #[schema(example = "Male", nullable = true)]
    pub gender: Option<String>,

    #[schema(example = "Ayesha 9876543210", nullable = true)]
    pub emergency_contact: Option<String>,

    #[schema(example = "2024-01-01T04:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// A member together with every interval they ever purchased.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberWithIntervals {
    pub member: Member,
    pub intervals: Vec<MembershipInterval>,
}
