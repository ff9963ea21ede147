use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payment {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = 1)]
    pub member_id: u64,

    #[schema(example = 1500.0)]
    pub amount: f64,

    #[schema(example = "REC-4821")]
    pub receipt_no: String,

    /// `Cash` or `UPI`
    #[schema(example = "UPI")]
    pub payment_mode: String,

    /// `ADMISSION` or `RENEWAL`
    #[schema(example = "RENEWAL")]
    pub payment_type: String,

    #[schema(example = "2024-01-01T04:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
pub enum PaymentMode {
    Cash,
    #[serde(rename = "UPI")]
    #[strum(serialize = "UPI")]
    Upi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Admission,
    Renewal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_forms() {
        assert_eq!(PaymentMode::Cash.to_string(), "Cash");
        assert_eq!(PaymentMode::Upi.to_string(), "UPI");
        assert_eq!(PaymentType::Admission.to_string(), "ADMISSION");
        assert_eq!(PaymentType::Renewal.to_string(), "RENEWAL");
    }

    #[test]
    fn mode_deserializes_from_wire_form() {
        let mode: PaymentMode = serde_json::from_str("\"UPI\"").unwrap();
        assert_eq!(mode, PaymentMode::Upi);
    }
}
