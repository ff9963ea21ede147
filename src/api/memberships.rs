use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::messaging::renewal::PlanPricing;
use crate::model::membership::Plan;
use crate::model::payment::PaymentMode;
use crate::store::memberships::{self as membership_store, Renewal};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewRequest {
    pub plan: Plan,
    /// Defaults to the configured price of the plan
    #[schema(example = 1500.0)]
    pub amount: Option<f64>,
    #[schema(example = "REC-4822")]
    pub receipt_no: String,
    pub payment_mode: PaymentMode,
}

pub fn validate_renewal(payload: RenewRequest, pricing: &PlanPricing) -> Result<Renewal, String> {
    let receipt_no = payload.receipt_no.trim();
    if receipt_no.is_empty() {
        return Err("receipt_no is required".to_string());
    }

    let amount = payload.amount.unwrap_or_else(|| pricing.price(payload.plan));
    if !amount.is_finite() || amount < 0.0 {
        return Err("amount must be a non-negative number".to_string());
    }

    Ok(Renewal {
        plan: payload.plan,
        amount,
        receipt_no: receipt_no.to_string(),
        payment_mode: payload.payment_mode,
    })
}

/// Renew membership
#[utoipa::path(
    post,
    path = "/api/members/{member_id}/memberships",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 201, description = "New plan starts today", body = crate::model::membership::MembershipInterval),
        (status = 400, description = "Invalid renewal"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Receipt number already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn renew_membership(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<RenewRequest>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    let renewal = match validate_renewal(payload.into_inner(), &config.pricing) {
        Ok(r) => r,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
        }
    };

    let today = config.calendar().today();
    let interval = membership_store::renew(pool.get_ref(), member_id, renewal, today).await?;

    Ok(HttpResponse::Created().json(interval))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: Option<f64>, receipt: &str) -> RenewRequest {
        RenewRequest {
            plan: Plan::Quarterly,
            amount,
            receipt_no: receipt.into(),
            payment_mode: PaymentMode::Cash,
        }
    }

    #[test]
    fn amount_falls_back_to_plan_price() {
        let renewal = validate_renewal(request(None, "R-1"), &PlanPricing::default()).unwrap();
        assert_eq!(renewal.amount, 4000.0);
        assert_eq!(renewal.plan, Plan::Quarterly);
    }

    #[test]
    fn explicit_amount_wins() {
        let renewal =
            validate_renewal(request(Some(3500.0), " R-2 "), &PlanPricing::default()).unwrap();
        assert_eq!(renewal.amount, 3500.0);
        assert_eq!(renewal.receipt_no, "R-2");
    }

    #[test]
    fn receipt_is_required() {
        assert!(validate_renewal(request(None, "  "), &PlanPricing::default()).is_err());
    }

    #[test]
    fn parses_upper_case_plan() {
        let body = r#"{"plan":"YEARLY","receipt_no":"R-3","payment_mode":"UPI"}"#;
        let payload: RenewRequest = serde_json::from_str(body).unwrap();
        assert_eq!(payload.plan, Plan::Yearly);
        assert_eq!(payload.payment_mode, PaymentMode::Upi);
    }
}
