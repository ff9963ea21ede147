use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::model::payment::Payment;
use crate::store::{members, payments};

#[derive(Serialize, ToSchema)]
pub struct PaymentHistoryResponse {
    pub data: Vec<Payment>,
    #[schema(example = 2)]
    pub count: usize,
    #[schema(example = 2000.0)]
    pub total_amount: f64,
}

impl PaymentHistoryResponse {
    pub fn new(data: Vec<Payment>) -> Self {
        let total_amount = data.iter().map(|p| p.amount).sum();
        Self {
            count: data.len(),
            total_amount,
            data,
        }
    }
}

/// Payment history of a member, newest first
#[utoipa::path(
    get,
    path = "/api/members/{member_id}/payments",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Payments", body = PaymentHistoryResponse),
        (status = 404, description = "Member not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn member_payments(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    if members::fetch_member(pool.get_ref(), member_id).await?.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Member not found"
        })));
    }

    let data = payments::member_payments(pool.get_ref(), member_id).await?;
    Ok(HttpResponse::Ok().json(PaymentHistoryResponse::new(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payment(id: u64, amount: f64) -> Payment {
        Payment {
            id,
            member_id: 1,
            amount,
            receipt_no: format!("R-{}", id),
            payment_mode: "Cash".into(),
            payment_type: "RENEWAL".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_totals_amounts() {
        let resp = PaymentHistoryResponse::new(vec![payment(2, 1500.0), payment(1, 500.0)]);
        assert_eq!(resp.count, 2);
        assert_eq!(resp.total_amount, 2000.0);
    }

    #[test]
    fn empty_history() {
        let resp = PaymentHistoryResponse::new(Vec::new());
        assert_eq!(resp.count, 0);
        assert_eq!(resp.total_amount, 0.0);
    }
}
