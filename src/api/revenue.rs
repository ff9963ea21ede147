use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::revenue::{MemberRevenue, RevenueWindow, aggregate_by_member, grand_total};
use crate::store::payments;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RevenueQuery {
    /// DAILY, MONTHLY (default), YEARLY or LIFETIME
    pub filter: Option<RevenueWindow>,
}

#[derive(Serialize, ToSchema)]
pub struct RevenueResponse {
    pub filter: RevenueWindow,
    /// First day counted; absent for lifetime
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    pub data: Vec<MemberRevenue>,
    #[schema(example = 18500.0)]
    pub total: f64,
}

/// Collected revenue per member
#[utoipa::path(
    get,
    path = "/api/revenue",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Per-member revenue, largest first", body = RevenueResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Revenue"
)]
pub async fn revenue_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RevenueQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let calendar = config.calendar();
    let filter = query.filter.unwrap_or_default();
    let from = filter.start_date(calendar.today());
    let since = from.map(|d| calendar.day_start_utc(d));

    let lines = payments::payment_lines(pool.get_ref(), since).await?;
    let data = aggregate_by_member(&lines);
    let total = grand_total(&data);

    debug!(
        staff_id = auth.staff_id,
        username = %auth.username,
        ?filter,
        payments = lines.len(),
        "Revenue report built"
    );

    Ok(HttpResponse::Ok().json(RevenueResponse {
        filter,
        from,
        data,
        total,
    }))
}
