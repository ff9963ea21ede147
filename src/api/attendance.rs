use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::engine::status;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord};
use crate::store::attendance::{
    self as attendance_store, AttendanceFilter, CheckInOutcome, count_in_month, listing_spec,
};
use crate::store::members;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 1)]
    pub member_id: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// DAILY (default), MONTHLY, YEARLY or CUSTOM
    pub filter: Option<AttendanceFilter>,
    /// Day to show when filter is CUSTOM
    #[param(value_type = Option<String>, format = "date", example = "2024-01-25")]
    pub date: Option<NaiveDate>,
    /// Name or phone fragment
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceEntry>,
    #[schema(example = 12)]
    pub count: usize,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub from: NaiveDate,
    #[schema(example = "2024-01-25", format = "date", value_type = String)]
    pub to: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct MemberAttendanceResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 9)]
    pub this_month: usize,
}

/// Mark today's check-in
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Check-in recorded", body = Object, example = json!({
            "status": "recorded",
            "checkin_date": "2024-01-25"
        })),
        (status = 200, description = "Member already checked in today", body = Object, example = json!({
            "status": "already_marked",
            "checkin_date": "2024-01-25"
        })),
        (status = 400, description = "No plan valid today", body = Object, example = json!({
            "message": "Membership is not active"
        })),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    let member_id = payload.member_id;
    let today = config.calendar().today();

    let member = match members::fetch_member_with_intervals(pool.get_ref(), member_id).await? {
        Some(m) => m,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Member not found"
            })));
        }
    };

    if !status::is_active(&member.intervals, today) {
        warn!(member_id, "Check-in refused: membership not active");
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Membership is not active"
        })));
    }

    match attendance_store::insert_attendance(pool.get_ref(), member_id, today).await? {
        CheckInOutcome::Recorded(record) => {
            info!(member_id, %today, "Check-in recorded");
            Ok(HttpResponse::Created().json(json!({
                "status": "recorded",
                "checkin_date": record.checkin_date
            })))
        }
        CheckInOutcome::AlreadyMarked => Ok(HttpResponse::Ok().json(json!({
            "status": "already_marked",
            "checkin_date": today
        }))),
    }
}

/// Check-ins for a day, month, year or chosen date
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Check-ins, newest first", body = AttendanceListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let today = config.calendar().today();
    let filter = query.filter.unwrap_or_default();
    let (from, to) = filter.date_range(today, query.date);

    let spec = listing_spec(from, to, query.search.as_deref());
    let data = attendance_store::list_attendance(pool.get_ref(), &spec).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        count: data.len(),
        data,
        from,
        to,
    }))
}

/// Attendance history of a member
#[utoipa::path(
    get,
    path = "/api/members/{member_id}/attendance",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "History, newest first", body = MemberAttendanceResponse),
        (status = 404, description = "Member not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn member_attendance(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    if members::fetch_member(pool.get_ref(), member_id).await?.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Member not found"
        })));
    }

    let data = attendance_store::member_attendance(pool.get_ref(), member_id).await?;
    let this_month = count_in_month(&data, config.calendar().today());

    Ok(HttpResponse::Ok().json(MemberAttendanceResponse { data, this_month }))
}
