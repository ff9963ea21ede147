use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::engine::status::{self, RosterEntry, StatusSummary};
use crate::model::member::Member;
use crate::model::membership::{MembershipInterval, Plan};
use crate::model::payment::PaymentMode;
use crate::store::members::{
    self as member_store, MemberUpdate, NewMember, Registration, search_condition,
};
use crate::utils::query_spec::QuerySpec;
use crate::utils::receipt::receipt_or_generate;

const QUICK_SEARCH_MIN_CHARS: usize = 2;
const QUICK_SEARCH_LIMIT: u32 = 6;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMember {
    #[schema(example = "Kabir Khan")]
    pub full_name: String,
    #[schema(example = "919812345678")]
    pub phone: String,
    #[schema(example = 27)]
    pub age: Option<u8>,
    #[schema(example = "Male")]
    pub gender: Option<String>,
    #[schema(example = "Ayesha 9876543210")]
    pub emergency_contact: Option<String>,
    /// Admission fee; no payment is recorded when 0
    #[serde(default)]
    #[schema(example = 500.0)]
    pub amount: f64,
    /// Generated when blank
    #[schema(example = "REC-4821")]
    pub receipt_no: Option<String>,
    #[serde(default = "default_mode")]
    pub payment_mode: PaymentMode,
    /// First plan, starting today
    pub plan: Option<Plan>,
}

fn default_mode() -> PaymentMode {
    PaymentMode::Cash
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMember {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MemberQuery {
    /// Page number, from 1
    pub page: Option<u32>,
    /// Items per page (max 100)
    pub per_page: Option<u32>,
    /// Name or phone fragment
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct QuickSearchQuery {
    /// At least two characters of a name or phone number
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RosterQuery {
    /// Name or phone fragment
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MemberListItem {
    pub member: Member,
    pub status: StatusSummary,
}

#[derive(Serialize, ToSchema)]
pub struct MemberListResponse {
    pub data: Vec<MemberListItem>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MemberProfileResponse {
    pub member: Member,
    pub intervals: Vec<MembershipInterval>,
    pub status: StatusSummary,
}

#[derive(Serialize, ToSchema)]
pub struct ExpiredMemberItem {
    #[serde(flatten)]
    pub entry: RosterEntry,
    /// Price of renewing the lapsed plan
    #[schema(example = 1500.0)]
    pub renewal_amount: f64,
}

fn trimmed(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(trimmed)
}

fn validate_age(age: Option<u8>) -> Result<(), String> {
    match age {
        Some(a) if a == 0 || a > 120 => Err("age must be between 1 and 120".to_string()),
        _ => Ok(()),
    }
}

/// Checks a registration form and turns it into a store request.
pub fn validate_registration(payload: CreateMember) -> Result<Registration, String> {
    let full_name = trimmed(&payload.full_name).ok_or("full_name is required")?;
    let phone = trimmed(&payload.phone).ok_or("phone is required")?;
    validate_age(payload.age)?;

    if !payload.amount.is_finite() || payload.amount < 0.0 {
        return Err("amount must be a non-negative number".to_string());
    }

    Ok(Registration {
        member: NewMember {
            full_name,
            phone,
            age: payload.age,
            gender: optional_text(payload.gender),
            emergency_contact: optional_text(payload.emergency_contact),
        },
        admission_fee: payload.amount,
        receipt_no: receipt_or_generate(payload.receipt_no.as_deref()),
        payment_mode: payload.payment_mode,
        plan: payload.plan,
    })
}

/// Checks a bio edit. Name and phone may change but never become blank.
pub fn validate_update(payload: UpdateMember) -> Result<MemberUpdate, String> {
    let full_name = match payload.full_name {
        Some(v) => Some(trimmed(&v).ok_or("full_name cannot be blank")?),
        None => None,
    };
    let phone = match payload.phone {
        Some(v) => Some(trimmed(&v).ok_or("phone cannot be blank")?),
        None => None,
    };
    validate_age(payload.age)?;

    Ok(MemberUpdate {
        full_name,
        phone,
        age: payload.age,
        gender: optional_text(payload.gender),
        emergency_contact: optional_text(payload.emergency_contact),
    })
}

/// Register member
#[utoipa::path(
    post,
    path = "/api/members",
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member registered", body = Object, example = json!({
            "message": "Member registered successfully",
            "member_id": 1
        })),
        (status = 400, description = "Invalid registration form"),
        (status = 409, description = "Phone or receipt number already used"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn create_member(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateMember>,
) -> actix_web::Result<impl Responder> {
    let registration = match validate_registration(payload.into_inner()) {
        Ok(r) => r,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
        }
    };

    let today = config.calendar().today();
    let member_id = member_store::register(pool.get_ref(), registration, today).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Member registered successfully",
        "member_id": member_id
    })))
}

/// List members with their status
#[utoipa::path(
    get,
    path = "/api/members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Paginated member list", body = MemberListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn list_members(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MemberQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let spec = QuerySpec::new().and_if(search_condition(query.search.as_deref()));
    let (rows, total) = member_store::list_members(pool.get_ref(), &spec, page, per_page).await?;

    let today = config.calendar().today();
    let data = rows
        .into_iter()
        .map(|row| MemberListItem {
            status: status::summarize(&row.intervals, today),
            member: row.member,
        })
        .collect();

    Ok(HttpResponse::Ok().json(MemberListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Quick member lookup for check-in
#[utoipa::path(
    get,
    path = "/api/members/search",
    params(QuickSearchQuery),
    responses(
        (status = 200, description = "Up to six matching members", body = [Member])
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn quick_search(
    pool: web::Data<MySqlPool>,
    query: web::Query<QuickSearchQuery>,
) -> actix_web::Result<impl Responder> {
    let needle = query.q.trim();
    if needle.chars().count() < QUICK_SEARCH_MIN_CHARS {
        return Ok(HttpResponse::Ok().json(Vec::<Member>::new()));
    }

    let members = member_store::search_members(pool.get_ref(), needle, QUICK_SEARCH_LIMIT).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// Member profile
#[utoipa::path(
    get,
    path = "/api/members/{member_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member found", body = MemberProfileResponse),
        (status = 404, description = "Member not found", body = Object, example = json!({
            "message": "Member not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn get_member(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    match member_store::fetch_member_with_intervals(pool.get_ref(), member_id).await? {
        Some(found) => {
            let today = config.calendar().today();
            Ok(HttpResponse::Ok().json(MemberProfileResponse {
                status: status::summarize(&found.intervals, today),
                member: found.member,
                intervals: found.intervals,
            }))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Member not found"
        }))),
    }
}

/// Edit member bio
#[utoipa::path(
    put,
    path = "/api/members/{member_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = Object, example = json!({
            "message": "Member updated successfully"
        })),
        (status = 400, description = "Invalid or empty update"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Phone already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn update_member(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateMember>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();

    let update = match validate_update(payload.into_inner()) {
        Ok(u) => u,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
        }
    };

    member_store::update_member(pool.get_ref(), member_id, update).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Member updated successfully"
    })))
}

/// Members holding at least one plan valid today
#[utoipa::path(
    get,
    path = "/api/members/active",
    params(RosterQuery),
    responses(
        (status = 200, description = "Active roster", body = [RosterEntry])
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn active_members(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let spec = QuerySpec::new().and_if(search_condition(query.search.as_deref()));
    let members = member_store::fetch_all_members_with_intervals(pool.get_ref(), &spec).await?;

    let roster = status::partition_roster(&members, config.calendar().today());
    debug!(active = roster.active.len(), "Active roster built");

    Ok(HttpResponse::Ok().json(roster.active))
}

/// Members whose every plan has ended
#[utoipa::path(
    get,
    path = "/api/members/expired",
    params(RosterQuery),
    responses(
        (status = 200, description = "Expired roster with renewal prices", body = [ExpiredMemberItem])
    ),
    security(("bearer_auth" = [])),
    tag = "Members"
)]
pub async fn expired_members(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let spec = QuerySpec::new().and_if(search_condition(query.search.as_deref()));
    let members = member_store::fetch_all_members_with_intervals(pool.get_ref(), &spec).await?;

    let roster = status::partition_roster(&members, config.calendar().today());
    let data: Vec<ExpiredMemberItem> = roster
        .expired
        .into_iter()
        .map(|entry| ExpiredMemberItem {
            renewal_amount: config.pricing.price_for_label(&entry.plan),
            entry,
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CreateMember {
        CreateMember {
            full_name: "  Kabir Khan ".into(),
            phone: "919812345678".into(),
            age: Some(27),
            gender: Some("Male".into()),
            emergency_contact: Some("   ".into()),
            amount: 500.0,
            receipt_no: None,
            payment_mode: PaymentMode::Upi,
            plan: Some(Plan::Monthly),
        }
    }

    #[test]
    fn registration_is_normalized() {
        let reg = validate_registration(form()).unwrap();
        assert_eq!(reg.member.full_name, "Kabir Khan");
        assert_eq!(reg.member.emergency_contact, None);
        assert!(reg.receipt_no.starts_with("REC-"));
        assert_eq!(reg.plan, Some(Plan::Monthly));
    }

    #[test]
    fn registration_requires_name_and_phone() {
        let mut f = form();
        f.full_name = " ".into();
        assert!(validate_registration(f).is_err());

        let mut f = form();
        f.phone = String::new();
        assert!(validate_registration(f).is_err());
    }

    #[test]
    fn registration_rejects_bad_numbers() {
        let mut f = form();
        f.amount = -10.0;
        assert!(validate_registration(f).is_err());

        let mut f = form();
        f.age = Some(0);
        assert!(validate_registration(f).is_err());
    }

    #[test]
    fn registration_json_defaults() {
        let body = r#"{"full_name":"Asha","phone":"9000000001"}"#;
        let payload: CreateMember = serde_json::from_str(body).unwrap();
        assert_eq!(payload.amount, 0.0);
        assert_eq!(payload.payment_mode, PaymentMode::Cash);
        assert_eq!(payload.plan, None);
    }

    #[test]
    fn update_rejects_blank_name() {
        let payload = UpdateMember {
            full_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_update(payload).is_err());
    }

    #[test]
    fn update_keeps_only_supplied_fields() {
        let payload = UpdateMember {
            phone: Some(" 9000000002 ".into()),
            ..Default::default()
        };
        let update = validate_update(payload).unwrap();
        assert_eq!(update.phone.as_deref(), Some("9000000002"));
        assert_eq!(update.full_name, None);
    }
}
