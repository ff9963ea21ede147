use crate::api::attendance::{AttendanceListResponse, CheckInRequest, MemberAttendanceResponse};
use crate::api::dashboard::{DashboardResponse, MemberCounts, RevenueSnapshot};
use crate::api::members::{
    CreateMember, ExpiredMemberItem, MemberListItem, MemberListResponse, MemberProfileResponse,
    UpdateMember,
};
use crate::api::memberships::RenewRequest;
use crate::api::payments::PaymentHistoryResponse;
use crate::api::revenue::RevenueResponse;
use crate::engine::revenue::{MemberRevenue, RevenueWindow};
use crate::engine::status::{MemberStatus, RosterEntry, StatusSummary, WatchlistEntry};
use crate::messaging::renewal::RenewalReminder;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord};
use crate::model::member::Member;
use crate::model::membership::{MembershipInterval, Plan};
use crate::model::payment::{Payment, PaymentMode, PaymentType};
use crate::models::{LoginReqDto, LoginResponse};
use crate::store::attendance::AttendanceFilter;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gym Front Desk API",
        version = "1.0.0",
        description = r#"
## Gym Membership Management

Backend for a single gym's front desk.

### Features
- **Members**: registration, profiles, bio edits, quick search
- **Memberships**: plan renewals that stack on top of earlier plans
- **Attendance**: one check-in per member per day
- **Revenue**: per-member totals by day, month, year or lifetime (admins)
- **Reminders**: WhatsApp renewal links for expired members

Every date is computed in the gym's configured time zone.

### Security
All `/api` endpoints require a **JWT Bearer** token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::members::create_member,
        crate::api::members::list_members,
        crate::api::members::quick_search,
        crate::api::members::get_member,
        crate::api::members::update_member,
        crate::api::members::active_members,
        crate::api::members::expired_members,

        crate::api::memberships::renew_membership,
        crate::api::payments::member_payments,

        crate::api::attendance::check_in,
        crate::api::attendance::list_attendance,
        crate::api::attendance::member_attendance,

        crate::api::dashboard::dashboard,
        crate::api::revenue::revenue_report,
        crate::api::reminders::expired_reminders
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Member,
            MembershipInterval,
            Plan,
            Payment,
            PaymentMode,
            PaymentType,
            AttendanceRecord,
            AttendanceEntry,
            AttendanceFilter,
            MemberStatus,
            StatusSummary,
            RosterEntry,
            WatchlistEntry,
            RevenueWindow,
            MemberRevenue,
            RenewalReminder,
            CreateMember,
            UpdateMember,
            MemberListItem,
            MemberListResponse,
            MemberProfileResponse,
            ExpiredMemberItem,
            RenewRequest,
            PaymentHistoryResponse,
            CheckInRequest,
            AttendanceListResponse,
            MemberAttendanceResponse,
            MemberCounts,
            RevenueSnapshot,
            DashboardResponse,
            RevenueResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Staff login"),
        (name = "Members", description = "Member registration, profiles and renewals"),
        (name = "Attendance", description = "Daily check-ins"),
        (name = "Dashboard", description = "Front desk overview"),
        (name = "Revenue", description = "Collected payments"),
        (name = "Reminders", description = "Renewal reminders"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_member_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/members/{member_id}"));
        assert!(doc.paths.paths.contains_key("/auth/login"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
