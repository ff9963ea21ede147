use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::revenue::RevenueWindow;
use crate::engine::status::{self, MemberStatus, WatchlistEntry};
use crate::model::member::MemberWithIntervals;
use crate::store::{attendance, members, payments};
use crate::utils::calendar::Calendar;
use crate::utils::query_spec::QuerySpec;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct MemberCounts {
    #[schema(example = 120)]
    pub total: usize,
    #[schema(example = 84)]
    pub active: usize,
    #[schema(example = 30)]
    pub expired: usize,
    /// Registered without ever buying a plan
    #[schema(example = 6)]
    pub no_plan: usize,
}

#[derive(Serialize, ToSchema)]
pub struct RevenueSnapshot {
    #[schema(example = 3000.0)]
    pub today: f64,
    #[schema(example = 42000.0)]
    pub month: f64,
    #[schema(example = 512000.0)]
    pub lifetime: f64,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub members: MemberCounts,
    #[schema(example = 37)]
    pub checkins_today: i64,
    /// Plans running out soon
    pub expiring_soon: Vec<WatchlistEntry>,
    /// Only present for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<RevenueSnapshot>,
}

pub fn count_members(
    members: &[MemberWithIntervals],
    reference: chrono::NaiveDate,
) -> MemberCounts {
    members.iter().fold(
        MemberCounts {
            total: members.len(),
            ..Default::default()
        },
        |mut counts, m| {
            match status::classify(&m.intervals, reference) {
                MemberStatus::Active => counts.active += 1,
                MemberStatus::Expired => counts.expired += 1,
                MemberStatus::NoPlan => counts.no_plan += 1,
            }
            counts
        },
    )
}

async fn revenue_in(
    pool: &MySqlPool,
    calendar: &Calendar,
    window: RevenueWindow,
) -> actix_web::Result<f64> {
    let since = window
        .start_date(calendar.today())
        .map(|d| calendar.day_start_utc(d));
    Ok(payments::revenue_total(pool, since).await?)
}

/// Front desk overview
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Counts, today's check-ins and the expiry watchlist", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let calendar = config.calendar();
    let today = calendar.today();

    let roster =
        members::fetch_all_members_with_intervals(pool.get_ref(), &QuerySpec::new()).await?;
    let counts = count_members(&roster, today);
    let expiring_soon = status::expiry_watchlist(&roster, today, config.watchlist);
    let checkins_today = attendance::count_on(pool.get_ref(), today).await?;

    let revenue = if auth.is_admin() {
        Some(RevenueSnapshot {
            today: revenue_in(pool.get_ref(), &calendar, RevenueWindow::Daily).await?,
            month: revenue_in(pool.get_ref(), &calendar, RevenueWindow::Monthly).await?,
            lifetime: revenue_in(pool.get_ref(), &calendar, RevenueWindow::Lifetime).await?,
        })
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(DashboardResponse {
        members: counts,
        checkins_today,
        expiring_soon,
        revenue,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::member::Member;
    use crate::model::membership::MembershipInterval;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(id: u64, spans: &[(NaiveDate, NaiveDate)]) -> MemberWithIntervals {
        MemberWithIntervals {
            member: Member {
                id,
                full_name: format!("Member {}", id),
                phone: format!("90000000{:02}", id),
                age: None,
                gender: None,
                emergency_contact: None,
                created_at: Utc::now(),
            },
            intervals: spans
                .iter()
                .enumerate()
                .map(|(n, (start, end))| MembershipInterval {
                    id: id * 10 + n as u64,
                    member_id: id,
                    plan: "Monthly".into(),
                    start_date: *start,
                    end_date: *end,
                })
                .collect(),
        }
    }

    #[test]
    fn counts_every_status() {
        let today = date(2024, 1, 25);
        let roster = vec![
            member(1, &[(date(2024, 1, 1), date(2024, 1, 31))]),
            member(2, &[(date(2023, 11, 1), date(2023, 12, 1))]),
            member(3, &[]),
            member(4, &[(date(2024, 1, 25), date(2024, 1, 25))]),
        ];

        let counts = count_members(&roster, today);
        assert_eq!(
            counts,
            MemberCounts {
                total: 4,
                active: 2,
                expired: 1,
                no_plan: 1,
            }
        );
    }

    #[test]
    fn empty_roster() {
        assert_eq!(count_members(&[], date(2024, 1, 25)), MemberCounts::default());
    }
}
