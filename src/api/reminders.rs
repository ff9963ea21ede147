use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::IntoParams;

use crate::config::Config;
use crate::engine::status::{self, RosterEntry};
use crate::messaging::renewal::{RenewalReminder, build_reminder};
use crate::store::members::{fetch_all_members_with_intervals, search_condition};
use crate::utils::query_spec::QuerySpec;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReminderQuery {
    /// Name or phone fragment
    pub search: Option<String>,
}

pub fn reminders_for(config: &Config, expired: &[RosterEntry]) -> Vec<RenewalReminder> {
    expired
        .iter()
        .map(|e| {
            build_reminder(
                &config.reminder,
                &config.pricing,
                e.member.id,
                &e.member.full_name,
                &e.member.phone,
                &e.plan,
            )
        })
        .collect()
}

/// WhatsApp renewal reminders for expired members
#[utoipa::path(
    get,
    path = "/api/reminders/expired",
    params(ReminderQuery),
    responses(
        (status = 200, description = "One reminder per expired member", body = [RenewalReminder])
    ),
    security(("bearer_auth" = [])),
    tag = "Reminders"
)]
pub async fn expired_reminders(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReminderQuery>,
) -> actix_web::Result<impl Responder> {
    let spec = QuerySpec::new().and_if(search_condition(query.search.as_deref()));
    let members = fetch_all_members_with_intervals(pool.get_ref(), &spec).await?;

    let roster = status::partition_roster(&members, config.calendar().today());
    let reminders = reminders_for(&config, &roster.expired);

    info!(count = reminders.len(), "Renewal reminders prepared");

    Ok(HttpResponse::Ok().json(reminders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::member::Member;
    use chrono::{NaiveDate, Utc};

    fn config() -> Config {
        Config::from_lookup(|key: &str| match key {
            "SERVER_ADDR" => Some("127.0.0.1:8080".into()),
            "DATABASE_URL" => Some("mysql://localhost/gym".into()),
            "JWT_SECRET" => Some("secret".into()),
            "PLAN_PRICE_YEARLY" => Some("12000".into()),
            "GYM_NAME" => Some("IRON DEN".into()),
            _ => None,
        })
        .unwrap()
    }

    fn expired(plan: &str) -> RosterEntry {
        RosterEntry {
            member: Member {
                id: 3,
                full_name: "Asha Rao".into(),
                phone: "+91 90000 00003".into(),
                age: None,
                gender: None,
                emergency_contact: None,
                created_at: Utc::now(),
            },
            plan: plan.into(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            days_remaining: 0,
        }
    }

    #[test]
    fn reminder_uses_configured_price_and_gym() {
        let reminders = reminders_for(&config(), &[expired("Yearly")]);
        assert_eq!(reminders.len(), 1);

        let r = &reminders[0];
        assert_eq!(r.amount, 12000.0);
        assert!(r.message.contains("IRON DEN"));
        assert!(r.message.contains("Asha Rao"));
        assert!(r.link.starts_with("https://wa.me/919000000003?text="));
    }

    #[test]
    fn unknown_plan_is_priced_monthly() {
        let reminders = reminders_for(&config(), &[expired("Legacy")]);
        assert_eq!(reminders[0].amount, 1500.0);
    }
}
