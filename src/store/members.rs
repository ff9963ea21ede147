use std::collections::HashMap;

use chrono::NaiveDate;
use futures_util::TryStreamExt;
use sqlx::{MySqlExecutor, MySqlPool};
use tracing::{debug, info};

use crate::model::member::{Member, MemberWithIntervals};
use crate::model::membership::{MembershipInterval, Plan};
use crate::model::payment::{PaymentMode, PaymentType};
use crate::store::memberships::{fetch_intervals, insert_interval};
use crate::store::payments::{NewPayment, insert_payment};
use crate::store::{StoreError, StoreResult};
use crate::utils::query_spec::{
    Condition, QuerySpec, SqlValue, bind_values, build_update_sql,
};

const MEMBER_COLUMNS: &str =
    "m.id, m.full_name, m.phone, m.age, m.gender, m.emergency_contact, m.created_at";

#[derive(Debug, Clone)]
pub struct NewMember {
    pub full_name: String,
    pub phone: String,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub emergency_contact: Option<String>,
}

/// Registration: the member, their admission fee and optionally a first plan.
#[derive(Debug, Clone)]
pub struct Registration {
    pub member: NewMember,
    pub admission_fee: f64,
    pub receipt_no: String,
    pub payment_mode: PaymentMode,
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub emergency_contact: Option<String>,
}

impl MemberUpdate {
    fn assignments(self) -> Vec<(&'static str, SqlValue)> {
        let mut out = Vec::new();
        if let Some(v) = self.full_name {
            out.push(("full_name", SqlValue::String(v)));
        }
        if let Some(v) = self.phone {
            out.push(("phone", SqlValue::String(v)));
        }
        if let Some(v) = self.age {
            out.push(("age", SqlValue::U64(u64::from(v))));
        }
        if let Some(v) = self.gender {
            out.push(("gender", SqlValue::String(v)));
        }
        if let Some(v) = self.emergency_contact {
            out.push(("emergency_contact", SqlValue::String(v)));
        }
        out
    }
}

/// Name-or-phone substring search over the `m` alias.
pub fn search_condition(search: Option<&str>) -> Option<Condition> {
    let needle = search.map(str::trim).filter(|s| !s.is_empty())?;
    Some(Condition::AnyOf(vec![
        Condition::contains("m.full_name", needle),
        Condition::contains("m.phone", needle),
    ]))
}

pub async fn insert_member<'c>(
    exec: impl MySqlExecutor<'c>,
    member: &NewMember,
) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO members (full_name, phone, age, gender, emergency_contact)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&member.full_name)
    .bind(&member.phone)
    .bind(member.age)
    .bind(&member.gender)
    .bind(&member.emergency_contact)
    .execute(exec)
    .await
    .map_err(|e| StoreError::classify(e, "phone"))?;

    Ok(result.last_insert_id())
}

/// Creates the member, the admission payment (when a fee was charged) and
/// the first plan interval in one transaction.
pub async fn register(pool: &MySqlPool, reg: Registration, today: NaiveDate) -> StoreResult<u64> {
    let mut tx = pool.begin().await?;

    let member_id = insert_member(&mut *tx, &reg.member).await?;

    if reg.admission_fee > 0.0 {
        insert_payment(
            &mut *tx,
            &NewPayment {
                member_id,
                amount: reg.admission_fee,
                receipt_no: reg.receipt_no.clone(),
                payment_mode: reg.payment_mode,
                payment_type: PaymentType::Admission,
            },
        )
        .await?;
    }

    if let Some(plan) = reg.plan {
        let end = plan
            .end_date(today)
            .ok_or_else(|| StoreError::Validation("plan end date out of range".into()))?;
        insert_interval(&mut *tx, member_id, &plan.to_string(), today, end).await?;
    }

    tx.commit().await?;

    info!(member_id, plan = ?reg.plan, "Member registered");
    Ok(member_id)
}

pub async fn fetch_member<'c>(
    exec: impl MySqlExecutor<'c>,
    member_id: u64,
) -> StoreResult<Option<Member>> {
    let spec = QuerySpec::new().and(Condition::eq("m.id", SqlValue::U64(member_id)));
    let (where_sql, values) = spec.where_clause();
    let sql = format!("SELECT {} FROM members m{}", MEMBER_COLUMNS, where_sql);

    bind_values!(sqlx::query_as::<_, Member>(&sql), values)
        .fetch_optional(exec)
        .await
        .map_err(|e| StoreError::classify(e, "member"))
}

pub async fn fetch_member_with_intervals(
    pool: &MySqlPool,
    member_id: u64,
) -> StoreResult<Option<MemberWithIntervals>> {
    let Some(member) = fetch_member(pool, member_id).await? else {
        return Ok(None);
    };
    let intervals = fetch_intervals(pool, member_id).await?;

    Ok(Some(MemberWithIntervals { member, intervals }))
}

/// Members matching `spec` (ordered by id), each with all of their intervals.
pub async fn fetch_all_members_with_intervals(
    pool: &MySqlPool,
    spec: &QuerySpec,
) -> StoreResult<Vec<MemberWithIntervals>> {
    let (where_sql, values) = spec.where_clause();

    let member_sql = format!("SELECT {} FROM members m{} ORDER BY m.id", MEMBER_COLUMNS, where_sql);
    debug!(sql = %member_sql, "Fetching roster");

    let members = bind_values!(sqlx::query_as::<_, Member>(&member_sql), values.clone())
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::classify(e, "member"))?;

    let interval_sql = format!(
        r#"
        SELECT ms.id, ms.member_id, ms.plan, ms.start_date, ms.end_date
        FROM memberships ms
        WHERE ms.member_id IN (SELECT m.id FROM members m{})
        ORDER BY ms.member_id, ms.start_date, ms.id
        "#,
        where_sql
    );
    let by_member = group_intervals(pool, &interval_sql, values).await?;

    Ok(attach_intervals(members, by_member))
}

/// `?, ?, ?` for an `IN (...)` list of `n` values.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Zero-based row offset of a page, or `None` when it does not fit a
/// MySQL `OFFSET`.
pub fn page_offset(page: u32, per_page: u32) -> Option<i64> {
    u64::from(page.max(1) - 1)
        .checked_mul(u64::from(per_page))
        .and_then(|offset| i64::try_from(offset).ok())
}

async fn group_intervals(
    pool: &MySqlPool,
    sql: &str,
    values: Vec<SqlValue>,
) -> StoreResult<HashMap<u64, Vec<MembershipInterval>>> {
    let mut by_member: HashMap<u64, Vec<MembershipInterval>> = HashMap::new();
    let mut stream = bind_values!(sqlx::query_as::<_, MembershipInterval>(sql), values).fetch(pool);

    while let Some(interval) = stream
        .try_next()
        .await
        .map_err(|e| StoreError::classify(e, "membership"))?
    {
        by_member.entry(interval.member_id).or_default().push(interval);
    }

    Ok(by_member)
}

fn attach_intervals(
    members: Vec<Member>,
    mut by_member: HashMap<u64, Vec<MembershipInterval>>,
) -> Vec<MemberWithIntervals> {
    members
        .into_iter()
        .map(|member| {
            let intervals = by_member.remove(&member.id).unwrap_or_default();
            MemberWithIntervals { member, intervals }
        })
        .collect()
}

/// One page of members (newest first) with their intervals, plus the total.
pub async fn list_members(
    pool: &MySqlPool,
    spec: &QuerySpec,
    page: u32,
    per_page: u32,
) -> StoreResult<(Vec<MemberWithIntervals>, i64)> {
    let (where_sql, values) = spec.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM members m{}", where_sql);
    let total = bind_values!(sqlx::query_scalar::<_, i64>(&count_sql), values.clone())
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::classify(e, "member"))?;

    let offset = page_offset(page, per_page)
        .ok_or_else(|| StoreError::Validation("page is out of range".into()))?;
    let data_sql = format!(
        "SELECT {} FROM members m{} ORDER BY m.id DESC LIMIT ? OFFSET ?",
        MEMBER_COLUMNS, where_sql
    );
    debug!(sql = %data_sql, page, per_page, "Fetching members");

    let members = bind_values!(sqlx::query_as::<_, Member>(&data_sql), values)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::classify(e, "member"))?;

    if members.is_empty() {
        return Ok((Vec::new(), total));
    }

    let ids: Vec<SqlValue> = members.iter().map(|m| SqlValue::U64(m.id)).collect();
    let interval_sql = format!(
        r#"
        SELECT ms.id, ms.member_id, ms.plan, ms.start_date, ms.end_date
        FROM memberships ms
        WHERE ms.member_id IN ({})
        ORDER BY ms.member_id, ms.start_date, ms.id
        "#,
        placeholders(ids.len())
    );
    let by_member = group_intervals(pool, &interval_sql, ids).await?;

    Ok((attach_intervals(members, by_member), total))
}

/// Quick lookup for the check-in desk.
pub async fn search_members(
    pool: &MySqlPool,
    needle: &str,
    limit: u32,
) -> StoreResult<Vec<Member>> {
    let spec = QuerySpec::new().and_if(search_condition(Some(needle)));
    let (where_sql, values) = spec.where_clause();

    let sql = format!(
        "SELECT {} FROM members m{} ORDER BY m.full_name LIMIT ?",
        MEMBER_COLUMNS, where_sql
    );

    bind_values!(sqlx::query_as::<_, Member>(&sql), values)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::classify(e, "member"))
}

pub async fn update_member(
    pool: &MySqlPool,
    member_id: u64,
    update: MemberUpdate,
) -> StoreResult<()> {
    if fetch_member(pool, member_id).await?.is_none() {
        return Err(StoreError::NotFound("member"));
    }

    let update = build_update_sql("members", update.assignments(), "id", member_id)?;
    debug!(sql = %update.sql, member_id, "Updating member");

    bind_values!(sqlx::query(&update.sql), update.values)
        .execute(pool)
        .await
        .map_err(|e| StoreError::classify(e, "phone"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_adds_no_condition() {
        assert_eq!(search_condition(None), None);
        assert_eq!(search_condition(Some("   ")), None);
    }

    #[test]
    fn search_matches_name_or_phone() {
        let spec = QuerySpec::new().and_if(search_condition(Some(" 98123 ")));
        let (sql, values) = spec.where_clause();
        assert_eq!(sql, " WHERE (m.full_name LIKE ? OR m.phone LIKE ?)");
        assert_eq!(values, vec![SqlValue::String("%98123%".into()); 2]);
    }

    #[test]
    fn update_assignments_follow_supplied_fields() {
        let update = MemberUpdate {
            full_name: Some("Kabir K".into()),
            age: Some(30),
            ..Default::default()
        };
        let assignments = update.assignments();
        let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["full_name", "age"]);
        assert_eq!(assignments[1].1, SqlValue::U64(30));
    }

    #[test]
    fn page_offsets() {
        assert_eq!(page_offset(1, 20), Some(0));
        assert_eq!(page_offset(0, 20), Some(0));
        assert_eq!(page_offset(3, 20), Some(40));
    }

    #[test]
    fn huge_page_does_not_overflow() {
        assert_eq!(page_offset(50_000_000, 100), Some(4_999_999_900));
        assert_eq!(page_offset(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn in_list_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn intervals_attach_to_their_member() {
        let member = |id: u64| Member {
            id,
            full_name: format!("Member {}", id),
            phone: format!("90000000{:02}", id),
            age: None,
            gender: None,
            emergency_contact: None,
            created_at: chrono::Utc::now(),
        };
        let interval = MembershipInterval {
            id: 7,
            member_id: 2,
            plan: "Monthly".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let by_member = HashMap::from([(2, vec![interval])]);

        let rows = attach_intervals(vec![member(1), member(2)], by_member);
        assert!(rows[0].intervals.is_empty());
        assert_eq!(rows[1].intervals.len(), 1);
        assert_eq!(rows[1].member.id, 2);
    }

    #[test]
    fn empty_update_has_no_assignments() {
        assert!(MemberUpdate::default().assignments().is_empty());
    }
}
