//! Membership status engine.
//!
//! Pure functions over a member's purchased intervals and an explicit
//! reference date. Rules used everywhere in the service:
//!
//! - an interval covers its `end_date` (inclusive upper bound);
//! - remaining days count from `max(start_date, reference)` through
//!   `end_date` inclusive, summed over every covering interval without
//!   merging overlaps (stacked plans add up);
//! - a member with no intervals is neither active nor expired.
//!
//! Intervals with `end_date < start_date` are ignored.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::member::{Member, MemberWithIntervals};
use crate::model::membership::MembershipInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Expired,
    /// Registered but never bought a plan
    NoPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusSummary {
    pub status: MemberStatus,
    pub is_active: bool,
    pub days_remaining: u32,
    /// Plan label of the furthest-reaching interval (covering if active)
    pub plan: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterEntry {
    pub member: Member,
    pub plan: String,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub days_remaining: u32,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct Roster {
    pub active: Vec<RosterEntry>,
    pub expired: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WatchlistEntry {
    pub member_id: u64,
    pub full_name: String,
    pub phone: String,
    pub interval_id: u64,
    pub plan: String,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchlistPolicy {
    pub horizon_days: u32,
    pub limit: usize,
}

impl Default for WatchlistPolicy {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            limit: 10,
        }
    }
}

fn valid(intervals: &[MembershipInterval]) -> impl Iterator<Item = &MembershipInterval> {
    intervals.iter().filter(|i| i.is_well_formed())
}

fn covers(interval: &MembershipInterval, reference: NaiveDate) -> bool {
    interval.end_date >= reference
}

/// Latest end date wins; ties go to the lowest id.
fn furthest<'a>(
    candidates: impl Iterator<Item = &'a MembershipInterval>,
) -> Option<&'a MembershipInterval> {
    candidates.min_by(|a, b| b.end_date.cmp(&a.end_date).then(a.id.cmp(&b.id)))
}

pub fn is_active(intervals: &[MembershipInterval], reference: NaiveDate) -> bool {
    valid(intervals).any(|i| covers(i, reference))
}

/// Inclusive days an interval still grants from `reference` on; 0 once it has ended.
pub fn days_remaining_in(interval: &MembershipInterval, reference: NaiveDate) -> u32 {
    if !interval.is_well_formed() || !covers(interval, reference) {
        return 0;
    }
    let effective_start = interval.start_date.max(reference);
    let days = (interval.end_date - effective_start).num_days() + 1;
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

pub fn cumulative_days_remaining(intervals: &[MembershipInterval], reference: NaiveDate) -> u32 {
    valid(intervals)
        .map(|i| days_remaining_in(i, reference))
        .fold(0u32, u32::saturating_add)
}

pub fn latest_covering_interval(
    intervals: &[MembershipInterval],
    reference: NaiveDate,
) -> Option<&MembershipInterval> {
    furthest(valid(intervals).filter(|i| covers(i, reference)))
}

/// The interval reaching furthest into the future, regardless of the
/// reference date. A member is expired iff this exists and ends before the
/// reference date.
pub fn latest_expired_interval(intervals: &[MembershipInterval]) -> Option<&MembershipInterval> {
    furthest(valid(intervals))
}

pub fn classify(intervals: &[MembershipInterval], reference: NaiveDate) -> MemberStatus {
    match latest_expired_interval(intervals) {
        None => MemberStatus::NoPlan,
        Some(latest) if covers(latest, reference) => MemberStatus::Active,
        Some(_) => MemberStatus::Expired,
    }
}

pub fn summarize(intervals: &[MembershipInterval], reference: NaiveDate) -> StatusSummary {
    let status = classify(intervals, reference);
    let latest = latest_covering_interval(intervals, reference)
        .or_else(|| latest_expired_interval(intervals));

    StatusSummary {
        status,
        is_active: status == MemberStatus::Active,
        days_remaining: cumulative_days_remaining(intervals, reference),
        plan: latest.map(|i| i.plan.clone()),
        valid_until: latest.map(|i| i.end_date),
    }
}

/// Split a roster into active and expired members. Members without any
/// interval appear in neither list. Input order is preserved.
pub fn partition_roster(members: &[MemberWithIntervals], reference: NaiveDate) -> Roster {
    let mut roster = Roster::default();

    for m in members {
        let Some(latest) = latest_expired_interval(&m.intervals) else {
            continue;
        };

        let entry = RosterEntry {
            member: m.member.clone(),
            plan: latest.plan.clone(),
            end_date: latest.end_date,
            days_remaining: cumulative_days_remaining(&m.intervals, reference),
        };

        if covers(latest, reference) {
            roster.active.push(entry);
        } else {
            roster.expired.push(entry);
        }
    }

    roster
}

/// Intervals still valid on `reference` that end within `horizon_days`.
/// One entry per interval, soonest expiry first, capped at `limit`.
pub fn expiry_watchlist(
    members: &[MemberWithIntervals],
    reference: NaiveDate,
    policy: WatchlistPolicy,
) -> Vec<WatchlistEntry> {
    let horizon_days = Days::new(u64::from(policy.horizon_days));
    let Some(horizon) = reference.checked_add_days(horizon_days) else {
        return Vec::new();
    };

    let mut entries: Vec<WatchlistEntry> = members
        .iter()
        .flat_map(|m| {
            valid(&m.intervals)
                .filter(move |i| i.end_date >= reference && i.end_date <= horizon)
                .map(move |i| WatchlistEntry {
                    member_id: m.member.id,
                    full_name: m.member.full_name.clone(),
                    phone: m.member.phone.clone(),
                    interval_id: i.id,
                    plan: i.plan.clone(),
                    end_date: i.end_date,
                })
        })
        .collect();

    entries.sort_by(|a, b| a.end_date.cmp(&b.end_date).then(a.interval_id.cmp(&b.interval_id)));
    entries.truncate(policy.limit);
    entries
}
