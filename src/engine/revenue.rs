use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::calendar::{start_of_month, start_of_year};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueWindow {
    Daily,
    #[default]
    Monthly,
    Yearly,
    Lifetime,
}

impl RevenueWindow {
    /// First calendar day inside the window; `None` means unbounded.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            RevenueWindow::Daily => Some(today),
            RevenueWindow::Monthly => Some(start_of_month(today)),
            RevenueWindow::Yearly => Some(start_of_year(today)),
            RevenueWindow::Lifetime => None,
        }
    }
}

/// One payment joined with its payer, as read from the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentLine {
    pub member_id: u64,
    pub full_name: String,
    pub phone: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemberRevenue {
    pub member_id: u64,
    pub full_name: String,
    pub phone: String,
    pub total: f64,
    pub payments: u32,
}

/// Per-member totals, largest first (member id breaks ties).
pub fn aggregate_by_member(lines: &[PaymentLine]) -> Vec<MemberRevenue> {
    let mut by_member: HashMap<u64, MemberRevenue> = HashMap::new();

    for line in lines {
        let entry = by_member.entry(line.member_id).or_insert_with(|| MemberRevenue {
            member_id: line.member_id,
            full_name: line.full_name.clone(),
            phone: line.phone.clone(),
            total: 0.0,
            payments: 0,
        });
        entry.total += line.amount;
        entry.payments += 1;
    }

    let mut rows: Vec<MemberRevenue> = by_member.into_values().collect();
    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then(a.member_id.cmp(&b.member_id))
    });
    rows
}

pub fn grand_total(rows: &[MemberRevenue]) -> f64 {
    rows.iter().map(|r| r.total).sum()
}
