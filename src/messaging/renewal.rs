//! Renewal reminders delivered through WhatsApp click-to-chat links.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::membership::Plan;

/// Renewal price per plan. Built from configuration.
#[derive(Debug, Clone)]
pub struct PlanPricing {
    prices: HashMap<Plan, f64>,
}

impl PlanPricing {
    pub fn new(monthly: f64, quarterly: f64, yearly: f64) -> Self {
        let prices = HashMap::from([
            (Plan::Monthly, monthly),
            (Plan::Quarterly, quarterly),
            (Plan::Yearly, yearly),
        ]);
        Self { prices }
    }

    pub fn price(&self, plan: Plan) -> f64 {
        self.prices.get(&plan).copied().unwrap_or_default()
    }

    /// Price for a stored plan label; unknown labels are charged as monthly.
    pub fn price_for_label(&self, label: &str) -> f64 {
        let plan = Plan::from_str(label.trim()).unwrap_or(Plan::Monthly);
        self.price(plan)
    }
}

impl Default for PlanPricing {
    fn default() -> Self {
        Self::new(1500.0, 4000.0, 14000.0)
    }
}

#[derive(Debug, Clone)]
pub struct ReminderTemplate {
    pub gym_name: String,
    pub payment_qr_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalReminder {
    pub member_id: u64,
    pub full_name: String,
    pub phone: String,
    pub plan: String,
    pub amount: f64,
    pub message: String,
    pub link: String,
}

pub fn compose_renewal_message(
    template: &ReminderTemplate,
    full_name: &str,
    plan: &str,
    amount: f64,
) -> String {
    format!(
        "⚠️ MEMBERSHIP EXPIRED – {gym}\n\n\
         Hello {name},\n\n\
         Your gym membership has expired.\n\n\
         💳 Renewal Details:\nPlan: {plan}\nAmount: ₹{amount}\n\n\
         📌 Pay using UPI QR:\n{qr}\n\n\
         After payment, please show the receipt at the gym 💪\n\n\
         – {gym}",
        gym = template.gym_name,
        name = full_name,
        plan = plan,
        amount = amount,
        qr = template.payment_qr_url,
    )
}

/// `https://wa.me/<digits>?text=<message>`; non-digits are dropped from the phone.
pub fn whatsapp_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("https://wa.me/{}?text={}", digits, urlencoding::encode(text))
}

pub fn build_reminder(
    template: &ReminderTemplate,
    pricing: &PlanPricing,
    member_id: u64,
    full_name: &str,
    phone: &str,
    plan: &str,
) -> RenewalReminder {
    let amount = pricing.price_for_label(plan);
    let message = compose_renewal_message(template, full_name, plan, amount);
    let link = whatsapp_link(phone, &message);

    RenewalReminder {
        member_id,
        full_name: full_name.to_string(),
        phone: phone.to_string(),
        plan: plan.to_string(),
        amount,
        message,
        link,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn template() -> ReminderTemplate {
        ReminderTemplate {
            gym_name: "IRON HOUSE".to_string(),
            payment_qr_url: "https://example.test/qr.png".to_string(),
        }
    }

    #[test]
    fn default_prices() {
        let pricing = PlanPricing::default();
        assert_eq!(pricing.price(Plan::Monthly), 1500.0);
        assert_eq!(pricing.price(Plan::Quarterly), 4000.0);
        assert_eq!(pricing.price(Plan::Yearly), 14000.0);
    }

    #[test]
    fn every_plan_has_a_price() {
        let pricing = PlanPricing::new(1.0, 2.0, 3.0);
        for plan in Plan::iter() {
            assert!(pricing.price(plan) > 0.0);
        }
    }

    #[test]
    fn labels_and_keys_map_to_the_same_price() {
        let pricing = PlanPricing::default();
        assert_eq!(pricing.price_for_label("Quarterly"), 4000.0);
        assert_eq!(pricing.price_for_label("QUARTERLY"), 4000.0);
        assert_eq!(pricing.price_for_label("Promo"), 1500.0);
    }

    #[test]
    fn message_mentions_member_plan_and_amount() {
        let msg = compose_renewal_message(&template(), "Kabir Khan", "Yearly", 14000.0);
        assert!(msg.contains("Hello Kabir Khan,"));
        assert!(msg.contains("Plan: Yearly"));
        assert!(msg.contains("Amount: ₹14000"));
        assert!(msg.contains("https://example.test/qr.png"));
        assert!(msg.ends_with("– IRON HOUSE"));
    }

    #[test]
    fn link_strips_phone_and_encodes_text() {
        let link = whatsapp_link("+91 98123-45678", "Hi there\nPlan: A&B");
        assert_eq!(link, "https://wa.me/919812345678?text=Hi%20there%0APlan%3A%20A%26B");
    }

    #[test]
    fn reminder_uses_pricing_table() {
        let pricing = PlanPricing::new(999.0, 2500.0, 9000.0);
        let r = build_reminder(&template(), &pricing, 4, "Asha", "9000000001", "Monthly");
        assert_eq!(r.amount, 999.0);
        assert!(r.link.starts_with("https://wa.me/9000000001?text="));
        assert!(r.message.contains("Amount: ₹999"));
    }
}
