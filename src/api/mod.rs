pub mod attendance;
pub mod dashboard;
pub mod members;
pub mod memberships;
pub mod payments;
pub mod reminders;
pub mod revenue;
