pub mod attendance;
pub mod member;
pub mod membership;
pub mod payment;
pub mod role;
