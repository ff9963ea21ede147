pub mod revenue;
pub mod status;
