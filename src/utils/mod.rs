pub mod calendar;
pub mod query_spec;
pub mod receipt;
