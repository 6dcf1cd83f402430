//! Domain services between the HTTP handlers and the store.

pub mod activity_log;
pub mod aggregation;
pub mod mutations;
pub mod visibility;
