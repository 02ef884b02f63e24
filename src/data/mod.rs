pub mod expired;
pub mod racing_api;
pub mod types;
