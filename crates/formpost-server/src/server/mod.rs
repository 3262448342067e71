pub mod config;
pub mod notify;
pub mod service;
pub mod store;
pub mod telemetry;
