//! HTTP request handlers.

pub mod health;

pub use health::{ServiceInfo, health_check, service_info};
