//! HTTP request handlers shared by every service.

pub mod health;

// Re-export common handler utilities
pub use health::{HealthReport, health_check, readiness_check};
