// Application layer - Use cases and the data access seam
pub mod dashboard_service;
pub mod error;
pub mod hierarchy_service;
pub mod telemetry_repository;

#[cfg(test)]
pub(crate) mod fake_repository;
