// Flock telemetry - transformation core and dashboard backend
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
