// Domain layer - Farm hierarchy, telemetry model and pure transformations
pub mod access;
pub mod calendar;
pub mod date_range;
pub mod deviation;
pub mod error;
pub mod heatmap;
pub mod hierarchy;
pub mod measurement;
pub mod segmenter;
pub mod selection;
