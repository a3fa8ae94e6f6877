// Repository trait for farm hierarchy and telemetry data access
use crate::domain::date_range::{DateRange, RawFlockBounds};
use crate::domain::hierarchy::{Company, Device, EntityId, Farm, Flock};
use crate::domain::measurement::{DailyAggregate, Metric, RawMeasurement};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>, FetchError>;

    /// All farms of a company, before any role filtering.
    async fn list_farms(&self, company_id: EntityId) -> Result<Vec<Farm>, FetchError>;

    async fn get_farm(&self, farm_id: EntityId) -> Result<Farm, FetchError>;

    async fn list_flocks(&self, farm_id: EntityId) -> Result<Vec<Flock>, FetchError>;

    async fn get_flock(&self, flock_id: EntityId) -> Result<Flock, FetchError>;

    async fn get_flock_bounds(&self, flock_id: EntityId) -> Result<RawFlockBounds, FetchError>;

    async fn list_devices(&self, farm_id: EntityId) -> Result<Vec<Device>, FetchError>;

    async fn get_device(&self, device_id: EntityId) -> Result<Device, FetchError>;

    /// Raw samples of one metric for a device, in no particular order.
    async fn query_measurements(
        &self,
        device_id: EntityId,
        metric: Metric,
        range: &DateRange,
    ) -> Result<Vec<RawMeasurement>, FetchError>;

    /// Daily rollups with the reference curve already attached.
    async fn query_daily_aggregates(
        &self,
        device_id: EntityId,
        metric: Metric,
        range: &DateRange,
    ) -> Result<Vec<DailyAggregate>, FetchError>;
}
