// In-memory repository for service tests
use crate::application::telemetry_repository::{FetchError, TelemetryRepository};
use crate::domain::date_range::{DateRange, RawFlockBounds};
use crate::domain::hierarchy::{Company, Device, EntityId, Farm, Flock};
use crate::domain::measurement::{DailyAggregate, Metric, RawMeasurement};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeRepository {
    pub companies: Vec<Company>,
    pub farms: HashMap<EntityId, Vec<Farm>>,
    pub flocks: HashMap<EntityId, Vec<Flock>>,
    pub bounds: HashMap<EntityId, RawFlockBounds>,
    pub devices: HashMap<EntityId, Vec<Device>>,
    pub measurements: HashMap<(EntityId, Metric), Vec<RawMeasurement>>,
    pub aggregates: HashMap<(EntityId, Metric), Vec<DailyAggregate>>,
}

fn not_found(entity: &'static str, id: EntityId) -> FetchError {
    FetchError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl TelemetryRepository for FakeRepository {
    async fn list_companies(&self) -> Result<Vec<Company>, FetchError> {
        Ok(self.companies.clone())
    }

    async fn list_farms(&self, company_id: EntityId) -> Result<Vec<Farm>, FetchError> {
        self.farms
            .get(&company_id)
            .cloned()
            .ok_or_else(|| not_found("company", company_id))
    }

    async fn get_farm(&self, farm_id: EntityId) -> Result<Farm, FetchError> {
        self.farms
            .values()
            .flatten()
            .find(|farm| farm.id == farm_id)
            .cloned()
            .ok_or_else(|| not_found("farm", farm_id))
    }

    async fn list_flocks(&self, farm_id: EntityId) -> Result<Vec<Flock>, FetchError> {
        self.flocks
            .get(&farm_id)
            .cloned()
            .ok_or_else(|| not_found("farm", farm_id))
    }

    async fn get_flock(&self, flock_id: EntityId) -> Result<Flock, FetchError> {
        self.flocks
            .values()
            .flatten()
            .find(|flock| flock.id == flock_id)
            .cloned()
            .ok_or_else(|| not_found("flock", flock_id))
    }

    async fn get_flock_bounds(&self, flock_id: EntityId) -> Result<RawFlockBounds, FetchError> {
        self.bounds
            .get(&flock_id)
            .cloned()
            .ok_or_else(|| not_found("flock", flock_id))
    }

    async fn list_devices(&self, farm_id: EntityId) -> Result<Vec<Device>, FetchError> {
        self.devices
            .get(&farm_id)
            .cloned()
            .ok_or_else(|| not_found("farm", farm_id))
    }

    async fn get_device(&self, device_id: EntityId) -> Result<Device, FetchError> {
        self.devices
            .values()
            .flatten()
            .find(|device| device.id == device_id)
            .cloned()
            .ok_or_else(|| not_found("device", device_id))
    }

    async fn query_measurements(
        &self,
        device_id: EntityId,
        metric: Metric,
        _range: &DateRange,
    ) -> Result<Vec<RawMeasurement>, FetchError> {
        self.measurements
            .get(&(device_id, metric))
            .cloned()
            .ok_or_else(|| not_found("device", device_id))
    }

    async fn query_daily_aggregates(
        &self,
        device_id: EntityId,
        metric: Metric,
        _range: &DateRange,
    ) -> Result<Vec<DailyAggregate>, FetchError> {
        self.aggregates
            .get(&(device_id, metric))
            .cloned()
            .ok_or_else(|| not_found("device", device_id))
    }
}
