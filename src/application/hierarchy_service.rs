// Hierarchy service - Use cases for browsing companies, farms, flocks and devices
use crate::application::error::ServiceError;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::access::{accessible_farms, ensure_farm_visible};
use crate::domain::calendar::Calendar;
use crate::domain::date_range::{DateRange, FlockBounds, QuickRange};
use crate::domain::error::{CoreError, SelectionError, SelectionLevel};
use crate::domain::hierarchy::{Company, Device, EntityId, Farm, Flock, User};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct HierarchyService {
    repository: Arc<dyn TelemetryRepository>,
    calendar: Calendar,
}

impl HierarchyService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, calendar: Calendar) -> Self {
        Self {
            repository,
            calendar,
        }
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.repository.list_companies().await?)
    }

    /// Farms of a company the user may see; `AccessDenied` if filtering left none.
    pub async fn accessible_farms(
        &self,
        company_id: EntityId,
        user: &User,
    ) -> Result<Vec<Farm>, ServiceError> {
        let farms = self.repository.list_farms(company_id).await?;
        let visible = accessible_farms(&farms, user)?;
        tracing::debug!(
            "Company {}: {} of {} farms visible to user {} ({})",
            company_id,
            visible.len(),
            farms.len(),
            user.id,
            user.role
        );
        Ok(visible)
    }

    /// The farm, if the user's role covers it; `AccessDenied` otherwise.
    pub async fn authorize_farm(&self, farm_id: EntityId, user: &User) -> Result<Farm, ServiceError> {
        let farm = self.repository.get_farm(farm_id).await?;
        ensure_farm_visible(&farm, user)?;
        Ok(farm)
    }

    pub async fn authorize_flock(&self, flock_id: EntityId, user: &User) -> Result<Flock, ServiceError> {
        let flock = self.repository.get_flock(flock_id).await?;
        self.authorize_farm(flock.farm_id, user).await?;
        Ok(flock)
    }

    pub async fn authorize_device(
        &self,
        device_id: EntityId,
        user: &User,
    ) -> Result<Device, ServiceError> {
        let device = self.repository.get_device(device_id).await?;
        self.authorize_farm(device.farm_id, user).await?;
        Ok(device)
    }

    /// Gate a telemetry query on `device_id`, optionally scoped to a flock.
    /// The flock must be one the device serves; its bounds are returned.
    pub async fn authorize_query(
        &self,
        device_id: EntityId,
        flock_id: Option<EntityId>,
        user: &User,
    ) -> Result<Option<FlockBounds>, ServiceError> {
        let device = self.authorize_device(device_id, user).await?;
        let Some(flock_id) = flock_id else {
            return Ok(None);
        };

        let flock = self.repository.get_flock(flock_id).await?;
        if flock.farm_id != device.farm_id || !device.serves_flock(flock.id) {
            return Err(CoreError::from(SelectionError::UnknownOption {
                level: SelectionLevel::Flock,
                id: flock_id,
            })
            .into());
        }
        Ok(Some(self.bounds_of(flock_id).await?))
    }

    pub async fn list_flocks(&self, farm_id: EntityId, user: &User) -> Result<Vec<Flock>, ServiceError> {
        self.authorize_farm(farm_id, user).await?;
        Ok(self.repository.list_flocks(farm_id).await?)
    }

    pub async fn list_devices(
        &self,
        farm_id: EntityId,
        user: &User,
    ) -> Result<Vec<Device>, ServiceError> {
        self.authorize_farm(farm_id, user).await?;
        Ok(self.repository.list_devices(farm_id).await?)
    }

    pub async fn flock_bounds(
        &self,
        flock_id: EntityId,
        user: &User,
    ) -> Result<FlockBounds, ServiceError> {
        self.authorize_flock(flock_id, user).await?;
        self.bounds_of(flock_id).await
    }

    pub async fn quick_range(
        &self,
        flock_id: EntityId,
        user: &User,
        preset: QuickRange,
        today: NaiveDate,
    ) -> Result<DateRange, ServiceError> {
        let bounds = self.flock_bounds(flock_id, user).await?;
        Ok(preset.resolve(Some(&bounds), today)?)
    }

    async fn bounds_of(&self, flock_id: EntityId) -> Result<FlockBounds, ServiceError> {
        let raw = self.repository.get_flock_bounds(flock_id).await?;
        Ok(FlockBounds::from_raw(&raw, &self.calendar)?)
    }
}
