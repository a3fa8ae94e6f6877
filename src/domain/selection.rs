// Cascading Company -> Farm -> Flock -> Device selection
//
// Transitions clear every dependent level and return the fetch the caller has
// to issue next. Fetch results are delivered back with the token they were
// issued under; results for a superseded selection are dropped.
use serde::Serialize;

use super::access::filter_farms;
use super::date_range::FlockBounds;
use super::error::{SelectionError, SelectionLevel};
use super::hierarchy::{Device, EntityId, Farm, Flock, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionPhase {
    Idle,
    CompanyChosen,
    FarmChosen,
    FlockChosen,
    DeviceChosen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardTab {
    Flock,
    Activity,
    Light,
    Climate,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 4] = [
        DashboardTab::Flock,
        DashboardTab::Activity,
        DashboardTab::Light,
        DashboardTab::Climate,
    ];

    pub fn required_phase(&self) -> SelectionPhase {
        match self {
            DashboardTab::Flock => SelectionPhase::FlockChosen,
            DashboardTab::Activity | DashboardTab::Light | DashboardTab::Climate => {
                SelectionPhase::DeviceChosen
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    FetchFarms { company_id: EntityId, token: SelectionToken },
    FetchFlocks { farm_id: EntityId, token: SelectionToken },
    FetchDevices { farm_id: EntityId, token: SelectionToken },
    FetchFlockBounds { flock_id: EntityId, token: SelectionToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FarmAccess {
    Pending,
    Granted,
    NoAccess,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessScope {
    pub company_id: Option<EntityId>,
    pub farm_id: Option<EntityId>,
    pub flock_id: Option<EntityId>,
    pub device_id: Option<EntityId>,
}

/// Everything a range query needs once a device is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryScope {
    pub company_id: EntityId,
    pub farm_id: EntityId,
    pub flock_id: EntityId,
    pub device_id: EntityId,
    pub bounds: Option<FlockBounds>,
}

#[derive(Debug, Clone)]
pub struct SelectionStateMachine {
    user: User,
    scope: AccessScope,
    farms: Option<Vec<Farm>>,
    farm_access: FarmAccess,
    flocks: Option<Vec<Flock>>,
    devices: Option<Vec<Device>>,
    flock_bounds: Option<FlockBounds>,
    furthest: SelectionPhase,
    next_token: u64,
    company_token: SelectionToken,
    farm_token: SelectionToken,
    flock_token: SelectionToken,
}

impl SelectionStateMachine {
    pub fn new(user: User) -> Self {
        Self {
            user,
            scope: AccessScope::default(),
            farms: None,
            farm_access: FarmAccess::Pending,
            flocks: None,
            devices: None,
            flock_bounds: None,
            furthest: SelectionPhase::Idle,
            next_token: 0,
            company_token: SelectionToken(0),
            farm_token: SelectionToken(0),
            flock_token: SelectionToken(0),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    pub fn phase(&self) -> SelectionPhase {
        match self.scope {
            AccessScope { device_id: Some(_), .. } => SelectionPhase::DeviceChosen,
            AccessScope { flock_id: Some(_), .. } => SelectionPhase::FlockChosen,
            AccessScope { farm_id: Some(_), .. } => SelectionPhase::FarmChosen,
            AccessScope { company_id: Some(_), .. } => SelectionPhase::CompanyChosen,
            _ => SelectionPhase::Idle,
        }
    }

    pub fn farm_access(&self) -> FarmAccess {
        self.farm_access
    }

    pub fn farm_options(&self) -> &[Farm] {
        self.farms.as_deref().unwrap_or_default()
    }

    pub fn flock_options(&self) -> &[Flock] {
        self.flocks.as_deref().unwrap_or_default()
    }

    /// Devices of the farm usable by the chosen flock.
    pub fn device_options(&self) -> Vec<&Device> {
        let (Some(devices), Some(flock_id)) = (self.devices.as_ref(), self.scope.flock_id) else {
            return Vec::new();
        };
        devices.iter().filter(|d| d.serves_flock(flock_id)).collect()
    }

    pub fn flock_bounds(&self) -> Option<&FlockBounds> {
        self.flock_bounds.as_ref()
    }

    pub fn is_unlocked(&self, level: SelectionLevel) -> bool {
        match level {
            SelectionLevel::Company => true,
            SelectionLevel::Farm => {
                self.scope.company_id.is_some()
                    && self.farms.is_some()
                    && self.farm_access == FarmAccess::Granted
            }
            SelectionLevel::Flock => self.scope.farm_id.is_some() && self.flocks.is_some(),
            SelectionLevel::Device => self.scope.flock_id.is_some() && self.devices.is_some(),
        }
    }

    pub fn select_company(&mut self, company_id: EntityId) -> SelectionEffect {
        let token = self.issue_token();
        self.company_token = token;
        self.farm_token = token;
        self.flock_token = token;

        self.scope = AccessScope {
            company_id: Some(company_id),
            ..AccessScope::default()
        };
        self.farms = None;
        self.farm_access = FarmAccess::Pending;
        self.clear_farm_level();
        self.furthest = SelectionPhase::CompanyChosen;

        SelectionEffect::FetchFarms { company_id, token }
    }

    pub fn load_farms(&mut self, token: SelectionToken, farms: Vec<Farm>) -> Delivery {
        if token != self.company_token || self.scope.company_id.is_none() {
            return Delivery::Stale;
        }

        let visible = filter_farms(&farms, &self.user);
        self.farm_access = if visible.is_empty() && !farms.is_empty() {
            tracing::debug!(user_id = self.user.id, "No accessible farms for company");
            FarmAccess::NoAccess
        } else {
            FarmAccess::Granted
        };
        self.farms = Some(visible);
        Delivery::Applied
    }

    /// With no accessible farms this is a no-op that yields no effects; the
    /// caller reads [`FarmAccess::NoAccess`] from [`Self::farm_access`].
    pub fn select_farm(&mut self, farm_id: EntityId) -> Result<Vec<SelectionEffect>, SelectionError> {
        if self.farm_access == FarmAccess::NoAccess {
            return Ok(Vec::new());
        }
        if !self.is_unlocked(SelectionLevel::Farm) {
            return Err(SelectionError::Locked(SelectionLevel::Farm));
        }
        if !self.farm_options().iter().any(|f| f.id == farm_id) {
            return Err(SelectionError::UnknownOption {
                level: SelectionLevel::Farm,
                id: farm_id,
            });
        }

        let token = self.issue_token();
        self.farm_token = token;
        self.flock_token = token;

        self.scope.farm_id = Some(farm_id);
        self.clear_farm_level();
        self.furthest = SelectionPhase::FarmChosen;

        Ok(vec![
            SelectionEffect::FetchFlocks { farm_id, token },
            SelectionEffect::FetchDevices { farm_id, token },
        ])
    }

    pub fn load_flocks(&mut self, token: SelectionToken, flocks: Vec<Flock>) -> Delivery {
        if token != self.farm_token || self.scope.farm_id.is_none() {
            return Delivery::Stale;
        }
        self.flocks = Some(flocks);
        Delivery::Applied
    }

    pub fn load_devices(&mut self, token: SelectionToken, devices: Vec<Device>) -> Delivery {
        if token != self.farm_token || self.scope.farm_id.is_none() {
            return Delivery::Stale;
        }
        self.devices = Some(devices);
        Delivery::Applied
    }

    pub fn select_flock(&mut self, flock_id: EntityId) -> Result<SelectionEffect, SelectionError> {
        if !self.is_unlocked(SelectionLevel::Flock) {
            return Err(SelectionError::Locked(SelectionLevel::Flock));
        }
        if !self.flock_options().iter().any(|f| f.id == flock_id) {
            return Err(SelectionError::UnknownOption {
                level: SelectionLevel::Flock,
                id: flock_id,
            });
        }

        let token = self.issue_token();
        self.flock_token = token;

        self.scope.flock_id = Some(flock_id);
        self.scope.device_id = None;
        self.flock_bounds = None;
        self.furthest = SelectionPhase::FlockChosen;

        Ok(SelectionEffect::FetchFlockBounds { flock_id, token })
    }

    pub fn accept_flock_bounds(&mut self, token: SelectionToken, bounds: FlockBounds) -> Delivery {
        if token != self.flock_token || self.scope.flock_id.is_none() {
            return Delivery::Stale;
        }
        self.flock_bounds = Some(bounds);
        Delivery::Applied
    }

    pub fn select_device(&mut self, device_id: EntityId) -> Result<(), SelectionError> {
        if !self.is_unlocked(SelectionLevel::Device) {
            return Err(SelectionError::Locked(SelectionLevel::Device));
        }
        if !self.device_options().iter().any(|d| d.id == device_id) {
            return Err(SelectionError::UnknownOption {
                level: SelectionLevel::Device,
                id: device_id,
            });
        }

        self.scope.device_id = Some(device_id);
        self.furthest = self.furthest.max(SelectionPhase::DeviceChosen);
        Ok(())
    }

    /// A tab stays enabled once its phase has been reached for the current flock.
    pub fn is_tab_enabled(&self, tab: DashboardTab) -> bool {
        self.scope.flock_id.is_some() && self.furthest >= tab.required_phase()
    }

    pub fn enabled_tabs(&self) -> Vec<DashboardTab> {
        DashboardTab::ALL
            .into_iter()
            .filter(|tab| self.is_tab_enabled(*tab))
            .collect()
    }

    pub fn query_scope(&self) -> Option<QueryScope> {
        let AccessScope {
            company_id: Some(company_id),
            farm_id: Some(farm_id),
            flock_id: Some(flock_id),
            device_id: Some(device_id),
        } = self.scope
        else {
            return None;
        };

        Some(QueryScope {
            company_id,
            farm_id,
            flock_id,
            device_id,
            bounds: self.flock_bounds,
        })
    }

    fn issue_token(&mut self) -> SelectionToken {
        self.next_token += 1;
        SelectionToken(self.next_token)
    }

    fn clear_farm_level(&mut self) {
        self.scope.flock_id = None;
        self.scope.device_id = None;
        self.flocks = None;
        self.devices = None;
        self.flock_bounds = None;
    }
}
