// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::hierarchy_service::HierarchyService;
use crate::domain::calendar::Calendar;

#[derive(Clone)]
pub struct AppState {
    pub hierarchy_service: HierarchyService,
    pub dashboard_service: DashboardService,
    pub calendar: Calendar,
    pub default_range_days: u32,
    pub max_range_days: u32,
}
