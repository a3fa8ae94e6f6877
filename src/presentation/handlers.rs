// HTTP request handlers
use crate::domain::date_range::{check_within, last_n_days, DateRange, QuickRange};
use crate::domain::error::ValidationError;
use crate::domain::hierarchy::{EntityId, User, UserRole};
use crate::domain::measurement::ClimateMetric;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// When present the device must serve this flock and the range must lie
    /// inside its life span.
    pub flock: Option<EntityId>,
    pub metric: Option<ClimateMetric>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuickRangeQuery {
    /// Last N days; without it the range runs from the flock start.
    pub days: Option<u32>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_companies(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let companies = state.hierarchy_service.list_companies().await?;
    Ok(Json(companies).into_response())
}

/// Farms of a company, filtered by the caller's role
pub async fn list_farms(
    Path(company_id): Path<EntityId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = user_from_headers(&headers)?;
    let farms = state
        .hierarchy_service
        .accessible_farms(company_id, &user)
        .await?;
    Ok(Json(farms).into_response())
}

pub async fn list_flocks(
    Path(farm_id): Path<EntityId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = user_from_headers(&headers)?;
    let flocks = state.hierarchy_service.list_flocks(farm_id, &user).await?;
    Ok(Json(flocks).into_response())
}

pub async fn list_devices(
    Path(farm_id): Path<EntityId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = user_from_headers(&headers)?;
    let devices = state.hierarchy_service.list_devices(farm_id, &user).await?;
    Ok(Json(devices).into_response())
}

pub async fn flock_bounds(
    Path(flock_id): Path<EntityId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = user_from_headers(&headers)?;
    let bounds = state.hierarchy_service.flock_bounds(flock_id, &user).await?;
    Ok(Json(bounds).into_response())
}

pub async fn quick_range(
    Path(flock_id): Path<EntityId>,
    Query(query): Query<QuickRangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = user_from_headers(&headers)?;
    let preset = match query.days {
        Some(days) => QuickRange::LastDays(days),
        None => QuickRange::SinceFlockStart,
    };
    let today = state.calendar.today(Utc::now());
    let range = state
        .hierarchy_service
        .quick_range(flock_id, &user, preset, today)
        .await?;
    Ok(Json(range).into_response())
}

pub async fn activity(
    Path(device_id): Path<EntityId>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = resolve_range(&state, device_id, &headers, &query).await?;
    let view = state.dashboard_service.activity_view(device_id, range).await?;
    Ok(Json(view).into_response())
}

pub async fn light(
    Path(device_id): Path<EntityId>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = resolve_range(&state, device_id, &headers, &query).await?;
    let view = state.dashboard_service.light_view(device_id, range).await?;
    Ok(Json(view).into_response())
}

/// One climate metric when `metric` is given, otherwise temperature and humidity
pub async fn climate(
    Path(device_id): Path<EntityId>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = resolve_range(&state, device_id, &headers, &query).await?;
    let response = match query.metric {
        Some(metric) => Json(
            state
                .dashboard_service
                .climate_view(device_id, metric, range)
                .await?,
        )
        .into_response(),
        None => Json(
            state
                .dashboard_service
                .climate_overview(device_id, range)
                .await?,
        )
        .into_response(),
    };
    Ok(response)
}

/// Caller identity as forwarded by the session layer
pub fn user_from_headers(headers: &HeaderMap) -> Result<User, ApiError> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<EntityId>().ok())
        .ok_or(ApiError::MissingIdentity)?;
    let role = headers
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(UserRole::parse)
        .ok_or(ApiError::MissingIdentity)?;

    Ok(User::new(id, role))
}

/// Requested range. A missing `start` lies `default_days` before the end, a
/// missing `end` is today (or `start`, if that is later). Ranges longer than
/// `max_days` are rejected.
pub fn requested_range(
    query: &RangeQuery,
    default_days: u32,
    max_days: u32,
    today: NaiveDate,
) -> Result<DateRange, ValidationError> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => DateRange::new(start, end)?,
        (Some(start), None) => DateRange::new(start, today.max(start))?,
        (None, Some(end)) => last_n_days(default_days, end),
        (None, None) => last_n_days(default_days, today),
    };

    if range.days() > max_days as usize {
        return Err(ValidationError::RangeTooLong { max_days });
    }
    Ok(range)
}

/// Identity, device scope and range for a telemetry request.
async fn resolve_range(
    state: &AppState,
    device_id: EntityId,
    headers: &HeaderMap,
    query: &RangeQuery,
) -> Result<DateRange, ApiError> {
    let user = user_from_headers(headers)?;
    let today = state.calendar.today(Utc::now());
    let range = requested_range(query, state.default_range_days, state.max_range_days, today)?;

    let bounds = state
        .hierarchy_service
        .authorize_query(device_id, query.flock, &user)
        .await?;
    if let Some(bounds) = bounds {
        check_within(&range, &bounds, today)?;
    }

    Ok(range)
}
