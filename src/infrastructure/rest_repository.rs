// REST repository implementation over the farm-monitoring API
use crate::application::telemetry_repository::{FetchError, TelemetryRepository};
use crate::domain::date_range::{DateRange, RawFlockBounds};
use crate::domain::hierarchy::{Company, Device, EntityId, Farm, Flock};
use crate::domain::measurement::{DailyAggregate, Metric, RawMeasurement};
use crate::infrastructure::config::{prepare_path, ApiSettings, EndpointTemplates};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestRepository {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    endpoints: EndpointTemplates,
}

/// What a request is about, for not-found errors.
struct Target {
    entity: &'static str,
    id: String,
}

impl Target {
    fn new(entity: &'static str, id: impl ToString) -> Self {
        Self {
            entity,
            id: id.to_string(),
        }
    }
}

impl RestRepository {
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            endpoints: settings.endpoints.clone(),
        })
    }

    fn build_url(&self, template: &str, vars: &[(&str, String)], query: &[(&str, String)]) -> String {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let mut url = format!("{}{}", self.base_url, prepare_path(template, &vars));

        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, target: Target) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upstream {} returned {}", url, status);
            return Err(map_status(status, body, target));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn map_status(status: StatusCode, body: String, target: Target) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized,
        StatusCode::NOT_FOUND => FetchError::NotFound {
            entity: target.entity,
            id: target.id,
        },
        _ => FetchError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl TelemetryRepository for RestRepository {
    async fn list_companies(&self) -> Result<Vec<Company>, FetchError> {
        let url = self.build_url(&self.endpoints.companies, &[], &[]);
        self.get_json(&url, Target::new("companies", "")).await
    }

    async fn list_farms(&self, company_id: EntityId) -> Result<Vec<Farm>, FetchError> {
        let url = self.build_url(&self.endpoints.farms, &[("company", company_id.to_string())], &[]);
        self.get_json(&url, Target::new("company", company_id)).await
    }

    async fn get_farm(&self, farm_id: EntityId) -> Result<Farm, FetchError> {
        let url = self.build_url(&self.endpoints.farm, &[("farm", farm_id.to_string())], &[]);
        self.get_json(&url, Target::new("farm", farm_id)).await
    }

    async fn list_flocks(&self, farm_id: EntityId) -> Result<Vec<Flock>, FetchError> {
        let url = self.build_url(&self.endpoints.flocks, &[("farm", farm_id.to_string())], &[]);
        self.get_json(&url, Target::new("farm", farm_id)).await
    }

    async fn get_flock(&self, flock_id: EntityId) -> Result<Flock, FetchError> {
        let url = self.build_url(&self.endpoints.flock, &[("flock", flock_id.to_string())], &[]);
        self.get_json(&url, Target::new("flock", flock_id)).await
    }

    async fn get_flock_bounds(&self, flock_id: EntityId) -> Result<RawFlockBounds, FetchError> {
        let url = self.build_url(
            &self.endpoints.flock_bounds,
            &[("flock", flock_id.to_string())],
            &[],
        );
        self.get_json(&url, Target::new("flock", flock_id)).await
    }

    async fn list_devices(&self, farm_id: EntityId) -> Result<Vec<Device>, FetchError> {
        let url = self.build_url(&self.endpoints.devices, &[("farm", farm_id.to_string())], &[]);
        self.get_json(&url, Target::new("farm", farm_id)).await
    }

    async fn get_device(&self, device_id: EntityId) -> Result<Device, FetchError> {
        let url = self.build_url(&self.endpoints.device, &[("device", device_id.to_string())], &[]);
        self.get_json(&url, Target::new("device", device_id)).await
    }

    async fn query_measurements(
        &self,
        device_id: EntityId,
        metric: Metric,
        range: &DateRange,
    ) -> Result<Vec<RawMeasurement>, FetchError> {
        let url = self.build_url(
            &self.endpoints.measurements,
            &[
                ("device", device_id.to_string()),
                ("metric", metric.as_str().to_string()),
            ],
            &range.query_params(),
        );
        let rows: Vec<RawMeasurement> = self.get_json(&url, Target::new("device", device_id)).await?;
        tracing::debug!(
            "Fetched {} {} samples for device {}",
            rows.len(),
            metric.as_str(),
            device_id
        );
        Ok(rows)
    }

    async fn query_daily_aggregates(
        &self,
        device_id: EntityId,
        metric: Metric,
        range: &DateRange,
    ) -> Result<Vec<DailyAggregate>, FetchError> {
        let url = self.build_url(
            &self.endpoints.daily_aggregates,
            &[
                ("device", device_id.to_string()),
                ("metric", metric.as_str().to_string()),
            ],
            &range.query_params(),
        );
        self.get_json(&url, Target::new("device", device_id)).await
    }
}
