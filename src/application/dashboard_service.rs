// Dashboard service - Use cases for building activity, light and climate views
use crate::application::error::ServiceError;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::calendar::Calendar;
use crate::domain::date_range::DateRange;
use crate::domain::deviation::{analyze_all, DeviationReport};
use crate::domain::heatmap::{aggregate, HeatmapGrid, HeatmapMode};
use crate::domain::hierarchy::EntityId;
use crate::domain::measurement::{decode_measurements, ClimateMetric, Metric};
use crate::domain::segmenter::{default_gap_threshold, segment, Run, StateClassifier};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub gap_threshold: Duration,
    pub lux_threshold: f64,
    pub calendar: Calendar,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            gap_threshold: default_gap_threshold(),
            lux_threshold: 10.0,
            calendar: Calendar::utc(),
        }
    }
}

/// Timeline plus heatmap for one binary-state metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub device_id: EntityId,
    pub metric: Metric,
    pub range: DateRange,
    pub runs: Vec<Run>,
    pub heatmap: HeatmapGrid,
    pub active_seconds: i64,
    /// Rows dropped before segmentation: bad timestamps plus unreadable values.
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateView {
    pub device_id: EntityId,
    pub metric: ClimateMetric,
    pub range: DateRange,
    #[serde(flatten)]
    pub report: DeviationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClimateOverview {
    pub temperature: ClimateView,
    pub humidity: ClimateView,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn TelemetryRepository>,
    settings: AnalysisSettings,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, settings: AnalysisSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Activity timeline and active-count heatmap.
    pub async fn activity_view(
        &self,
        device_id: EntityId,
        range: DateRange,
    ) -> Result<StateView, ServiceError> {
        self.state_view(
            device_id,
            Metric::Activity,
            range,
            StateClassifier::Activity,
            HeatmapMode::CountActive(StateClassifier::Activity),
        )
        .await
    }

    /// Light on/off timeline and mean-lux heatmap.
    pub async fn light_view(
        &self,
        device_id: EntityId,
        range: DateRange,
    ) -> Result<StateView, ServiceError> {
        let classifier = StateClassifier::Light {
            lux_threshold: self.settings.lux_threshold,
        };
        self.state_view(
            device_id,
            Metric::Light,
            range,
            classifier,
            HeatmapMode::AverageIntensity,
        )
        .await
    }

    pub async fn climate_view(
        &self,
        device_id: EntityId,
        metric: ClimateMetric,
        range: DateRange,
    ) -> Result<ClimateView, ServiceError> {
        let rows = self
            .repository
            .query_daily_aggregates(device_id, metric.into(), &range)
            .await?;
        let report = analyze_all(&rows);

        tracing::debug!(
            "Device {} {:?}: {} days analyzed, {} skipped",
            device_id,
            metric,
            report.days.len(),
            report.skipped
        );

        Ok(ClimateView {
            device_id,
            metric,
            range,
            report,
        })
    }

    /// Temperature and humidity fetched concurrently.
    pub async fn climate_overview(
        &self,
        device_id: EntityId,
        range: DateRange,
    ) -> Result<ClimateOverview, ServiceError> {
        let (temperature, humidity) = futures::try_join!(
            self.climate_view(device_id, ClimateMetric::Temperature, range),
            self.climate_view(device_id, ClimateMetric::Humidity, range),
        )?;
        Ok(ClimateOverview {
            temperature,
            humidity,
        })
    }

    async fn state_view(
        &self,
        device_id: EntityId,
        metric: Metric,
        range: DateRange,
        classifier: StateClassifier,
        mode: HeatmapMode,
    ) -> Result<StateView, ServiceError> {
        let rows = self
            .repository
            .query_measurements(device_id, metric, &range)
            .await?;
        let batch = decode_measurements(rows);

        let segmentation = segment(
            &batch.points,
            |value| classifier.classify(value),
            self.settings.gap_threshold,
        );
        let heatmap = aggregate(&batch.points, &range, mode, &self.settings.calendar);
        let skipped = batch.skipped + segmentation.skipped;

        if skipped > 0 {
            tracing::warn!(
                "Device {} {}: skipped {} malformed samples",
                device_id,
                metric.as_str(),
                skipped
            );
        }

        Ok(StateView {
            device_id,
            metric,
            range,
            active_seconds: segmentation.active_time().num_seconds(),
            runs: segmentation.runs,
            heatmap,
            skipped,
        })
    }
}
