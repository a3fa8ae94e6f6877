use crate::application::dashboard_service::AnalysisSettings;
use crate::domain::calendar::Calendar;
use crate::domain::segmenter::DEFAULT_GAP_THRESHOLD_SECS;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoints: EndpointTemplates,
}

/// Upstream paths; `${name}` placeholders are filled per request.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointTemplates {
    pub companies: String,
    pub farms: String,
    pub farm: String,
    pub flocks: String,
    pub flock: String,
    pub flock_bounds: String,
    pub devices: String,
    pub device: String,
    pub measurements: String,
    pub daily_aggregates: String,
}

impl Default for EndpointTemplates {
    fn default() -> Self {
        Self {
            companies: "/companies".to_string(),
            farms: "/companies/${company}/farms".to_string(),
            farm: "/farms/${farm}".to_string(),
            flocks: "/farms/${farm}/flocks".to_string(),
            flock: "/flocks/${flock}".to_string(),
            flock_bounds: "/flocks/${flock}/bounds".to_string(),
            devices: "/farms/${farm}/devices".to_string(),
            device: "/devices/${device}".to_string(),
            measurements: "/devices/${device}/${metric}".to_string(),
            daily_aggregates: "/devices/${device}/${metric}/daily".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub gap_threshold_secs: i64,
    pub lux_threshold: f64,
    /// Offset of the calendar used for day/hour bucketing and "today".
    pub utc_offset_minutes: i32,
    pub default_range_days: u32,
    /// Longest range, in days, a telemetry query may span.
    pub max_range_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            gap_threshold_secs: DEFAULT_GAP_THRESHOLD_SECS,
            lux_threshold: 10.0,
            utc_offset_minutes: 0,
            default_range_days: 7,
            max_range_days: 366,
        }
    }
}

impl AnalysisConfig {
    pub fn calendar(&self) -> anyhow::Result<Calendar> {
        Calendar::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            anyhow::anyhow!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
        })
    }

    pub fn to_settings(&self) -> anyhow::Result<AnalysisSettings> {
        if self.gap_threshold_secs <= 0 {
            anyhow::bail!("gap_threshold_secs must be positive, got {}", self.gap_threshold_secs);
        }
        if !self.lux_threshold.is_finite() {
            anyhow::bail!("lux_threshold must be finite");
        }
        if self.default_range_days >= self.max_range_days {
            anyhow::bail!(
                "default_range_days ({}) must be below max_range_days ({})",
                self.default_range_days,
                self.max_range_days
            );
        }

        Ok(AnalysisSettings {
            gap_threshold: chrono::Duration::seconds(self.gap_threshold_secs),
            lux_threshold: self.lux_threshold,
            calendar: self.calendar()?,
        })
    }
}

fn default_log_filter() -> String {
    "flock_telemetry=info,tower_http=info".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Optional `config/dashboard.*` file, overridden by `FLOCK_`-prefixed
/// variables such as `FLOCK_API__BASE_URL`.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("FLOCK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace `${name}` placeholders in an endpoint template, URL-encoding values
pub fn prepare_path(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_path() {
        let mut vars = HashMap::new();
        vars.insert("device".to_string(), "42".to_string());
        vars.insert("metric".to_string(), "light".to_string());

        let path = prepare_path("/devices/${device}/${metric}/daily", &vars);
        assert_eq!(path, "/devices/42/light/daily");
    }

    #[test]
    fn test_prepare_path_encodes_values() {
        let mut vars = HashMap::new();
        vars.insert("farm".to_string(), "a/b c".to_string());
        assert_eq!(prepare_path("/farms/${farm}", &vars), "/farms/a%2Fb%20c");
    }

    #[test]
    fn test_config_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[api]\nbase_url = \"http://localhost:3000\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let app: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app.server.bind, "0.0.0.0:8080");
        assert_eq!(app.api.timeout_secs, 10);
        assert_eq!(app.api.token, None);
        assert_eq!(app.api.endpoints.farms, "/companies/${company}/farms");
        assert_eq!(app.analysis.gap_threshold_secs, 300);
        assert_eq!(app.analysis.default_range_days, 7);
        assert_eq!(app.analysis.max_range_days, 366);

        let analysis = app.analysis.to_settings().unwrap();
        assert_eq!(analysis.gap_threshold, chrono::Duration::minutes(5));
        assert_eq!(analysis.calendar, Calendar::utc());
    }

    #[test]
    fn test_config_overrides() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
log_filter = "debug"

[api]
base_url = "https://api.example.org"
token = "secret"

[api.endpoints]
devices = "/granjas/${farm}/dispositivos"

[analysis]
lux_threshold = 25.5
utc_offset_minutes = 60
"#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let app: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app.log_filter, "debug");
        assert_eq!(app.api.token.as_deref(), Some("secret"));
        assert_eq!(app.api.endpoints.devices, "/granjas/${farm}/dispositivos");
        assert_eq!(app.api.endpoints.companies, "/companies");

        let analysis = app.analysis.to_settings().unwrap();
        assert_eq!(analysis.lux_threshold, 25.5);
        assert_eq!(analysis.calendar, Calendar::from_offset_minutes(60).unwrap());
    }

    #[test]
    fn test_invalid_analysis_settings() {
        let analysis = AnalysisConfig {
            gap_threshold_secs: 0,
            ..AnalysisConfig::default()
        };
        assert!(analysis.to_settings().is_err());

        let analysis = AnalysisConfig {
            utc_offset_minutes: 24 * 60,
            ..AnalysisConfig::default()
        };
        assert!(analysis.to_settings().is_err());

        let analysis = AnalysisConfig {
            default_range_days: 30,
            max_range_days: 30,
            ..AnalysisConfig::default()
        };
        assert!(analysis.to_settings().is_err());
    }
}
