// Daily deviation against the reference curve
use chrono::NaiveDate;
use serde::Serialize;

use super::error::CoreError;
use super::measurement::DailyAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationResult {
    pub deviation: f64,
    pub deviation_pct: f64,
    pub precision: f64,
    pub in_range: bool,
}

/// Compare one day against its reference value and tolerance band.
///
/// A zero reference yields `deviation_pct = 0` (and so `precision = 100`)
/// instead of an infinite percentage.
pub fn analyze(row: &DailyAggregate) -> Result<DeviationResult, CoreError> {
    if !row.reference.is_finite() {
        return Err(CoreError::MalformedInput(format!(
            "non-finite reference on {}",
            row.date
        )));
    }
    if !row.measured_mean.is_finite() {
        return Err(CoreError::MalformedInput(format!(
            "non-finite mean on {}",
            row.date
        )));
    }

    let deviation = row.measured_mean - row.reference;
    let deviation_pct = if row.reference == 0.0 {
        0.0
    } else {
        deviation / row.reference * 100.0
    };

    Ok(DeviationResult {
        deviation,
        deviation_pct,
        precision: 100.0 - deviation_pct.abs(),
        in_range: row.lower_limit <= row.measured_mean && row.measured_mean <= row.upper_limit,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDeviation {
    pub date: NaiveDate,
    pub age_days: Option<u32>,
    pub measured_mean: f64,
    pub measured_min: f64,
    pub measured_max: f64,
    pub reference: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    #[serde(flatten)]
    pub result: DeviationResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationSummary {
    pub days: usize,
    pub days_in_range: usize,
    pub in_range_pct: f64,
    pub mean_precision: f64,
    pub mean_abs_deviation: f64,
}

impl DeviationSummary {
    pub fn from_days(days: &[DailyDeviation]) -> Self {
        if days.is_empty() {
            return Self::default();
        }

        let count = days.len() as f64;
        let days_in_range = days.iter().filter(|d| d.result.in_range).count();
        Self {
            days: days.len(),
            days_in_range,
            in_range_pct: days_in_range as f64 / count * 100.0,
            mean_precision: days.iter().map(|d| d.result.precision).sum::<f64>() / count,
            mean_abs_deviation: days.iter().map(|d| d.result.deviation.abs()).sum::<f64>() / count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationReport {
    pub days: Vec<DailyDeviation>,
    pub summary: DeviationSummary,
    pub skipped: usize,
}

/// Analyze every row in date order; malformed rows are skipped and counted.
pub fn analyze_all(rows: &[DailyAggregate]) -> DeviationReport {
    let mut skipped = 0;
    let mut days: Vec<DailyDeviation> = rows
        .iter()
        .filter_map(|row| match analyze(row) {
            Ok(result) => Some(DailyDeviation {
                date: row.date,
                age_days: row.age_days,
                measured_mean: row.measured_mean,
                measured_min: row.measured_min,
                measured_max: row.measured_max,
                reference: row.reference,
                lower_limit: row.lower_limit,
                upper_limit: row.upper_limit,
                result,
            }),
            Err(e) => {
                tracing::debug!("Skipping daily aggregate: {}", e);
                skipped += 1;
                None
            }
        })
        .collect();
    days.sort_by_key(|d| d.date);

    let summary = DeviationSummary::from_days(&days);
    DeviationReport {
        days,
        summary,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn row(d: u32, mean: f64, reference: f64, lower: f64, upper: f64) -> DailyAggregate {
        DailyAggregate {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            age_days: Some(d),
            measured_mean: mean,
            measured_min: mean - 2.0,
            measured_max: mean + 2.0,
            reference,
            lower_limit: lower,
            upper_limit: upper,
        }
    }

    #[test]
    fn test_deviation_above_reference() {
        let result = analyze(&row(1, 24.0, 20.0, 18.0, 22.0)).unwrap();
        assert!((result.deviation - 4.0).abs() < EPSILON);
        assert!((result.deviation_pct - 20.0).abs() < EPSILON);
        assert!((result.precision - 80.0).abs() < EPSILON);
        assert!(!result.in_range);
    }

    #[test]
    fn test_deviation_below_reference() {
        let result = analyze(&row(1, 19.0, 20.0, 18.0, 22.0)).unwrap();
        assert!((result.deviation + 1.0).abs() < EPSILON);
        assert!((result.deviation_pct + 5.0).abs() < EPSILON);
        assert!((result.precision - 95.0).abs() < EPSILON);
        assert!(result.in_range);
    }

    #[test]
    fn test_in_range_includes_limits() {
        assert!(analyze(&row(1, 18.0, 20.0, 18.0, 22.0)).unwrap().in_range);
        assert!(analyze(&row(1, 22.0, 20.0, 18.0, 22.0)).unwrap().in_range);
        assert!(!analyze(&row(1, 22.01, 20.0, 18.0, 22.0)).unwrap().in_range);
    }

    #[test]
    fn test_zero_reference_falls_back() {
        let result = analyze(&row(1, 3.0, 0.0, -1.0, 1.0)).unwrap();
        assert_eq!(result.deviation, 3.0);
        assert_eq!(result.deviation_pct, 0.0);
        assert_eq!(result.precision, 100.0);
        assert!(!result.in_range);
    }

    #[test]
    fn test_non_finite_inputs_are_malformed() {
        assert!(matches!(
            analyze(&row(1, 20.0, f64::NAN, 18.0, 22.0)),
            Err(CoreError::MalformedInput(_))
        ));
        assert!(matches!(
            analyze(&row(1, f64::INFINITY, 20.0, 18.0, 22.0)),
            Err(CoreError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_analyze_all_sorts_skips_and_summarizes() {
        let rows = vec![
            row(3, 24.0, 20.0, 18.0, 22.0),
            row(1, 20.0, 20.0, 18.0, 22.0),
            row(2, 20.0, f64::NAN, 18.0, 22.0),
        ];

        let report = analyze_all(&rows);

        assert_eq!(report.skipped, 1);
        let dates: Vec<u32> = report.days.iter().map(|d| d.age_days.unwrap()).collect();
        assert_eq!(dates, vec![1, 3]);
        assert_eq!(report.summary.days, 2);
        assert_eq!(report.summary.days_in_range, 1);
        assert!((report.summary.in_range_pct - 50.0).abs() < EPSILON);
        assert!((report.summary.mean_precision - 90.0).abs() < EPSILON);
        assert!((report.summary.mean_abs_deviation - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let report = analyze_all(&[]);
        assert!(report.days.is_empty());
        assert_eq!(report.summary, DeviationSummary::default());
    }

    #[test]
    fn test_daily_deviation_serializes_flat() {
        let report = analyze_all(&[row(1, 24.0, 20.0, 18.0, 22.0)]);
        let json = serde_json::to_value(&report.days[0]).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["inRange"], false);
        assert!(json.get("result").is_none());
    }
}
