// Binary-state timeline segmentation
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use super::error::CoreError;
use super::measurement::{MeasurementPoint, RawValue};

pub const DEFAULT_GAP_THRESHOLD_SECS: i64 = 5 * 60;

pub fn default_gap_threshold() -> Duration {
    Duration::seconds(DEFAULT_GAP_THRESHOLD_SECS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryState {
    Inactive,
    Active,
}

impl BinaryState {
    pub fn as_u8(&self) -> u8 {
        match self {
            BinaryState::Inactive => 0,
            BinaryState::Active => 1,
        }
    }

    pub fn is_active(&self) -> bool {
        *self == BinaryState::Active
    }
}

impl From<bool> for BinaryState {
    fn from(active: bool) -> Self {
        if active {
            BinaryState::Active
        } else {
            BinaryState::Inactive
        }
    }
}

// Renderers expect the plain 0/1 value.
impl Serialize for BinaryState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// How a raw reading maps to on/off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateClassifier {
    /// Activity sensors report exactly 1 while animals are moving.
    Activity,
    /// Lights count as on at or above the lux threshold.
    Light { lux_threshold: f64 },
}

impl StateClassifier {
    pub fn classify(&self, value: &RawValue) -> Result<BinaryState, CoreError> {
        let value = value.as_f64()?;
        let active = match self {
            StateClassifier::Activity => value == 1.0,
            StateClassifier::Light { lux_threshold } => value >= *lux_threshold,
        };
        Ok(active.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunPoint {
    pub timestamp: DateTime<Utc>,
    pub state: BinaryState,
}

/// Maximal stretch of equal state with no gap above the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub state: BinaryState,
    pub points: Vec<RunPoint>,
}

impl Run {
    fn open(point: RunPoint) -> Self {
        Self {
            state: point.state,
            points: vec![point],
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn duration(&self) -> Duration {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    fn accepts(&self, point: &RunPoint, gap_threshold: Duration) -> bool {
        match self.points.last() {
            Some(last) => {
                last.state == point.state && point.timestamp - last.timestamp <= gap_threshold
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub runs: Vec<Run>,
    /// Samples dropped because their value could not be classified.
    pub skipped: usize,
}

impl Segmentation {
    /// Time covered by active runs. Single-point runs contribute nothing.
    pub fn active_time(&self) -> Duration {
        self.runs
            .iter()
            .filter(|run| run.state.is_active())
            .fold(Duration::zero(), |total, run| total + run.duration())
    }

    pub fn point_count(&self) -> usize {
        self.runs.iter().map(|run| run.points.len()).sum()
    }
}

/// Split a measurement stream into runs.
///
/// Samples are classified, sorted by timestamp and deduplicated (the first
/// sample at a given instant wins). A new run starts whenever the state flips
/// or consecutive samples are more than `gap_threshold` apart.
pub fn segment<F>(samples: &[MeasurementPoint], classify: F, gap_threshold: Duration) -> Segmentation
where
    F: Fn(&RawValue) -> Result<BinaryState, CoreError>,
{
    let mut skipped = 0;
    let mut points: Vec<RunPoint> = Vec::with_capacity(samples.len());
    for sample in samples {
        match classify(&sample.raw_value) {
            Ok(state) => points.push(RunPoint {
                timestamp: sample.timestamp,
                state,
            }),
            Err(e) => {
                tracing::debug!("Skipping sample at {}: {}", sample.timestamp, e);
                skipped += 1;
            }
        }
    }

    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);

    let mut runs: Vec<Run> = Vec::new();
    for point in points {
        match runs.last_mut() {
            Some(run) if run.accepts(&point, gap_threshold) => run.points.push(point),
            _ => runs.push(Run::open(point)),
        }
    }

    Segmentation { runs, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap()
    }

    fn sample(hour: u32, minute: u32, value: f64) -> MeasurementPoint {
        MeasurementPoint::new(at(hour, minute), value)
    }

    fn activity(samples: &[MeasurementPoint]) -> Segmentation {
        segment(
            samples,
            |v| StateClassifier::Activity.classify(v),
            default_gap_threshold(),
        )
    }

    fn timestamps(run: &Run) -> Vec<DateTime<Utc>> {
        run.points.iter().map(|p| p.timestamp).collect()
    }

    #[test]
    fn test_gap_breaks_run_with_same_state() {
        let result = activity(&[sample(10, 0, 1.0), sample(10, 3, 1.0), sample(10, 10, 1.0)]);

        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.runs[0].state, BinaryState::Active);
        assert_eq!(timestamps(&result.runs[0]), vec![at(10, 0), at(10, 3)]);
        assert_eq!(result.runs[1].state, BinaryState::Active);
        assert_eq!(timestamps(&result.runs[1]), vec![at(10, 10)]);
    }

    #[test]
    fn test_state_change_breaks_run() {
        let result = activity(&[sample(10, 0, 0.0), sample(10, 1, 1.0)]);

        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.runs[0].state, BinaryState::Inactive);
        assert_eq!(result.runs[0].points.len(), 1);
        assert_eq!(result.runs[1].state, BinaryState::Active);
        assert_eq!(result.runs[1].points.len(), 1);
    }

    #[test]
    fn test_gap_of_exactly_threshold_continues() {
        let result = activity(&[sample(10, 0, 1.0), sample(10, 5, 1.0)]);
        assert_eq!(result.runs.len(), 1);
    }

    #[test]
    fn test_edge_cases() {
        assert!(activity(&[]).runs.is_empty());

        let single = activity(&[sample(10, 0, 1.0)]);
        assert_eq!(single.runs.len(), 1);
        assert_eq!(single.runs[0].points.len(), 1);

        let steady = activity(&[
            sample(10, 0, 0.0),
            sample(10, 4, 0.0),
            sample(10, 8, 0.0),
            sample(10, 12, 0.0),
        ]);
        assert_eq!(steady.runs.len(), 1);
        assert_eq!(steady.runs[0].points.len(), 4);
    }

    #[test]
    fn test_unsorted_input_is_sorted_and_deduplicated() {
        let result = activity(&[
            sample(10, 4, 1.0),
            sample(10, 0, 1.0),
            sample(10, 2, 1.0),
            sample(10, 2, 0.0),
        ]);

        assert_eq!(result.runs.len(), 1);
        assert_eq!(
            timestamps(&result.runs[0]),
            vec![at(10, 0), at(10, 2), at(10, 4)]
        );
    }

    #[test]
    fn test_runs_cover_input_and_respect_breaks() {
        let samples: Vec<MeasurementPoint> = [
            (9, 0, 1.0),
            (9, 1, 1.0),
            (9, 20, 1.0),
            (9, 22, 0.0),
            (9, 24, 0.0),
            (9, 50, 0.0),
            (9, 51, 1.0),
            (11, 0, 1.0),
        ]
        .iter()
        .rev()
        .map(|(h, m, v)| sample(*h, *m, *v))
        .collect();

        let result = activity(&samples);

        let mut flattened = Vec::new();
        for run in &result.runs {
            for pair in run.points.windows(2) {
                assert_eq!(pair[0].state, pair[1].state);
                assert!(pair[1].timestamp - pair[0].timestamp <= default_gap_threshold());
            }
            assert!(run.points.iter().all(|p| p.state == run.state));
            flattened.extend(run.points.iter().map(|p| p.timestamp));
        }

        let mut expected: Vec<DateTime<Utc>> = samples.iter().map(|s| s.timestamp).collect();
        expected.sort();
        assert_eq!(flattened, expected);
        assert_eq!(result.point_count(), samples.len());
    }

    #[test]
    fn test_light_threshold_and_skipped_samples() {
        let classifier = StateClassifier::Light { lux_threshold: 10.0 };
        let samples = vec![
            MeasurementPoint::new(at(6, 0), 2.0),
            MeasurementPoint::new(at(6, 1), 10.0),
            MeasurementPoint::new(at(6, 2), RawValue::Text("dark".to_string())),
            MeasurementPoint::new(at(6, 3), RawValue::Text("45.5".to_string())),
        ];

        let result = segment(&samples, |v| classifier.classify(v), default_gap_threshold());

        assert_eq!(result.skipped, 1);
        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.runs[0].state, BinaryState::Inactive);
        assert_eq!(result.runs[1].state, BinaryState::Active);
        assert_eq!(timestamps(&result.runs[1]), vec![at(6, 1), at(6, 3)]);
    }

    #[test]
    fn test_all_malformed_yields_empty_segmentation() {
        let samples = vec![MeasurementPoint::new(at(6, 0), RawValue::Text("?".to_string()))];
        let result = activity(&samples);
        assert!(result.runs.is_empty());
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_active_time() {
        let result = activity(&[
            sample(10, 0, 1.0),
            sample(10, 4, 1.0),
            sample(10, 5, 0.0),
            sample(10, 9, 0.0),
            sample(10, 10, 1.0),
            sample(10, 12, 1.0),
        ]);
        assert_eq!(result.active_time(), Duration::minutes(6));
    }

    #[test]
    fn test_state_serializes_as_number() {
        let point = RunPoint {
            timestamp: at(10, 0),
            state: BinaryState::Active,
        };
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["state"], 1);
    }
}
