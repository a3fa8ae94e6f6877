// Day x hour calendar heatmaps
use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::Calendar;
use super::date_range::DateRange;
use super::measurement::MeasurementPoint;
use super::segmenter::StateClassifier;

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatmapMode {
    /// Number of active samples per cell.
    CountActive(StateClassifier),
    /// Mean raw reading per cell.
    AverageIntensity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub date: NaiveDate,
    pub hours: [f64; HOURS_PER_DAY],
}

/// Dense grid with one row per day of the range; empty cells are zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapGrid {
    pub rows: Vec<HeatmapRow>,
    /// Samples whose value could not be read.
    pub skipped: usize,
    /// Samples falling on a day outside the range.
    pub out_of_range: usize,
}

impl HeatmapGrid {
    pub fn zeroed(range: &DateRange) -> Self {
        let rows = range
            .iter_days()
            .map(|date| HeatmapRow {
                date,
                hours: [0.0; HOURS_PER_DAY],
            })
            .collect();

        Self {
            rows,
            skipped: 0,
            out_of_range: 0,
        }
    }

    pub fn day_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, date: NaiveDate, hour: usize) -> Option<f64> {
        let row = self.rows.iter().find(|row| row.date == date)?;
        row.hours.get(hour).copied()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().flat_map(|row| row.hours.iter()).sum()
    }

    pub fn max_value(&self) -> f64 {
        self.rows
            .iter()
            .flat_map(|row| row.hours.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Bucket samples into the day x hour grid of `range`.
///
/// Day and hour come from `calendar`, the same convention used to build the
/// range, so a sample always lands in the row its calendar day names.
pub fn aggregate(
    samples: &[MeasurementPoint],
    range: &DateRange,
    mode: HeatmapMode,
    calendar: &Calendar,
) -> HeatmapGrid {
    let mut grid = HeatmapGrid::zeroed(range);
    let mut sums = vec![[0.0f64; HOURS_PER_DAY]; grid.day_count()];
    let mut counts = vec![[0u32; HOURS_PER_DAY]; grid.day_count()];

    for sample in samples {
        let date = calendar.date_of(sample.timestamp);
        if !range.contains(date) {
            grid.out_of_range += 1;
            continue;
        }
        let day = (date - range.start()).num_days() as usize;
        let hour = calendar.hour_of(sample.timestamp) as usize;

        match mode {
            HeatmapMode::CountActive(classifier) => match classifier.classify(&sample.raw_value) {
                Ok(state) if state.is_active() => counts[day][hour] += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Skipping heatmap sample at {}: {}", sample.timestamp, e);
                    grid.skipped += 1;
                }
            },
            HeatmapMode::AverageIntensity => match sample.raw_value.as_f64() {
                Ok(value) => {
                    sums[day][hour] += value;
                    counts[day][hour] += 1;
                }
                Err(e) => {
                    tracing::debug!("Skipping heatmap sample at {}: {}", sample.timestamp, e);
                    grid.skipped += 1;
                }
            },
        }
    }

    for (day, row) in grid.rows.iter_mut().enumerate() {
        for hour in 0..HOURS_PER_DAY {
            let count = counts[day][hour];
            row.hours[hour] = match mode {
                HeatmapMode::CountActive(_) => f64::from(count),
                HeatmapMode::AverageIntensity if count == 0 => 0.0,
                HeatmapMode::AverageIntensity => sums[day][hour] / f64::from(count),
            };
        }
    }

    grid
}
