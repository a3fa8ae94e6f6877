// Working date ranges bounded by a flock's life span, plus quick-pick presets
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::Calendar;
use super::error::{CoreError, ValidationError};
use super::measurement::parse_timestamp;

/// Inclusive range of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::StartAfterEnd);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// `start`/`end` as `YYYY-MM-DD`, built from calendar fields.
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// Life span of a flock. An open flock has no `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlockBounds {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

/// Flock life span as reported upstream, before date parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlockBounds {
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl FlockBounds {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn from_raw(raw: &RawFlockBounds, calendar: &Calendar) -> Result<Self, CoreError> {
        let start = raw
            .start
            .as_deref()
            .and_then(|s| parse_calendar_date(s, calendar))
            .ok_or(ValidationError::InvalidFlockStart)?;

        let end = match raw.end.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_calendar_date(s, calendar).ok_or_else(|| {
                CoreError::MalformedInput(format!("unparseable flock end '{}'", s))
            })?),
        };

        Ok(Self { start, end })
    }

    /// Upper bound for ranges: the flock end, or today while the flock is open.
    /// Never earlier than the flock start.
    pub fn upper_bound(&self, today: NaiveDate) -> NaiveDate {
        self.end.unwrap_or(today).max(self.start)
    }
}

/// Calendar date from either a plain date or a timestamp in the calendar's offset.
fn parse_calendar_date(input: &str, calendar: &Calendar) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(input).ok().map(|t| calendar.date_of(t)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateChange {
    Start(NaiveDate),
    End(NaiveDate),
}

impl DateChange {
    fn date(&self) -> NaiveDate {
        match self {
            DateChange::Start(date) | DateChange::End(date) => *date,
        }
    }
}

/// Apply a single date edit to `range`. Rules run in order and the first
/// failure wins; on failure the caller keeps its previous range.
///
/// `AfterFlockEnd` also covers dates after today while the flock is open.
pub fn validate(
    change: DateChange,
    range: &DateRange,
    bounds: Option<&FlockBounds>,
    today: NaiveDate,
) -> Result<DateRange, ValidationError> {
    let date = change.date();

    if let Some(bounds) = bounds {
        if date < bounds.start {
            return Err(ValidationError::BeforeFlockStart);
        }
        if date > bounds.upper_bound(today) {
            return Err(ValidationError::AfterFlockEnd);
        }
    }

    match change {
        DateChange::Start(start) if start > range.end => Err(ValidationError::StartAfterEnd),
        DateChange::End(end) if end < range.start => Err(ValidationError::EndBeforeStart),
        DateChange::Start(start) => Ok(DateRange { start, ..*range }),
        DateChange::End(end) => Ok(DateRange { end, ..*range }),
    }
}

pub fn validate_start(
    new_start: NaiveDate,
    range: &DateRange,
    bounds: Option<&FlockBounds>,
    today: NaiveDate,
) -> Result<DateRange, ValidationError> {
    validate(DateChange::Start(new_start), range, bounds, today)
}

pub fn validate_end(
    new_end: NaiveDate,
    range: &DateRange,
    bounds: Option<&FlockBounds>,
    today: NaiveDate,
) -> Result<DateRange, ValidationError> {
    validate(DateChange::End(new_end), range, bounds, today)
}

/// Check a whole range against the flock life span.
pub fn check_within(
    range: &DateRange,
    bounds: &FlockBounds,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if range.start < bounds.start {
        return Err(ValidationError::BeforeFlockStart);
    }
    if range.end > bounds.upper_bound(today) {
        return Err(ValidationError::AfterFlockEnd);
    }
    Ok(())
}

pub fn since_flock_start(bounds: &FlockBounds, today: NaiveDate) -> Result<DateRange, ValidationError> {
    if bounds.start > today {
        return Err(ValidationError::FlockNotStarted);
    }
    let end = bounds.upper_bound(today).min(today);
    DateRange::new(bounds.start, end)
}

pub fn last_n_days(n: u32, today: NaiveDate) -> DateRange {
    let start = today
        .checked_sub_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MIN);
    DateRange { start, end: today }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    SinceFlockStart,
    LastDays(u32),
}

impl QuickRange {
    pub fn resolve(
        &self,
        bounds: Option<&FlockBounds>,
        today: NaiveDate,
    ) -> Result<DateRange, ValidationError> {
        match self {
            QuickRange::SinceFlockStart => {
                let bounds = bounds.ok_or(ValidationError::InvalidFlockStart)?;
                since_flock_start(bounds, today)
            }
            QuickRange::LastDays(n) => {
                let range = last_n_days(*n, today);
                if let Some(bounds) = bounds {
                    check_within(&range, bounds, today)?;
                }
                Ok(range)
            }
        }
    }
}

/// Editable range state behind the date pickers. Holds the last date error
/// until the next successful edit.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeEditor {
    range: DateRange,
    bounds: Option<FlockBounds>,
    error: Option<ValidationError>,
}

impl DateRangeEditor {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            bounds: None,
            error: None,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn bounds(&self) -> Option<&FlockBounds> {
        self.bounds.as_ref()
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_start(&mut self, date: NaiveDate, today: NaiveDate) -> Result<DateRange, ValidationError> {
        self.apply(DateChange::Start(date), today)
    }

    pub fn set_end(&mut self, date: NaiveDate, today: NaiveDate) -> Result<DateRange, ValidationError> {
        self.apply(DateChange::End(date), today)
    }

    pub fn apply_quick_range(
        &mut self,
        preset: QuickRange,
        today: NaiveDate,
    ) -> Result<DateRange, ValidationError> {
        let outcome = preset.resolve(self.bounds.as_ref(), today);
        self.record(outcome)
    }

    /// Swap the flock bounds and pull the current range inside them.
    pub fn rebind(&mut self, bounds: Option<FlockBounds>, today: NaiveDate) {
        self.bounds = bounds;
        self.error = None;

        let Some(bounds) = bounds else {
            return;
        };

        let upper = bounds.upper_bound(today);
        let start = self.range.start.max(bounds.start);
        let end = self.range.end.min(upper);
        if start <= end {
            self.range = DateRange { start, end };
            return;
        }
        match since_flock_start(&bounds, today) {
            Ok(range) => self.range = range,
            Err(e) => {
                self.range = DateRange {
                    start: bounds.start,
                    end: bounds.start,
                };
                self.error = Some(e);
            }
        }
    }

    fn apply(&mut self, change: DateChange, today: NaiveDate) -> Result<DateRange, ValidationError> {
        let outcome = validate(change, &self.range, self.bounds.as_ref(), today);
        self.record(outcome)
    }

    fn record(
        &mut self,
        outcome: Result<DateRange, ValidationError>,
    ) -> Result<DateRange, ValidationError> {
        match outcome {
            Ok(range) => {
                self.range = range;
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
        outcome
    }
}
