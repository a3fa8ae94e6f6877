// Calendar normalization shared by range pickers and heatmaps
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};

/// The single calendar convention used to turn instants into calendar days
/// and hours of day. Every consumer goes through the same offset so grid
/// bounds, sample bucketing and "today" always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Returns `None` for offsets of a day or more.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        let seconds = minutes.checked_mul(60)?;
        FixedOffset::east_opt(seconds).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn hour_of(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_of(now)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}
