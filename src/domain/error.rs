// Typed errors surfaced by the transformation core
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::hierarchy::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
pub enum ValidationError {
    #[error("date is before the flock start")]
    BeforeFlockStart,
    #[error("date is after the flock end")]
    AfterFlockEnd,
    #[error("start date is after the end date")]
    StartAfterEnd,
    #[error("end date is before the start date")]
    EndBeforeStart,
    #[error("flock start is not a valid date")]
    InvalidFlockStart,
    #[error("flock has not started yet")]
    FlockNotStarted,
    #[error("range spans more than {max_days} days")]
    RangeTooLong { max_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionLevel {
    Company,
    Farm,
    Flock,
    Device,
}

impl fmt::Display for SelectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionLevel::Company => "company",
            SelectionLevel::Farm => "farm",
            SelectionLevel::Flock => "flock",
            SelectionLevel::Device => "device",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{0} selection is locked until its parent is chosen and its options are loaded")]
    Locked(SelectionLevel),
    #[error("{level} {id} is not among the loaded options")]
    UnknownOption { level: SelectionLevel, id: EntityId },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid date range: {0}")]
    Validation(#[from] ValidationError),

    #[error("not accessible for this user")]
    AccessDenied,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
