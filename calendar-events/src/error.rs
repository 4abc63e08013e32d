use thiserror::Error;

use crate::EventId;

/// Reasons a single event is left out of a load or an export.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event id {0:?} is empty or contains control characters")]
    InvalidId(EventId),

    #[error("event {0} has an empty title")]
    EmptyTitle(EventId),

    #[error("event {0} ends before it starts")]
    InvertedRange(EventId),

    #[error("event {0} falls outside the years 0000 to 9999")]
    YearOutOfRange(EventId),

    #[error("event {id} has an invalid link {link:?}")]
    InvalidLink { id: EventId, link: String },

    #[error("event {id} has unknown category `{category}`")]
    UnknownCategory { id: EventId, category: String },

    #[error("event {0} reuses an id already taken by an earlier event")]
    DuplicateId(EventId),

    #[error("record #{index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
}

/// Failure writing an iCalendar document.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("failed to write calendar: {0}")]
    Io(#[from] std::io::Error),

    #[error("calendar output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid category configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("category names must not be empty")]
    EmptyCategoryName,

    #[error("category `{0}` is configured twice")]
    DuplicateCategory(String),
}

/// The event document itself could not be read as a list of records.
#[derive(Error, Debug)]
#[error("event data is not a JSON array of records: {0}")]
pub struct LoadError(#[from] pub serde_json::Error);
