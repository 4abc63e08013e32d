use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time;

/// Identifier of an event as it appears in the source data.
///
/// Sources use either numbers or strings, both are kept verbatim so the
/// generated UID matches what the source calls the event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(u64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(with = "time")]
    pub start: DateTime<Utc>,
    #[serde(with = "time")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_label: Option<String>,
}

impl Event {
    pub fn new<I, S>(
        id: I,
        title: S,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category: S,
    ) -> Self
    where
        I: Into<EventId>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            description: String::new(),
            location: None,
            category: category.into(),
            link: None,
            link_label: None,
        }
    }

    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_link<S: Into<String>>(mut self, link: S, label: Option<S>) -> Self {
        self.link = Some(link.into());
        self.link_label = label.map(Into::into);
        self
    }

    /// Whether the event spans more than one calendar day (in UTC).
    pub fn is_multi_day(&self) -> bool {
        self.end.date_naive() > self.start.date_naive()
    }
}
