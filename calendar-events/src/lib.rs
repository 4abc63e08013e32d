//! Event model and iCalendar export for the campus calendar.

mod category;
mod error;
mod filter;
mod parser;
mod structs;
mod validate;

pub mod time;

#[cfg(feature = "ics")]
mod ics;

pub use category::{Categories, Category, UnknownCategory, UNCATEGORIZED};
pub use error::{ConfigError, LoadError, SerializationError, ValidationError};
pub use filter::{list_events, EventFilter};
pub use parser::{builtin_events, parse_events, Loaded};
pub use structs::{Event, EventId};
pub use validate::{Rules, Validator};

#[cfg(feature = "ics")]
pub use crate::ics::{Export, Exporter, DEFAULT_DOMAIN, DEFAULT_PRODID};
