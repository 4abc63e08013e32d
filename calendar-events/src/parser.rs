use log::{debug, warn};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{LoadError, ValidationError};
use crate::validate::{Rules, Validator};
use crate::Event;

static BUILTIN_EVENTS: &str = include_str!("../data/events.json");

static BUILTIN: Lazy<Vec<Event>> = Lazy::new(|| {
    parse_events(BUILTIN_EVENTS, &Rules::default())
        .map(|loaded| loaded.events)
        .unwrap_or_default()
});

/// Result of reading an event document.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub events: Vec<Event>,
    pub skipped: Vec<ValidationError>,
}

/// Parses a JSON array of event records.
///
/// Records are decoded and validated one by one. A bad record is skipped and
/// reported in [`Loaded::skipped`], the rest of the document still loads.
pub fn parse_events<S: AsRef<str>>(json: S, rules: &Rules) -> Result<Loaded, LoadError> {
    let records: Vec<Value> = serde_json::from_str(json.as_ref())?;
    let mut validator = Validator::new(rules);
    let mut loaded = Loaded::default();

    for (index, record) in records.into_iter().enumerate() {
        let result = serde_json::from_value::<Event>(record)
            .map_err(|err| ValidationError::Malformed {
                index,
                reason: err.to_string(),
            })
            .and_then(|event| validator.normalize(event));

        match result {
            Ok(event) => loaded.events.push(event),
            Err(err) => {
                warn!("Skipping event: {err}");
                loaded.skipped.push(err);
            }
        }
    }

    debug!(
        "Loaded {} events ({} skipped)",
        loaded.events.len(),
        loaded.skipped.len()
    );

    Ok(loaded)
}

/// The sample events compiled into the crate.
pub fn builtin_events() -> &'static [Event] {
    &BUILTIN
}
