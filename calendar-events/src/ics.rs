use std::borrow::Cow;

use ics::components::Property;
use ics::properties::{
    Categories, Description, DtEnd, DtStart, Location, Status, Summary, Transp, URL,
};
use ics::{escape_text, ICalendar};
use log::warn;

use crate::error::{SerializationError, ValidationError};
use crate::filter::{list_events, EventFilter};
use crate::time::to_ics_utc;
use crate::validate::{Rules, Validator};
use crate::Event;

pub const DEFAULT_DOMAIN: &str = "campus-calendar.example.com";
pub const DEFAULT_PRODID: &str = "-//Campus Calendar//Events Feed//EN";

/// A rendered iCalendar document.
#[derive(Debug, Clone)]
pub struct Export {
    pub body: String,
    pub exported: usize,
    pub skipped: Vec<ValidationError>,
}

/// Serializes events into iCalendar documents.
#[derive(Debug, Clone)]
pub struct Exporter {
    domain: String,
    prodid: String,
    rules: Rules,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN, DEFAULT_PRODID, Rules::default())
    }
}

impl Exporter {
    pub fn new<D: Into<String>, P: Into<String>>(domain: D, prodid: P, rules: Rules) -> Self {
        Self {
            domain: domain.into(),
            prodid: prodid.into(),
            rules,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn uid(&self, event: &Event) -> String {
        format!("{}@{}", event.id, self.domain)
    }

    /// Renders every valid event. Invalid ones are logged and skipped.
    pub fn export(&self, events: &[Event]) -> Result<Export, SerializationError> {
        let mut icalendar = ICalendar::new("2.0", self.prodid.as_str());
        let mut validator = Validator::new(&self.rules);
        let mut exported = 0;
        let mut skipped = Vec::new();

        for event in events {
            match validator.check(event) {
                Ok(category) => {
                    icalendar.add_event(self.to_ics(event, category));
                    exported += 1;
                }
                Err(err) => {
                    warn!("Leaving event out of calendar: {err}");
                    skipped.push(err);
                }
            }
        }

        let mut buffer = Vec::new();
        icalendar.write(&mut buffer)?;

        Ok(Export {
            body: String::from_utf8(buffer)?,
            exported,
            skipped,
        })
    }

    pub fn export_by_category(
        &self,
        events: &[Event],
        category: &str,
    ) -> Result<Export, SerializationError> {
        self.export(&list_events(events, &EventFilter::category(category)))
    }

    fn to_ics<'a>(&self, event: &'a Event, category: &'a str) -> ics::Event<'a> {
        let start = to_ics_utc(&event.start);

        // DTSTAMP follows the start so repeated exports are byte-identical.
        let mut ics_event = ics::Event::new(self.uid(event), start.clone());

        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(to_ics_utc(&event.end)));
        ics_event.push(Summary::new(escape_text(event.title.as_str())));
        ics_event.push(Description::new(escape_text(description(event))));
        ics_event.push(Location::new(escape_text(
            event.location.as_deref().unwrap_or_default(),
        )));
        ics_event.push(Categories::new(escape_text(category)));
        ics_event.push(Status::new("CONFIRMED"));
        ics_event.push(Transp::new("OPAQUE"));
        ics_event.push(Property::new("X-MICROSOFT-CDO-BUSYSTATUS", "BUSY"));

        if let Some(link) = &event.link {
            ics_event.push(URL::new(link.trim()));
        }

        ics_event
    }
}

fn description(event: &Event) -> Cow<'_, str> {
    match (&event.link, event.description.is_empty()) {
        (None, _) => Cow::Borrowed(event.description.as_str()),
        (Some(link), true) => Cow::Owned(format!("Resource: {}", link.trim())),
        (Some(link), false) => {
            Cow::Owned(format!("{}\n\nResource: {}", event.description, link.trim()))
        }
    }
}
