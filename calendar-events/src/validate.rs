use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use url::Url;

use crate::category::{Categories, UnknownCategory, UNCATEGORIZED};
use crate::error::ValidationError;
use crate::{Event, EventId};

/// Deployment-specific rules every event is checked against.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub categories: Categories,
    pub unknown_category: UnknownCategory,
}

impl Rules {
    pub fn new(categories: Categories, unknown_category: UnknownCategory) -> Self {
        Self {
            categories,
            unknown_category,
        }
    }

    /// Canonical category of an event, or the reason it has none.
    pub fn category_of<'a>(&'a self, event: &Event) -> Result<&'a str, ValidationError> {
        match (self.categories.resolve(&event.category), self.unknown_category) {
            (Some(name), _) => Ok(name),
            (None, UnknownCategory::Uncategorized) => Ok(UNCATEGORIZED),
            (None, UnknownCategory::Reject) => Err(ValidationError::UnknownCategory {
                id: event.id.clone(),
                category: event.category.clone(),
            }),
        }
    }
}

/// Checks a batch of events, one at a time, in order.
///
/// Ingestion and export both go through here so the two agree on what a
/// valid event is. Ids are tracked across calls by their rendered form, so
/// `1` and `"1"` collide: a second event with an id seen before is rejected,
/// the first one wins.
pub struct Validator<'a> {
    rules: &'a Rules,
    seen: HashSet<String>,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self {
            rules,
            seen: HashSet::new(),
        }
    }

    /// Returns the canonical category of a valid event.
    pub fn check(&mut self, event: &Event) -> Result<&'a str, ValidationError> {
        let id = event.id.to_string();
        if id.trim().is_empty() || has_control(&id) {
            return Err(ValidationError::InvalidId(event.id.clone()));
        }

        if event.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle(event.id.clone()));
        }

        if event.start > event.end {
            return Err(ValidationError::InvertedRange(event.id.clone()));
        }

        if !in_ics_range(&event.start) || !in_ics_range(&event.end) {
            return Err(ValidationError::YearOutOfRange(event.id.clone()));
        }

        if let Some(link) = &event.link {
            if !is_web_url(link) {
                return Err(ValidationError::InvalidLink {
                    id: event.id.clone(),
                    link: link.clone(),
                });
            }
        }

        let category = self.rules.category_of(event)?;

        if !self.seen.insert(id) {
            return Err(ValidationError::DuplicateId(event.id.clone()));
        }

        Ok(category)
    }

    /// Checks an owned event and rewrites it into canonical form.
    pub fn normalize(&mut self, mut event: Event) -> Result<Event, ValidationError> {
        let category = self.check(&event)?;

        event.category = category.to_string();
        event.title = event.title.trim().to_string();
        event.location = event
            .location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty());

        Ok(event)
    }
}

fn has_control(text: &str) -> bool {
    text.chars().any(char::is_control)
}

/// iCalendar date-times carry exactly four year digits.
fn in_ics_range(time: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&time.year())
}

// `Url::parse` strips tabs and newlines before parsing, so they have to be
// caught on the raw text.
fn is_web_url(link: &str) -> bool {
    let link = link.trim();
    if has_control(link) {
        return false;
    }

    Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn event(id: u64, title: &str, category: &str) -> Event {
        Event::new(
            id,
            title,
            Utc.with_ymd_and_hms(2025, 10, 5, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 5, 21, 0, 0).unwrap(),
            category,
        )
    }

    #[test]
    fn accepts_and_canonicalizes() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        let normalized = validator
            .normalize(event(6, "  Student Art Exhibition ", "events").with_location("  "))
            .unwrap();

        assert_eq!(normalized.title, "Student Art Exhibition");
        assert_eq!(normalized.category, "Events");
        assert_eq!(normalized.location, None);
    }

    #[test]
    fn rejects_blank_title() {
        let rules = Rules::default();
        let result = Validator::new(&rules).check(&event(1, "   ", "Academic"));
        assert_eq!(result, Err(ValidationError::EmptyTitle(EventId::Number(1))));
    }

    #[test]
    fn rejects_inverted_range_but_not_zero_length() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        let mut inverted = event(2, "Backwards", "Academic");
        std::mem::swap(&mut inverted.start, &mut inverted.end);
        assert_eq!(
            validator.check(&inverted),
            Err(ValidationError::InvertedRange(EventId::Number(2)))
        );

        let mut instant = event(3, "Instant", "Academic");
        instant.end = instant.start;
        assert_eq!(validator.check(&instant), Ok("Academic"));
    }

    #[test]
    fn rejects_non_web_links() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        let good = event(7, "FYSS", "FYSS").with_link("https://ysu.edu/fyss", None);
        assert!(validator.check(&good).is_ok());

        let links = [
            (8, "not a url"),
            (9, "ftp://files.example.com/x"),
            (10, "mailto:a@b.c"),
            (11, "https://ysu.edu/a\r\nEND:VEVENT"),
            (12, "https://ysu.edu/\ttab"),
        ];
        for (id, link) in links {
            let bad = event(id, "FYSS", "FYSS").with_link(link, None);
            assert!(matches!(
                validator.check(&bad),
                Err(ValidationError::InvalidLink { .. })
            ));
        }
    }

    #[test]
    fn unknown_category_policy() {
        let lenient = Rules::default();
        assert_eq!(
            Validator::new(&lenient).check(&event(1, "Chess Club", "Clubs")),
            Ok(UNCATEGORIZED)
        );

        let strict = Rules::new(Categories::default(), UnknownCategory::Reject);
        assert!(matches!(
            Validator::new(&strict).check(&event(1, "Chess Club", "Clubs")),
            Err(ValidationError::UnknownCategory { category, .. }) if category == "Clubs"
        ));
    }

    #[test]
    fn first_id_wins() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        assert!(validator.check(&event(4, "First", "Academic")).is_ok());
        assert_eq!(
            validator.check(&event(4, "Second", "Academic")),
            Err(ValidationError::DuplicateId(EventId::Number(4)))
        );
    }

    #[test]
    fn ids_collide_by_rendered_form() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        assert!(validator.check(&event(1, "Numeric", "Academic")).is_ok());

        let mut text = event(1, "Textual", "Academic");
        text.id = EventId::Text("1".into());
        assert_eq!(
            validator.check(&text),
            Err(ValidationError::DuplicateId(EventId::Text("1".into())))
        );
    }

    #[test]
    fn rejects_blank_and_multiline_ids() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        for id in ["", "  ", "x\r\nBEGIN:VEVENT", "tab\tbed"] {
            let mut bad = event(0, "Talk", "Academic");
            bad.id = EventId::Text(id.into());
            assert_eq!(
                validator.check(&bad),
                Err(ValidationError::InvalidId(EventId::Text(id.into())))
            );
        }

        let mut good = event(0, "Talk", "Academic");
        good.id = EventId::Text("fyss-7".into());
        assert!(validator.check(&good).is_ok());
    }

    #[test]
    fn rejects_years_past_9999() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        let mut far = event(13, "Far Future", "Academic");
        far.end = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            validator.check(&far),
            Err(ValidationError::YearOutOfRange(EventId::Number(13)))
        );

        let mut edge = event(14, "Last Day", "Academic");
        edge.end = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(validator.check(&edge).is_ok());
    }

    #[test]
    fn invalid_events_do_not_claim_ids() {
        let rules = Rules::default();
        let mut validator = Validator::new(&rules);

        assert!(validator.check(&event(4, "", "Academic")).is_err());
        assert!(validator.check(&event(4, "Retry", "Academic")).is_ok());
    }
}
