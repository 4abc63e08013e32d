use serde::Deserialize;

use crate::Event;

/// Selection applied when listing events.
///
/// Empty strings behave like absent fields so query parameters such as
/// `?category=` select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "q")]
    pub query: Option<String>,
    #[serde(default)]
    pub chronological: bool,
}

impl EventFilter {
    pub fn category<S: Into<String>>(category: S) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.chronological = true;
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        let category = non_empty(&self.category)
            .map_or(true, |category| event.category.eq_ignore_ascii_case(category.trim()));

        let query = non_empty(&self.query).map_or(true, |query| {
            let query = query.to_lowercase();
            event.title.to_lowercase().contains(&query)
                || event.description.to_lowercase().contains(&query)
        });

        category && query
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Events passing `filter`, in source order or sorted by start then end.
pub fn list_events<'a, I>(events: I, filter: &EventFilter) -> Vec<Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut selected = events
        .into_iter()
        .filter(|event| filter.matches(event))
        .cloned()
        .collect::<Vec<_>>();

    if filter.chronological {
        selected.sort_by_key(|event| (event.start, event.end));
    }

    selected
}
