use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const UNCATEGORIZED: &str = "Uncategorized";

static DEFAULT_CATEGORIES: Lazy<Categories> = Lazy::new(|| {
    Categories::new([
        ("Academic", "#4285F4"),
        ("Financial", "#34A853"),
        ("Events", "#FBBC05"),
        ("Athletics", "#EA4335"),
        ("Deadlines", "#9C27B0"),
        ("Holidays", "#FF9800"),
        ("FYSS", "#00796B"),
    ])
    .expect("built-in categories are unique")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
}

/// Ordered set of known categories with their display colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Categories(Vec<Category>);

impl Categories {
    pub fn new<I, N, C>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let categories = entries
            .into_iter()
            .map(|(name, color)| Category {
                name: name.into(),
                color: color.into(),
            })
            .collect();

        Self::from_vec(categories)
    }

    fn from_vec(categories: Vec<Category>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();

        for category in &categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyCategoryName);
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::DuplicateCategory(name.to_string()));
            }
        }

        Ok(Self(categories))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_vec(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            source: err,
        })?;

        Self::from_json(&json)
    }

    /// Case-insensitive lookup returning the configured spelling.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.0
            .iter()
            .find(|category| category.name.eq_ignore_ascii_case(name))
            .map(|category| category.name.as_str())
    }

    pub fn color(&self, name: &str) -> Option<&str> {
        let name = self.resolve(name)?;
        self.0
            .iter()
            .find(|category| category.name == name)
            .map(|category| category.color.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|category| category.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Categories {
    fn default() -> Self {
        DEFAULT_CATEGORIES.clone()
    }
}

/// What happens to events whose category is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownCategory {
    /// Keep the event under [`UNCATEGORIZED`].
    #[default]
    Uncategorized,
    /// Skip the event as invalid.
    Reject,
}

impl FromStr for UnknownCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uncategorized" => Ok(Self::Uncategorized),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown policy `{other}`, expected `uncategorized` or `reject`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_case_insensitively() {
        let categories = Categories::default();

        assert_eq!(categories.resolve("academic"), Some("Academic"));
        assert_eq!(categories.resolve(" fyss "), Some("FYSS"));
        assert_eq!(categories.resolve("Nonexistent"), None);
        assert_eq!(categories.color("athletics"), Some("#EA4335"));
    }

    #[test]
    fn keeps_configured_order() {
        let categories = Categories::default();
        let names = categories.names().collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"Academic"));
        assert_eq!(names.last(), Some(&"FYSS"));
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn loads_from_json() {
        let categories = Categories::from_json(
            r##"[
                {"name": "Lectures", "color": "#111111"},
                {"name": "Exams", "color": "#222222"}
            ]"##,
        )
        .unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories.resolve("EXAMS"), Some("Exams"));
        assert_eq!(categories.resolve("Academic"), None);
    }

    #[test]
    fn rejects_duplicates_and_blank_names() {
        assert!(matches!(
            Categories::new([("Sports", "#000"), ("sports", "#fff")]),
            Err(ConfigError::DuplicateCategory(name)) if name == "sports"
        ));
        assert!(matches!(
            Categories::new([("  ", "#000")]),
            Err(ConfigError::EmptyCategoryName)
        ));
        assert!(matches!(Categories::from_json("{}"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn parses_policy() {
        assert_eq!("Reject".parse(), Ok(UnknownCategory::Reject));
        assert_eq!("uncategorized".parse(), Ok(UnknownCategory::Uncategorized));
        assert!("drop".parse::<UnknownCategory>().is_err());
    }
}
