use std::io;
use std::path::{Path, PathBuf};

use calendar_events::{Event, Exporter, SerializationError, UNCATEGORIZED};
use log::{info, warn};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const ALL_EVENTS: &str = "calendar";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, Default)]
pub struct Report {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
}

/// Lowercased category name safe to use in file names and headers.
pub fn file_stem(category: &str) -> String {
    category
        .trim()
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9' | '-' | '_') => c,
            _ => '-',
        })
        .collect()
}

/// Writes `<prefix>-calendar.ics` with every event plus one
/// `<prefix>-<category>.ics` per configured category.
pub async fn write_calendars(
    dir: &Path,
    prefix: &str,
    exporter: &Exporter,
    events: &[Event],
) -> Result<Report, ExportError> {
    fs::create_dir_all(dir).await.map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut report = Report::default();

    let all = exporter.export(events)?;
    report.skipped = all.skipped.len();
    let path = dir.join(format!("{prefix}-{ALL_EVENTS}.ics"));
    write_atomic(&path, all.body.as_bytes()).await?;
    info!("Wrote {} events to {}", all.exported, path.display());
    report.written.push(path);

    let mut categories = exporter
        .rules()
        .categories
        .names()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if events.iter().any(|event| event.category == UNCATEGORIZED) {
        categories.push(UNCATEGORIZED.to_string());
    }

    for category in categories {
        let stem = file_stem(&category);
        if stem == ALL_EVENTS {
            warn!("Category `{category}` would overwrite the full calendar, not writing it");
            continue;
        }

        let export = exporter.export_by_category(events, &category)?;
        let path = dir.join(format!("{prefix}-{stem}.ics"));
        write_atomic(&path, export.body.as_bytes()).await?;
        info!(
            "Wrote {} {category} events to {}",
            export.exported,
            path.display()
        );
        report.written.push(path);
    }

    Ok(report)
}

/// Writes into a hidden sibling file, then renames it over `path` so readers
/// only ever see a complete calendar.
async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.tmp"));

    let result = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(body).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(io_err(err));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use calendar_events::{builtin_events, Categories, Rules, UnknownCategory, DEFAULT_PRODID};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn names(report: &Report) -> Vec<String> {
        report
            .written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn stems_are_lowercase_and_path_safe() {
        assert_eq!(file_stem("FYSS"), "fyss");
        assert_eq!(file_stem("Student Life"), "student-life");
        assert_eq!(file_stem("../etc"), "---etc");
    }

    #[tokio::test]
    async fn writes_full_and_per_category_calendars() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("public");

        let report = write_calendars(&out, "ysu", &Exporter::default(), builtin_events())
            .await
            .unwrap();

        assert_eq!(
            names(&report),
            [
                "ysu-calendar.ics",
                "ysu-academic.ics",
                "ysu-financial.ics",
                "ysu-events.ics",
                "ysu-athletics.ics",
                "ysu-deadlines.ics",
                "ysu-holidays.ics",
                "ysu-fyss.ics",
            ]
        );
        assert_eq!(report.skipped, 0);

        let all = std::fs::read_to_string(out.join("ysu-calendar.ics")).unwrap();
        assert_eq!(all.matches("BEGIN:VEVENT").count(), builtin_events().len());

        let fyss = std::fs::read_to_string(out.join("ysu-fyss.ics")).unwrap();
        assert_eq!(fyss.matches("BEGIN:VEVENT").count(), 2);
        assert!(fyss.contains("CATEGORIES:FYSS"));
    }

    #[tokio::test]
    async fn leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        write_calendars(dir.path(), "campus", &Exporter::default(), builtin_events())
            .await
            .unwrap();

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn replaces_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus-calendar.ics");
        std::fs::write(&path, "stale").unwrap();

        write_calendars(dir.path(), "campus", &Exporter::default(), &[])
            .await
            .unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("BEGIN:VCALENDAR"));
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 0);
    }

    #[tokio::test]
    async fn writes_uncategorized_bucket_when_used() {
        let dir = tempfile::tempdir().unwrap();
        let at = |h| Utc.with_ymd_and_hms(2025, 9, 1, h, 0, 0).unwrap();
        let events = [
            Event::new(1, "Chess Club", at(18), at(20), UNCATEGORIZED),
            Event::new(2, "Convocation", at(9), at(10), "Academic"),
        ];
        let exporter = Exporter::new(
            "ysu.example.edu",
            DEFAULT_PRODID,
            Rules::new(
                Categories::new([("Academic", "#4285F4")]).unwrap(),
                UnknownCategory::Uncategorized,
            ),
        );

        let report = write_calendars(dir.path(), "ysu", &exporter, &events)
            .await
            .unwrap();

        assert_eq!(
            names(&report),
            ["ysu-calendar.ics", "ysu-academic.ics", "ysu-uncategorized.ics"]
        );
        let bucket = std::fs::read_to_string(dir.path().join("ysu-uncategorized.ics")).unwrap();
        assert!(bucket.contains("SUMMARY:Chess Club"));
        assert!(!bucket.contains("SUMMARY:Convocation"));
    }

    #[tokio::test]
    async fn skips_category_colliding_with_full_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(
            "ysu.example.edu",
            DEFAULT_PRODID,
            Rules::new(
                Categories::new([("Calendar", "#000000"), ("Academic", "#4285F4")]).unwrap(),
                UnknownCategory::Uncategorized,
            ),
        );

        let report = write_calendars(dir.path(), "ysu", &exporter, builtin_events())
            .await
            .unwrap();

        assert_eq!(names(&report), ["ysu-calendar.ics", "ysu-academic.ics"]);
        let all = std::fs::read_to_string(dir.path().join("ysu-calendar.ics")).unwrap();
        assert_eq!(all.matches("BEGIN:VEVENT").count(), builtin_events().len());
    }
}
