//! Timestamp encodings accepted in event data.
//!
//! Every form is normalized to UTC. Values without an offset are taken to
//! already be in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Text(String),
    Parts(Vec<u32>),
}

pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp `{text}`"))),
        Raw::Parts(parts) => from_parts(&parts)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp components {parts:?}"))),
    }
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `[year, month, day, hour, minute]` with an optional trailing second.
fn from_parts(parts: &[u32]) -> Option<DateTime<Utc>> {
    let (&[year, month, day], rest) = parts.split_first_chunk::<3>()?;
    let (hour, minute, second) = match rest {
        [] => (0, 0, 0),
        [hour] => (*hour, 0, 0),
        [hour, minute] => (*hour, *minute, 0),
        [hour, minute, second] => (*hour, *minute, *second),
        _ => return None,
    };

    let naive = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hour, minute, second)?;

    Some(Utc.from_utc_datetime(&naive))
}

/// UTC basic format used by iCalendar, e.g. `20250821T080000Z`.
pub fn to_ics_utc(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}
