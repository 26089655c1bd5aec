//! Timestamp parsing and formatting against user preferences
//!
//! Patterns use the date-fns token style the host delivers
//! (`MM/dd/yyyy`, `hh:mm aaa`, ...) and are translated to chrono formats.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::OnceLock;

/// Locale and format preferences of the current user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub locale_id: String,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub date_pattern: Option<String>,
    #[serde(default)]
    pub time_pattern: Option<String>,
    /// Number/currency patterns and other host settings, carried as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Preferences {
    /// Configured time zone, `None` when absent or not a known IANA name
    pub fn tz(&self) -> Option<Tz> {
        self.time_zone.as_deref().and_then(|name| name.parse::<Tz>().ok())
    }
}

/// Parse a raw timestamp.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` / `YYYY-MM-DD HH:MM:SS`
/// (taken as UTC) and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Calendar date of a timestamp in the given zone (UTC when `None`)
pub fn local_date(ts: DateTime<Utc>, tz: Option<Tz>) -> NaiveDate {
    match tz {
        Some(tz) => ts.with_timezone(&tz).date_naive(),
        None => ts.date_naive(),
    }
}

/// Format a raw timestamp for display.
///
/// Falls back to the raw text without preferences or when the value is not a
/// timestamp, to the ISO date without a date pattern, and to full ISO-8601
/// when the pattern or zone cannot be applied.
pub fn format_timestamp(raw: &str, preferences: Option<&Preferences>) -> String {
    let Some(preferences) = preferences else {
        return raw.to_string();
    };
    let Some(ts) = parse_timestamp(raw) else {
        return raw.to_string();
    };

    let date_pattern = match preferences.date_pattern.as_deref() {
        Some(pattern) if !pattern.is_empty() => pattern,
        _ => return ts.format("%Y-%m-%d").to_string(),
    };

    format_with_preferences(ts, date_pattern, preferences)
        .unwrap_or_else(|| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn format_with_preferences(
    ts: DateTime<Utc>,
    date_pattern: &str,
    preferences: &Preferences,
) -> Option<String> {
    let tz: Tz = match preferences.time_zone.as_deref() {
        Some(name) if !name.is_empty() => name.parse().ok()?,
        _ => Tz::UTC,
    };
    let local = ts.with_timezone(&tz);

    let mut formatted = String::new();
    write!(formatted, "{}", local.format(&translate_pattern(date_pattern)?)).ok()?;

    if let Some(time_pattern) = preferences.time_pattern.as_deref().filter(|p| !p.is_empty()) {
        let mut time = String::new();
        write!(time, "{}", local.format(&translate_pattern(time_pattern)?)).ok()?;
        let zone = preferences.time_zone.as_deref().unwrap_or("UTC");
        formatted = format!("{} {} {}", formatted, time, zone);
    }

    Some(formatted)
}

fn token_regex() -> &'static Regex {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    TOKENS.get_or_init(|| {
        Regex::new(r"'[^']*'|y+|M+|d+|E+|H+|h+|m+|s+|a+|[A-Za-z]|[^A-Za-z']+|'")
            .expect("token pattern is valid")
    })
}

/// Translate a date-fns style pattern into a chrono format string.
///
/// Returns `None` for pattern letters without a chrono equivalent.
pub fn translate_pattern(pattern: &str) -> Option<String> {
    let mut out = String::new();

    for token in token_regex().find_iter(pattern).map(|m| m.as_str()) {
        let translated = match token {
            "yyyy" | "yyy" | "y" => "%Y",
            "yy" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" => "%m",
            "M" => "%-m",
            "dd" => "%d",
            "d" => "%-d",
            "EEEE" => "%A",
            "E" | "EE" | "EEE" => "%a",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "m" => "%-M",
            "ss" => "%S",
            "s" => "%-S",
            "a" | "aa" | "aaa" => "%p",
            "''" | "'" => {
                out.push('\'');
                continue;
            }
            quoted if quoted.starts_with('\'') && quoted.ends_with('\'') => {
                out.push_str(&quoted[1..quoted.len() - 1].replace('%', "%%"));
                continue;
            }
            literal if !literal.chars().any(|c| c.is_ascii_alphabetic()) => {
                out.push_str(&literal.replace('%', "%%"));
                continue;
            }
            _ => return None,
        };
        out.push_str(translated);
    }

    Some(out)
}
