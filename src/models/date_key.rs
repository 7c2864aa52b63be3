//! Canonical date keys
//!
//! Input dates arrive as `D/M/YYYY`, `YYYY/M/D` or `YYYY-MM-DD`; everything is
//! grouped and sorted by the canonical `YYYY-MM-DD` form.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A validated `YYYY-MM-DD` date string.
///
/// Lexicographic order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    /// Canonicalize a raw date string. Returns `None` when it cannot be parsed.
    pub fn canonicalize(raw: &str) -> Option<Self> {
        parse_date(raw).map(Self::from_date)
    }

    /// Key for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// The canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date behind this key
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    /// Short `M/D` label for chart axes
    pub fn short_label(&self) -> String {
        simplify_date_label(&self.0)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse any supported input format into a calendar date
///
/// Slash-separated dates are year-first when the first segment has four
/// characters; otherwise the last segment is the year and the first the day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    let (year, month, day) = if raw.contains('/') {
        let parts: Vec<&str> = raw.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        if parts[0].len() == 4 {
            (parts[0], parts[1], parts[2])
        } else {
            (parts[2], parts[1], parts[0])
        }
    } else if raw.contains('-') {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        (parts[0], parts[1], parts[2])
    } else {
        return None;
    };

    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Turn "2025-04-17" into "4/17"; anything else is returned unchanged
pub fn simplify_date_label(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() != 3 {
        return date.to_string();
    }
    match (parts[1].parse::<u32>(), parts[2].parse::<u32>()) {
        (Ok(month), Ok(day)) => format!("{}/{}", month, day),
        _ => date.to_string(),
    }
}
