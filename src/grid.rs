//! Normalizes provider payloads into the week-major contribution grid.
//!
//! Every field fallback happens here, once. Downstream code only sees the
//! canonical [`Day`] shape: a possibly empty date string, a non-negative
//! count and an optional provider color.

use crate::colors::coerce_count;
use crate::models::{Calendar, Day, Week};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

pub const PLACEHOLDER_WEEKS: usize = 53;

impl Day {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::placeholder();
        };

        let date = fields
            .get("date")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();
        // Undated days are placeholders: always empty, never counted.
        let count = if date.is_empty() {
            0
        } else {
            fields
                .get("count")
                .filter(|value| !value.is_null())
                .or_else(|| fields.get("contributionCount").filter(|value| !value.is_null()))
                .map(coerce_count)
                .unwrap_or(0)
        };
        let color = fields
            .get("color")
            .and_then(Value::as_str)
            .filter(|color| !color.is_empty())
            .map(str::to_string);

        Self { date, count, color }
    }

    pub fn is_dated(&self) -> bool {
        !self.date.is_empty()
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

impl Week {
    pub fn empty() -> Self {
        Self {
            days: std::array::from_fn(|_| Day::placeholder()),
        }
    }

    /// Keeps the first seven entries of a ragged week and pads the rest.
    pub fn from_value(value: &Value) -> Self {
        let Some(entries) = value.as_array() else {
            return Self::empty();
        };
        Self {
            days: std::array::from_fn(|index| {
                entries.get(index).map(Day::from_value).unwrap_or_default()
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_days(days: impl IntoIterator<Item = Day>) -> Self {
        let mut days = days.into_iter();
        Self {
            days: std::array::from_fn(|_| days.next().unwrap_or_default()),
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn first_dated(&self) -> Option<&Day> {
        self.days.iter().find(|day| day.is_dated())
    }

    pub fn last_dated(&self) -> Option<&Day> {
        self.days.iter().rev().find(|day| day.is_dated())
    }

    pub fn total(&self) -> u64 {
        self.days
            .iter()
            .filter(|day| day.is_dated())
            .fold(0u64, |sum, day| sum.saturating_add(day.count))
    }
}

impl Calendar {
    /// Builds a calendar from an arbitrary payload. Never fails: a missing or
    /// non-sequence `contributions` field (or an empty one) yields the
    /// placeholder grid.
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("contributions").and_then(Value::as_array) {
            Some(weeks) if !weeks.is_empty() => Self {
                weeks: weeks.iter().map(Week::from_value).collect(),
                placeholder: false,
            },
            _ => Self::placeholder(),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            weeks: (0..PLACEHOLDER_WEEKS).map(|_| Week::empty()).collect(),
            placeholder: true,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_weeks(weeks: Vec<Week>) -> Self {
        if weeks.is_empty() {
            return Self::placeholder();
        }
        Self {
            weeks,
            placeholder: false,
        }
    }

    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    pub(crate) fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Accepts plain ISO dates as well as full RFC 3339 timestamps.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
