use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A billing month, stored and displayed as `YYYY-MM`.
///
/// Progress rows are keyed by `(user, group, month)`; the month string is
/// the one persisted in the `progress.month` column.
///
/// ```rust
/// use engine::Month;
///
/// let month: Month = "2024-06".parse().unwrap();
/// assert_eq!(month.to_string(), "2024-06");
/// assert!("2024-13".parse::<Month>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::ValidationFailed(format!(
                "invalid month: {month}"
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(EngineError::ValidationFailed(format!("invalid year: {year}")));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::ValidationFailed(format!("invalid month: {s}"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Month {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_and_formats() {
        let month: Month = "2024-06".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 6);
        assert_eq!(month.to_string(), "2024-06");
    }

    #[test]
    fn pads_single_digit_months() {
        assert_eq!(Month::new(2025, 1).unwrap().to_string(), "2025-01");
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in ["2024-6", "24-06", "2024/06", "2024-00", "2024-13", "abcd-ef", ""] {
            assert!(raw.parse::<Month>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn derives_from_timestamp() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        assert_eq!(Month::from_datetime(at).to_string(), "2023-12");
    }

    #[test]
    fn orders_chronologically() {
        let a: Month = "2023-12".parse().unwrap();
        let b: Month = "2024-01".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_uses_the_string_form() {
        let month: Month = "2024-06".parse().unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2024-06\"");
        let back: Month = serde_json::from_str("\"2024-06\"").unwrap();
        assert_eq!(back, month);
    }
}
