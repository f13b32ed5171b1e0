//! Calendar date selected in the map view's date picker.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{FloodwatchError, FloodwatchResult};

/// A calendar date applied to every date-bearing layer.
///
/// Serialized as the ISO calendar date (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MapDate(NaiveDate);

impl MapDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> FloodwatchResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| FloodwatchError::InvalidDate(format!("{}-{}-{}", year, month, day)))
    }

    /// Today's date in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parse `YYYY-MM-DD`, or the compact `YYYYMMDD` form used in layer names.
    pub fn parse(s: &str) -> FloodwatchResult<Self> {
        let s = s.trim();
        // Try ISO calendar date
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self(date));
        }

        // Try compact form
        if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                return Ok(Self(date));
            }
        }

        Err(FloodwatchError::InvalidDate(s.to_string()))
    }

    /// Parse a date-picker value, rejecting dates after `today`.
    pub fn parse_not_after(s: &str, today: MapDate) -> FloodwatchResult<Self> {
        let date = Self::parse(s)?;
        if date > today {
            return Err(FloodwatchError::InvalidDate(format!(
                "{} is after {}",
                date, today
            )));
        }
        Ok(date)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// `YYYYMMDD`, the ISO date with separators removed.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `YYYYMMDD0000`, the midnight timestamp used by the impact shapefiles.
    pub fn compact_datetime(&self) -> String {
        format!("{}0000", self.compact())
    }
}

impl std::fmt::Display for MapDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for MapDate {
    type Err = FloodwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MapDate {
    type Error = FloodwatchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MapDate> for String {
    fn from(date: MapDate) -> Self {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        let date = MapDate::parse("2025-06-24").unwrap();
        assert_eq!(date.compact(), "20250624");
        assert_eq!(date.compact_datetime(), "202506240000");
        assert_eq!(date.to_string(), "2025-06-24");
    }

    #[test]
    fn test_parse_compact_date() {
        let date = MapDate::parse("20250103").unwrap();
        assert_eq!(date, MapDate::from_ymd(2025, 1, 3).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MapDate::parse("2025-13-01").is_err());
        assert!(MapDate::parse("June 24").is_err());
        assert!(MapDate::parse("").is_err());
    }

    #[test]
    fn test_parse_not_after_today() {
        let today = MapDate::from_ymd(2025, 6, 24).unwrap();
        assert!(MapDate::parse_not_after("2025-06-24", today).is_ok());
        assert!(matches!(
            MapDate::parse_not_after("2025-06-25", today),
            Err(FloodwatchError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_serde_uses_iso_string() {
        let date = MapDate::from_ymd(2025, 6, 24).unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2025-06-24\"");
        let back: MapDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
