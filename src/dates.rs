use crate::error::Error;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;

const DATE_FORMAT: &str = "%Y%m%d";
const ACCEPTED_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

/// An inclusive reporting range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Formats as the report `DURING` value, e.g. `20240101,20240131`.
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start_str(), self.end_str())
    }
}

pub fn parse_time_zone(name: &str) -> Result<Tz, Error> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::InvalidTimeZone(name.to_string()))
}

/// Today's calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Parses a date cell. Empty text means `today`.
///
/// Timestamps carrying an offset are converted into `tz` before the date is taken;
/// plain calendar dates are used as written.
pub fn parse_date(text: &str, tz: Tz, today: NaiveDate) -> Result<NaiveDate, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(today);
    }

    // chrono's %Y also takes 1-3 digit years, only four-digit years are accepted
    if let Some(date) = ACCEPTED_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .find(|date| date.year() >= 1000)
    {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| Error::InvalidDate {
            date: text.to_string(),
        })
}

/// Normalizes a raw start/end pair into a [`DateRange`].
///
/// # Errors
/// [`Error::InvalidDateRange`] with the formatted values when start is after end.
pub fn normalize(start: &str, end: &str, tz: Tz, today: NaiveDate) -> Result<DateRange, Error> {
    let range = DateRange {
        start: parse_date(start, tz, today)?,
        end: parse_date(end, tz, today)?,
    };

    if range.start_str() > range.end_str() {
        return Err(Error::InvalidDateRange {
            start_date: range.start_str(),
            end_date: range.end_str(),
        });
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_dates_default_to_today() {
        let today = date("2024-03-05");
        let range = normalize("", "  ", Tz::UTC, today).unwrap();

        assert_eq!(range.start_str(), "20240305");
        assert_eq!(range.end_str(), "20240305");
        assert_eq!(range.to_string(), "20240305,20240305");
    }

    #[test]
    fn test_accepted_formats() {
        let today = date("2024-03-05");
        for text in ["2024-01-02", "20240102", "2024/01/02", "01/02/2024"] {
            assert_eq!(parse_date(text, Tz::UTC, today).unwrap(), date("2024-01-02"));
        }
    }

    #[test]
    fn test_timestamp_converted_into_time_zone() {
        let today = date("2024-03-05");
        let tz = parse_time_zone("America/New_York").unwrap();

        let parsed = parse_date("2024-01-02T03:00:00Z", tz, today).unwrap();
        assert_eq!(parsed, date("2024-01-01"));
    }

    #[test]
    fn test_invalid_date() {
        let today = date("2024-03-05");
        assert!(matches!(
            parse_date("next tuesday", Tz::UTC, today).unwrap_err(),
            Error::InvalidDate { date } if date == "next tuesday"
        ));
        assert_eq!(
            parse_date("next tuesday", Tz::UTC, today).unwrap_err().to_string(),
            "The date supplied next tuesday is invalid"
        );
    }

    #[test]
    fn test_short_year_rejected() {
        let today = date("2024-03-05");
        for text in ["1/2/24", "24/01/02", "999-01-02"] {
            assert!(matches!(
                parse_date(text, Tz::UTC, today).unwrap_err(),
                Error::InvalidDate { date } if date == text
            ));
        }
        assert!(matches!(
            normalize("1/2/24", "2024-01-31", Tz::UTC, today).unwrap_err(),
            Error::InvalidDate { .. }
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let today = date("2024-03-05");
        assert!(matches!(
            normalize("2024-02-01", "2024-01-31", Tz::UTC, today).unwrap_err(),
            Error::InvalidDateRange { start_date, end_date }
                if start_date == "20240201" && end_date == "20240131"
        ));
    }

    #[test]
    fn test_start_in_future_with_empty_end_rejected() {
        let today = date("2024-03-05");
        assert!(matches!(
            normalize("2024-03-06", "", Tz::UTC, today).unwrap_err(),
            Error::InvalidDateRange { .. }
        ));
    }

    #[test]
    fn test_single_day_range_allowed() {
        let today = date("2024-03-05");
        let range = normalize("2024-01-31", "2024-01-31", Tz::UTC, today).unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_unknown_time_zone() {
        assert!(matches!(
            parse_time_zone("Mars/Olympus").unwrap_err(),
            Error::InvalidTimeZone(_)
        ));
    }
}
