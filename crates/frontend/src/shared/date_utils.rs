/// Utilities for date and time formatting and parsing in wizard forms
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Format date to DD.MM.YYYY
/// Example: 2024-03-15 -> "15.03.2024"
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

/// Format timestamp to DD.MM.YYYY HH:MM:SS
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%d.%m.%Y %H:%M:%S").to_string()
}

/// Value for `<input type="date">`
pub fn to_input_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Parse `<input type="date">` value; empty or invalid input clears the date
pub fn parse_input_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse `<input type="time">` value (HH:MM or HH:MM:SS)
pub fn parse_input_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn to_input_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Current time from the browser clock
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 15)), "15.03.2024");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_format_datetime() {
        let value = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_datetime(value), "31.12.2024 23:59:59");
    }

    #[test]
    fn test_input_date_round_trip() {
        let date = parse_input_date("2024-05-06");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert_eq!(to_input_date(date), "2024-05-06");
        assert_eq!(parse_input_date(""), None);
        assert_eq!(parse_input_date("06.05.2024"), None);
    }

    #[test]
    fn test_parse_input_time() {
        assert_eq!(parse_input_time("07:30"), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(parse_input_time("07:30:15"), NaiveTime::from_hms_opt(7, 30, 15));
        assert_eq!(parse_input_time("late"), None);
    }
}
