use chrono::{NaiveTime, TimeDelta};

use crate::config::constant::AVERAGE_SPEED_MPH;

const CLOCK_FORMATS: [&str; 4] = ["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"];

/// Parses `"9:05 AM"`, `"10:30pm"`, `"14:00"` or `"14:00:30"`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Like [`format_clock`] but keeps the seconds, `"10:30:14 AM"`.
pub fn format_clock_precise(time: NaiveTime) -> String {
    time.format("%-I:%M:%S %p").to_string()
}

/// Driving time for `miles` at the fleet's average speed, to the second.
/// `None` when the distance is negative or too large for a time span.
pub fn travel_time(miles: f64) -> Option<TimeDelta> {
    let seconds = (miles / AVERAGE_SPEED_MPH * 3600.0).round();
    if !seconds.is_finite() || seconds < 0.0 || seconds >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_seconds(seconds as i64)
}

/// Clock time after driving `miles` from `start`, `None` if it runs past midnight.
pub fn arrival_after(start: NaiveTime, miles: f64) -> Option<NaiveTime> {
    let (arrival, wrapped) = start.overflowing_add_signed(travel_time(miles)?);
    (wrapped == 0).then_some(arrival)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twelve_and_twenty_four_hour_clocks() {
        let expected = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(parse_clock("9:05 AM"), Some(expected));
        assert_eq!(parse_clock("09:05"), Some(expected));
        assert_eq!(
            parse_clock("2:15 pm"),
            NaiveTime::from_hms_opt(14, 15, 0)
        );
        assert_eq!(parse_clock("noon"), None);
    }

    #[test]
    fn formats_as_twelve_hour_clock() {
        let time = NaiveTime::from_hms_opt(13, 7, 0).unwrap();
        assert_eq!(format_clock(time), "1:07 PM");
    }

    #[test]
    fn eighteen_miles_take_an_hour() {
        assert_eq!(travel_time(18.0), Some(TimeDelta::hours(1)));
        assert_eq!(travel_time(3.0), Some(TimeDelta::minutes(10)));
        assert_eq!(travel_time(0.0), Some(TimeDelta::zero()));
    }

    #[test]
    fn unrepresentable_distances_have_no_travel_time() {
        assert_eq!(travel_time(f64::MAX), None);
        assert_eq!(travel_time(f64::NAN), None);
        assert_eq!(travel_time(-1.0), None);
    }

    #[test]
    fn arrival_past_midnight_is_rejected() {
        let leave = NaiveTime::from_hms_opt(10, 20, 0).unwrap();
        assert_eq!(
            arrival_after(leave, 150.0),
            NaiveTime::from_hms_opt(18, 40, 0)
        );
        assert_eq!(arrival_after(leave, 300.0), None);
        assert_eq!(arrival_after(leave, 1e300), None);
    }

    #[test]
    fn precise_format_keeps_seconds() {
        let time = NaiveTime::from_hms_opt(10, 30, 14).unwrap();
        assert_eq!(format_clock_precise(time), "10:30:14 AM");
        assert_eq!(format_clock(time), "10:30 AM");
    }
}
