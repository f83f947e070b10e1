// src/gps/time.rs
//! NMEA time and date field decoding
//!
//! GGA only carries a time of day, so it is applied to today's UTC date.
//! RMC carries both a time and a `ddmmyy` date. Neither function fails:
//! anything unparsable falls back to the current instant.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

/// Time of day from a GGA `hhmmss[.sss]` field, on today's UTC date.
///
/// Sub-seconds are zeroed, so the current instant's milliseconds are not kept.
pub fn time_only(hhmmss: &str) -> DateTime<Utc> {
    time_only_at(hhmmss, Utc::now())
}

/// Same as [`time_only`] with an explicit reference instant.
pub fn time_only_at(hhmmss: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_hms(hhmmss)
        .and_then(|(h, m, s)| {
            now.with_hour(h)?
                .with_minute(m)?
                .with_second(s)?
                .with_nanosecond(0)
        })
        .unwrap_or(now)
}

/// Absolute instant from an RMC `hhmmss[.sss]` time and `ddmmyy` date.
pub fn date_and_time(hhmmss: &str, ddmmyy: &str) -> DateTime<Utc> {
    date_and_time_at(hhmmss, ddmmyy, Utc::now())
}

/// Same as [`date_and_time`] with an explicit fallback instant.
pub fn date_and_time_at(hhmmss: &str, ddmmyy: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = parse_dmy(ddmmyy).and_then(|(day, month, year)| {
        let (h, m, s) = parse_hms(hhmmss)?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(h, m, s)?;
        Some(Utc.from_utc_datetime(&date.and_time(time)))
    });

    parsed.unwrap_or(now)
}

fn parse_hms(field: &str) -> Option<(u32, u32, u32)> {
    Some((
        two_digits(field, 0)?,
        two_digits(field, 2)?,
        two_digits(field, 4)?,
    ))
}

fn parse_dmy(field: &str) -> Option<(u32, u32, i32)> {
    let day = two_digits(field, 0)?;
    let month = two_digits(field, 2)?;
    let year = two_digits(field, 4)? as i32 + 2000;
    Some((day, month, year))
}

fn two_digits(field: &str, start: usize) -> Option<u32> {
    field.get(start..start + 2)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
    }

    #[test]
    fn test_time_only_uses_reference_date() {
        let ts = time_only_at("123519", reference());
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 12, 35, 19).unwrap());
    }

    #[test]
    fn test_time_only_ignores_fraction() {
        let ts = time_only_at("123519.75", reference());
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 12, 35, 19).unwrap());
    }

    #[test]
    fn test_time_only_fallback() {
        let now = reference();
        assert_eq!(time_only_at("", now), now);
        assert_eq!(time_only_at("12", now), now);
        assert_eq!(time_only_at("12ab19", now), now);
        assert_eq!(time_only_at("256000", now), now);
    }

    #[test]
    fn test_date_and_time() {
        let ts = date_and_time_at("123519", "230394", reference());
        assert_eq!(ts, Utc.with_ymd_and_hms(2094, 3, 23, 12, 35, 19).unwrap());
    }

    #[test]
    fn test_date_and_time_with_fraction() {
        let ts = date_and_time_at("081530.00", "010124", reference());
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 8, 15, 30).unwrap());
    }

    #[test]
    fn test_date_and_time_fallback() {
        let now = reference();
        assert_eq!(date_and_time_at("123519", "", now), now);
        assert_eq!(date_and_time_at("", "230394", now), now);
        assert_eq!(date_and_time_at("123519", "2303", now), now);
        // 31st of February
        assert_eq!(date_and_time_at("123519", "310224", now), now);
    }

    #[test]
    fn test_non_ascii_does_not_panic() {
        let now = reference();
        assert_eq!(time_only_at("1é3519", now), now);
        assert_eq!(date_and_time_at("123519", "2€0394", now), now);
    }
}
