// src/gps/nmea.rs
//! NMEA sentence parsing

use super::{coord, data::Position, time};

/// Sentence type, taken from the last three characters of field 0
/// regardless of talker ID (`$GPGGA`, `$GNGGA`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Gga,
    Rmc,
    Other,
}

impl SentenceKind {
    /// Classify a trimmed line. Lines not starting with `$` are `Other`.
    pub fn of(line: &str) -> Self {
        if !line.starts_with('$') {
            return SentenceKind::Other;
        }

        let head = line.split(',').next().unwrap_or_default();
        if head.ends_with("GGA") {
            SentenceKind::Gga
        } else if head.ends_with("RMC") {
            SentenceKind::Rmc
        } else {
            SentenceKind::Other
        }
    }
}

/// Parse a single trimmed NMEA line into a position fix.
///
/// Returns `None` for non-sentences, unsupported types and lines with too
/// few fields. Malformed numeric fields inside an otherwise complete
/// sentence decode as `0.0` instead.
pub fn parse(line: &str) -> Option<Position> {
    let parts: Vec<&str> = line.split(',').collect();

    match SentenceKind::of(line) {
        SentenceKind::Gga => parse_gga(&parts),
        SentenceKind::Rmc => parse_rmc(&parts),
        SentenceKind::Other => None,
    }
}

/// Parse GGA (Global Positioning System Fix Data) sentence
fn parse_gga(parts: &[&str]) -> Option<Position> {
    let field = |i: usize| parts.get(i).copied();

    let timestamp = time::time_only(field(1)?);
    let latitude = coord::decode(field(2)?, field(3)?);
    let longitude = coord::decode(field(4)?, field(5)?);
    let altitude = field(9)?.parse::<f64>().unwrap_or(0.0);

    Some(Position::new(latitude, longitude, altitude, timestamp))
}

/// Parse RMC (Recommended Minimum Course) sentence
fn parse_rmc(parts: &[&str]) -> Option<Position> {
    let field = |i: usize| parts.get(i).copied();

    let timestamp = time::date_and_time(field(1)?, field(9)?);
    let latitude = coord::decode(field(3)?, field(4)?);
    let longitude = coord::decode(field(5)?, field(6)?);

    Some(Position::new(latitude, longitude, 0.0, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Utc};

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_gga_parsing() {
        let pos = parse(GGA).expect("GGA should parse");

        assert!(approx(pos.latitude(), 48.1173));
        assert!(approx(pos.longitude(), 11.5167));
        assert_eq!(pos.altitude_m(), 545.4);

        let ts = pos.timestamp();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 35, 19));
    }

    #[test]
    fn test_rmc_parsing() {
        let pos = parse(RMC).expect("RMC should parse");

        assert!(approx(pos.latitude(), 48.1173));
        assert!(approx(pos.longitude(), 11.5167));
        assert_eq!(pos.altitude_m(), 0.0);
        assert_eq!(pos.timestamp(), Utc.with_ymd_and_hms(2094, 3, 23, 12, 35, 19).unwrap());
    }

    #[test]
    fn test_other_talker_ids() {
        assert!(parse("$GNGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,").is_some());
        assert!(
            parse("$GNRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W").is_some()
        );
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let pos = parse("$GPGGA,123519,3352.000,S,15112.000,W,1,08,0.9,20.0,M,,M,,").unwrap();
        assert!(pos.latitude() <= 0.0);
        assert!(pos.longitude() <= 0.0);

        let pos = parse("$GPGGA,123519,3352.000,N,15112.000,E,1,08,0.9,20.0,M,,M,,").unwrap();
        assert!(pos.latitude() >= 0.0);
        assert!(pos.longitude() >= 0.0);
    }

    #[test]
    fn test_empty_altitude_defaults_to_zero() {
        let pos = parse("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,,M,46.9,M,,").unwrap();
        assert_eq!(pos.altitude_m(), 0.0);
        assert!(approx(pos.latitude(), 48.1173));
    }

    #[test]
    fn test_empty_position_fields_decode_to_zero() {
        let pos = parse("$GPGGA,,,,,,0,00,,,M,,M,,").unwrap();
        assert_eq!(pos.latitude(), 0.0);
        assert_eq!(pos.longitude(), 0.0);
        assert_eq!(pos.altitude_m(), 0.0);
    }

    #[test]
    fn test_rmc_bad_date_falls_back_to_now() {
        let before = Utc::now();
        let pos = parse("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,,003.1,W").unwrap();
        assert!(pos.timestamp() >= before);
        assert_eq!(pos.timestamp().year(), before.year());
    }

    #[test]
    fn test_invalid_sentence() {
        assert!(parse("$INVALID,123,456").is_none());
        assert!(parse("$GPGSV,3,1,12,01,40,083,46").is_none());
        assert!(parse("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,").is_none());
        assert!(parse("").is_none());
        assert!(parse("$").is_none());
    }

    #[test]
    fn test_truncated_sentence() {
        assert!(parse("$GPGGA,123519,4807.038,N,01131.000,E,1,08").is_none());
        assert!(parse("$GPRMC,123519,A,4807.038,N").is_none());
    }

    #[test]
    fn test_sentence_kind() {
        assert_eq!(SentenceKind::of(GGA), SentenceKind::Gga);
        assert_eq!(SentenceKind::of(RMC), SentenceKind::Rmc);
        assert_eq!(SentenceKind::of("$GPVTG,054.7,T"), SentenceKind::Other);
        assert_eq!(SentenceKind::of("GPGGA,1"), SentenceKind::Other);
    }
}
