// src/gps/data.rs
//! Position fix and captured record types

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp layout used in the session log, e.g. `1994-03-23T12:35:19.000Z`.
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Header row written once at the top of every session log.
pub const RECORD_HEADER: &str = "timestamp,lat,lon,alt";

/// A single resolved position and time reading decoded from GGA or RMC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    altitude_m: f64,
    timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m,
            timestamp,
        }
    }

    /// Signed decimal degrees, north positive
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Signed decimal degrees, east positive
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Format coordinate for display
    pub fn format_coordinate(coord: f64) -> String {
        format!("{:>12.6}°", coord)
    }
}

/// One row of the session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedRecord {
    #[serde(serialize_with = "serialize_record_time")]
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl CapturedRecord {
    /// CSV line without the trailing newline.
    ///
    /// Numbers use `{:?}` so whole values keep their fractional part
    /// (`0.0`, not `0`).
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{:?},{:?},{:?}",
            self.timestamp.format(RECORD_TIME_FORMAT),
            self.latitude,
            self.longitude,
            self.altitude
        )
    }
}

fn serialize_record_time<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(RECORD_TIME_FORMAT))
}

impl From<Position> for CapturedRecord {
    fn from(pos: Position) -> Self {
        Self {
            timestamp: pos.timestamp,
            latitude: pos.latitude,
            longitude: pos.longitude,
            altitude: pos.altitude_m,
        }
    }
}

impl fmt::Display for CapturedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv_line())
    }
}
