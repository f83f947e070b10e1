// src/lib.rs
//! NMEA Logger Library
//!
//! Reads NMEA-0183 sentences from a serial GNSS receiver, keeps the most
//! recent GGA/RMC position fix and appends it to a session CSV log on
//! request.

pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod monitor;

// Re-export main types for convenience
pub use capture::{Capture, CsvLog, FixStore, RecordSink, SessionLog};
pub use config::LoggerConfig;
pub use error::{CaptureError, LoggerError, Result};
pub use gps::{CapturedRecord, Position};
pub use monitor::{ReaderTiming, Session, Status, StatusSink, TransportSlot};
