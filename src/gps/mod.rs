// src/gps/mod.rs
//! NMEA decoding: framing, sentence parsing and field codecs

pub mod coord;
pub mod data;
pub mod framer;
pub mod nmea;
pub mod time;

pub use data::{CapturedRecord, Position};
pub use framer::{FrameBuffer, Ingest, LineOutcome};
pub use nmea::SentenceKind;
