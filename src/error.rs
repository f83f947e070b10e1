// src/error.rs
//! Error types for the NMEA logger

use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug)]
pub enum LoggerError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Config(String),
    Other(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "IO error: {}", e),
            LoggerError::Serial(e) => write!(f, "Serial error: {}", e),
            LoggerError::Json(e) => write!(f, "JSON error: {}", e),
            LoggerError::Config(msg) => write!(f, "Config error: {}", msg),
            LoggerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::Io(e) => Some(e),
            LoggerError::Serial(e) => Some(e),
            LoggerError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoggerError {
    fn from(error: std::io::Error) -> Self {
        LoggerError::Io(error)
    }
}

impl From<tokio_serial::Error> for LoggerError {
    fn from(error: tokio_serial::Error) -> Self {
        LoggerError::Serial(error)
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(error: serde_json::Error) -> Self {
        LoggerError::Json(error)
    }
}

/// Failure of a user-triggered capture.
#[derive(Debug)]
pub enum CaptureError {
    /// No GGA/RMC sentence has been parsed yet in this session.
    NoFixAvailable,
    /// The session log rejected the record.
    Persistence(std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoFixAvailable => write!(f, "No position available for capture"),
            CaptureError::Persistence(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Persistence(e) => Some(e),
            CaptureError::NoFixAvailable => None,
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(error: std::io::Error) -> Self {
        CaptureError::Persistence(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_capture_error_messages() {
        assert_eq!(
            CaptureError::NoFixAvailable.to_string(),
            "No position available for capture"
        );

        let err = CaptureError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "CSV error: disk full");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_logger_error_from_io() {
        let err: LoggerError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, LoggerError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn test_logger_error_from_serial() {
        let serial = tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "unplugged");
        let err: LoggerError = serial.into();
        assert!(matches!(err, LoggerError::Serial(_)));
        assert_eq!(err.to_string(), "Serial error: unplugged");
        assert!(err.source().is_some());
    }
}
