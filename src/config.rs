// src/config.rs
//! Configuration management backed by a JSON file

use crate::{
    error::{LoggerError, Result},
    monitor::ReaderTiming,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub serial_port: Option<String>,
    pub baudrate: u32,
    pub output_dir: Option<PathBuf>,
    pub read_buffer_size: usize,
    pub idle_backoff_ms: u64,
    pub no_data_backoff_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let timing = ReaderTiming::default();
        Self {
            serial_port: None,
            baudrate: 115200,
            output_dir: None,
            read_buffer_size: timing.buffer_size,
            idle_backoff_ms: timing.idle_backoff.as_millis() as u64,
            no_data_backoff_ms: timing.no_data_backoff.as_millis() as u64,
            error_backoff_ms: timing.error_backoff.as_millis() as u64,
        }
    }
}

impl LoggerConfig {
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| LoggerError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| LoggerError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoggerError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(config_path, contents)
            .map_err(|e| LoggerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `$HOME/.config/nmea-logger/config.json`
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| LoggerError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("nmea-logger").join("config.json"))
    }

    /// Update serial port settings; `None` keeps the current value
    pub fn update_serial(&mut self, port: Option<String>, baudrate: Option<u32>) {
        if let Some(port) = port {
            self.serial_port = Some(port);
        }
        if let Some(baudrate) = baudrate {
            self.baudrate = baudrate;
        }
    }

    /// Where session logs go; the working directory unless configured
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn reader_timing(&self) -> ReaderTiming {
        ReaderTiming {
            idle_backoff: Duration::from_millis(self.idle_backoff_ms),
            no_data_backoff: Duration::from_millis(self.no_data_backoff_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            buffer_size: self.read_buffer_size.max(1),
        }
    }
}
