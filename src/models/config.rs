use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration from `rigpanel.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub serial: SerialSettings,
    pub daq: DaqSettings,
    pub console: ConsoleSettings,
    pub panel: PanelSettings,
    pub logging: LoggingSettings,
}

/// Link to the Arduino trace controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
        }
    }
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Analog input scan on the USB-1608FS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaqSettings {
    /// Samples per second per channel
    pub sample_rate: f64,
    pub low_channel: u8,
    pub high_channel: u8,
    /// Scans to collect once the trigger fires
    pub sample_count: u32,
    /// Sync mode written with SetSync; 2 = gated clock slaved to the trigger input
    pub sync_mode: u8,
}

impl Default for DaqSettings {
    fn default() -> Self {
        Self {
            sample_rate: 4000.0,
            low_channel: 0,
            high_channel: 1,
            sample_count: 1000,
            sync_mode: 2,
        }
    }
}

/// GUI log console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub poll_interval_ms: u64,
    /// Oldest lines are dropped past this count
    pub max_lines: usize,
    pub line_format: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_lines: 5000,
            line_format: crate::logging::DEFAULT_LINE_FORMAT.to_string(),
        }
    }
}

impl ConsoleSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Command panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    /// Pre-filled trace controller command
    pub default_command: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            default_command: "n2000 i248 g0 h0 v1 r5 p40 m".to_string(),
        }
    }
}

/// Log file and terminal output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub log_prefix: String,
    pub debug: bool,
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "rigpanel".to_string(),
            debug: true,
            console_output: true,
        }
    }
}
