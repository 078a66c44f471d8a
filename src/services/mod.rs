//! Services module - device collaborators behind the command panel.
//!
//! Both devices sit behind a small trait so the panel and its tests never
//! touch vendor APIs directly:
//!
//! - [`DataLogger`]: analog-input scans on the USB DAQ, over a [`DaqBackend`].
//!   [`Usb1608Fs`] is the `hidapi` implementation for the MCC USB-1608FS.
//! - [`TraceController`]: command/response exchange with the Arduino trace
//!   controller, over a [`SerialLink`]. `Box<dyn serialport::SerialPort>`
//!   implements it.
//!
//! Device handles are opened once at startup with [`DataLogger::open`] and
//! [`TraceController::open`]. A failed open yields a [`DeviceError`] that the
//! shell logs as a warning before continuing without that device.

pub mod acquisition;
pub mod trace_controller;
pub mod usb1608fs;

pub use acquisition::{DaqBackend, DataLogger, Gain, ScanConfig, ScanSummary};
pub use trace_controller::{SerialDiagnostics, SerialLink, TraceController};
pub use usb1608fs::Usb1608Fs;

use thiserror::Error;

/// Errors raised by the device collaborators
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("DAQ device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Serial device unavailable on {port}: {reason}")]
    SerialUnavailable { port: String, reason: String },

    #[error("USB HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan of {count} x {channels} channels does not fit in memory")]
    ScanTooLarge { count: u32, channels: usize },

    #[error("Short write to {device}: {written} of {expected} bytes")]
    ShortWrite {
        device: &'static str,
        written: usize,
        expected: usize,
    },
}
