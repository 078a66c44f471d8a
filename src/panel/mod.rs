// Command panel - one button, one device call, one log line
//
// Each button maps to a `PanelAction`. `execute` performs the single device
// call and returns the summary text; `dispatch` is the panel boundary that
// turns the outcome (including a panic) into a log line so nothing escapes
// into the GUI event loop.

use crate::models::SerialSettings;
use crate::services::{DataLogger, DeviceError, TraceController};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// A button on the command panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    /// "Serial to Arduino >" with the command text
    SendSerial(String),
    /// "Get DAQ info"
    DaqInfo,
    /// "Get Arduino info"
    SerialInfo,
    /// "ready DAQ"
    ReadyDaq,
    /// "reset DAQ"
    ResetDaq,
}

impl PanelAction {
    pub fn label(&self) -> &'static str {
        match self {
            PanelAction::SendSerial(_) => "Serial to Arduino",
            PanelAction::DaqInfo => "Get DAQ info",
            PanelAction::SerialInfo => "Get Arduino info",
            PanelAction::ReadyDaq => "ready DAQ",
            PanelAction::ResetDaq => "reset DAQ",
        }
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors surfaced at the panel boundary
#[derive(Error, Debug)]
pub enum PanelError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Holds the device handles for the lifetime of the window.
///
/// Either handle may be absent when the device could not be opened at
/// startup; actions against it then fail with a logged error.
pub struct CommandPanel {
    daq: Option<DataLogger>,
    trace: Option<TraceController>,
    /// Port the trace controller was configured on, for error messages
    serial_port: String,
}

impl CommandPanel {
    pub fn new(daq: Option<DataLogger>, trace: Option<TraceController>) -> Self {
        Self {
            daq,
            trace,
            serial_port: SerialSettings::default().port,
        }
    }

    /// Name the configured serial port in "not connected" errors.
    pub fn with_serial_port(mut self, port: impl Into<String>) -> Self {
        self.serial_port = port.into();
        self
    }

    pub fn has_daq(&self) -> bool {
        self.daq.is_some()
    }

    pub fn has_trace_controller(&self) -> bool {
        self.trace.is_some()
    }

    /// Run one action against its device and return the summary line.
    pub fn execute(&mut self, action: &PanelAction) -> Result<String, PanelError> {
        match action {
            PanelAction::SendSerial(command) => {
                let response = self.trace_mut()?.set_parameters(command.as_bytes())?;
                Ok(format!("{:?}", response))
            }
            PanelAction::SerialInfo => Ok(self.trace_mut()?.get_diagnostic_info().to_string()),
            PanelAction::DaqInfo => {
                let (product, serial_number) = self.daq_mut()?.device_info()?;
                Ok(format!("Prod: {}, SN: {}", product, serial_number))
            }
            PanelAction::ReadyDaq => {
                let daq = self.daq_mut()?;
                tracing::debug!("DAQ waiting for trigger.");
                Ok(daq.ready_analog_scan()?.to_string())
            }
            PanelAction::ResetDaq => Ok(self.daq_mut()?.reset()?),
        }
    }

    /// Execute an action and log its outcome; never fails or panics outward.
    ///
    /// Outgoing serial commands are logged at INFO before they are sent.
    /// The result is one INFO line, or one ERROR line on failure.
    pub fn dispatch(&mut self, action: PanelAction) {
        if let PanelAction::SendSerial(command) = &action {
            tracing::info!("> {}", command);
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&action)))
            .unwrap_or_else(|payload| Err(PanelError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(summary) => tracing::info!("{}", summary),
            Err(e) => tracing::error!("{} failed: {}", action, e),
        }
    }

    fn daq_mut(&mut self) -> Result<&mut DataLogger, DeviceError> {
        self.daq.as_mut().ok_or_else(|| {
            DeviceError::DeviceUnavailable("no USB-1608FS connected".to_string())
        })
    }

    fn trace_mut(&mut self) -> Result<&mut TraceController, DeviceError> {
        let port = &self.serial_port;
        self.trace
            .as_mut()
            .ok_or_else(|| DeviceError::SerialUnavailable {
                port: port.clone(),
                reason: "not connected".to_string(),
            })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
