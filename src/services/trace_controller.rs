use crate::models::SerialSettings;
use crate::services::DeviceError;
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

/// Upper bound on one response, in case the controller never goes quiet.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Port parameters shown by the "Get Arduino info" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDiagnostics {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: char,
    pub stop_bits: u8,
    pub flow_control: &'static str,
    pub timeout: Duration,
}

impl fmt::Display for SerialDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Serial(port='{}', baudrate={}, bytesize={}, parity='{}', stopbits={}, flow={}, timeout={:.1}s)",
            self.port,
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits,
            self.flow_control,
            self.timeout.as_secs_f64()
        )
    }
}

/// Byte link to the trace controller.
pub trait SerialLink: Send {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read what is available; a timeout surfaces as `ErrorKind::TimedOut`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), DeviceError>;

    fn diagnostics(&self) -> SerialDiagnostics;
}

impl SerialLink for Box<dyn serialport::SerialPort> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(self, bytes)?;
        self.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), DeviceError> {
        Ok(self.set_timeout(timeout)?)
    }

    fn diagnostics(&self) -> SerialDiagnostics {
        use serialport::{DataBits, FlowControl, Parity, StopBits};

        SerialDiagnostics {
            port: self.name().unwrap_or_else(|| "<unnamed>".to_string()),
            baud_rate: self.baud_rate().unwrap_or_default(),
            data_bits: match self.data_bits() {
                Ok(DataBits::Five) => 5,
                Ok(DataBits::Six) => 6,
                Ok(DataBits::Seven) => 7,
                Ok(DataBits::Eight) | Err(_) => 8,
            },
            parity: match self.parity() {
                Ok(Parity::Odd) => 'O',
                Ok(Parity::Even) => 'E',
                Ok(Parity::None) | Err(_) => 'N',
            },
            stop_bits: match self.stop_bits() {
                Ok(StopBits::Two) => 2,
                Ok(StopBits::One) | Err(_) => 1,
            },
            flow_control: match self.flow_control() {
                Ok(FlowControl::Software) => "software",
                Ok(FlowControl::Hardware) => "hardware",
                Ok(FlowControl::None) | Err(_) => "none",
            },
            timeout: self.timeout(),
        }
    }
}

/// Read lines until the link goes quiet for one read timeout.
///
/// A trailing line without a terminator is still returned. Line endings
/// (`\n` or `\r\n`) are stripped.
pub fn read_lines(link: &mut dyn SerialLink) -> Result<Vec<String>, DeviceError> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 256];

    while raw.len() < MAX_RESPONSE_BYTES {
        match link.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(split_lines(&raw))
}

fn split_lines(raw: &[u8]) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    body.split(|&b| b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .collect()
}

/// Serial collaborator for the Arduino trace controller.
pub struct TraceController {
    link: Box<dyn SerialLink>,
    read_timeout: Duration,
}

impl TraceController {
    pub fn new(link: Box<dyn SerialLink>, read_timeout: Duration) -> Self {
        Self { link, read_timeout }
    }

    /// Open the configured port (8N1, no flow control).
    pub fn open(settings: &SerialSettings) -> Result<Self, DeviceError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.read_timeout())
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| DeviceError::SerialUnavailable {
                port: settings.port.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Opened trace controller on {} at {} baud",
            settings.port,
            settings.baud_rate
        );
        Ok(Self::new(Box::new(port), settings.read_timeout()))
    }

    pub fn get_diagnostic_info(&self) -> SerialDiagnostics {
        self.link.diagnostics()
    }

    /// Write a command and collect the controller's reply lines.
    ///
    /// Whatever arrived before the read timeout is returned; silence gives an
    /// empty list rather than an error.
    pub fn set_parameters(&mut self, command: &[u8]) -> Result<Vec<String>, DeviceError> {
        self.link.set_read_timeout(self.read_timeout)?;
        self.link.write_all(command)?;
        read_lines(self.link.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted reads, then times out.
    struct ScriptedLink {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl ScriptedLink {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> (Self, Arc<Mutex<Vec<u8>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            let link = Self {
                reads: reads.into(),
                written: Arc::clone(&written),
            };
            (link, written)
        }
    }

    impl SerialLink for ScriptedLink {
        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            }
        }

        fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), DeviceError> {
            Ok(())
        }

        fn diagnostics(&self) -> SerialDiagnostics {
            SerialDiagnostics {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 115_200,
                data_bits: 8,
                parity: 'N',
                stop_bits: 1,
                flow_control: "none",
                timeout: Duration::from_secs(1),
            }
        }
    }

    #[test]
    fn test_set_parameters_writes_and_reads_lines() {
        let (link, written) = ScriptedLink::new(vec![
            Ok(b"n=2000\r\ni=2".to_vec()),
            Ok(b"48\r\nok\r\n".to_vec()),
        ]);
        let mut controller = TraceController::new(Box::new(link), Duration::from_secs(1));

        let lines = controller.set_parameters(b"n2000 i248 m").unwrap();

        assert_eq!(written.lock().unwrap().as_slice(), b"n2000 i248 m");
        assert_eq!(lines, vec!["n=2000", "i=248", "ok"]);
    }

    #[test]
    fn test_silence_returns_empty() {
        let (link, _written) = ScriptedLink::new(Vec::new());
        let mut controller = TraceController::new(Box::new(link), Duration::from_secs(1));

        assert!(controller.set_parameters(b"m").unwrap().is_empty());
    }

    #[test]
    fn test_partial_line_before_timeout_is_kept() {
        let (link, _written) = ScriptedLink::new(vec![Ok(b"ready\nbusy".to_vec())]);
        let mut controller = TraceController::new(Box::new(link), Duration::from_secs(1));

        assert_eq!(controller.set_parameters(b"m").unwrap(), vec!["ready", "busy"]);
    }

    #[test]
    fn test_hard_io_error_propagates() {
        let (link, _written) = ScriptedLink::new(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))]);
        let mut controller = TraceController::new(Box::new(link), Duration::from_secs(1));

        assert!(matches!(
            controller.set_parameters(b"m"),
            Err(DeviceError::Io(_))
        ));
    }

    #[test]
    fn test_diagnostics_display() {
        let (link, _written) = ScriptedLink::new(Vec::new());
        let controller = TraceController::new(Box::new(link), Duration::from_secs(1));

        assert_eq!(
            controller.get_diagnostic_info().to_string(),
            "Serial(port='/dev/ttyUSB0', baudrate=115200, bytesize=8, parity='N', stopbits=1, flow=none, timeout=1.0s)"
        );
    }

    #[test]
    fn test_open_missing_port_is_serial_unavailable() {
        let settings = SerialSettings {
            port: "/dev/rigpanel-no-such-port".to_string(),
            ..SerialSettings::default()
        };

        match TraceController::open(&settings) {
            Err(DeviceError::SerialUnavailable { port, .. }) => {
                assert_eq!(port, "/dev/rigpanel-no-such-port")
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opened a port that does not exist"),
        }
    }
}
