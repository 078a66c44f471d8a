use crate::models::DaqSettings;
use crate::services::DeviceError;
use crate::services::usb1608fs::Usb1608Fs;
use std::fmt;

/// Number of analog input channels on the module.
pub const CHANNEL_COUNT: usize = 8;

/// Bipolar input range, in the order of the device's gain codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    #[default]
    Bp10V,
    Bp5V,
    Bp2_5V,
    Bp2V,
    Bp1_25V,
    Bp1V,
    Bp0_625V,
    Bp0_3125V,
}

impl Gain {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Full-scale input voltage for this range.
    pub fn full_scale(self) -> f64 {
        match self {
            Gain::Bp10V => 10.0,
            Gain::Bp5V => 5.0,
            Gain::Bp2_5V => 2.5,
            Gain::Bp2V => 2.0,
            Gain::Bp1_25V => 1.25,
            Gain::Bp1V => 1.0,
            Gain::Bp0_625V => 0.625,
            Gain::Bp0_3125V => 0.3125,
        }
    }

    /// Convert a raw signed 16-bit sample to volts.
    pub fn volts(self, raw: i16) -> f64 {
        f64::from(raw) * self.full_scale() / f64::from(i16::MAX)
    }
}

/// Scan option bits as understood by the module's AInScan command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOptions(u8);

impl ScanOptions {
    pub const EXTERNAL_TRIGGER: Self = Self(0x08);
    pub const EXTERNAL_SYNC: Self = Self(0x10);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Fixed scan parameters, decided once when the logger is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub low_channel: u8,
    pub high_channel: u8,
    /// Gain per channel, indexed by channel number
    pub gains: [Gain; CHANNEL_COUNT],
    pub sample_rate: f64,
    /// Scans to collect; each scan reads every channel once
    pub count: u32,
    pub options: ScanOptions,
    pub sync_mode: u8,
}

impl ScanConfig {
    pub fn channels(&self) -> usize {
        usize::from(self.high_channel.saturating_sub(self.low_channel)) + 1
    }

    /// Gain for the channel that produced sample `index` of an interleaved scan.
    pub fn gain_for_sample(&self, index: usize) -> Gain {
        let channel = usize::from(self.low_channel) + index % self.channels();
        self.gains.get(channel).copied().unwrap_or_default()
    }
}

impl From<&DaqSettings> for ScanConfig {
    fn from(settings: &DaqSettings) -> Self {
        Self {
            low_channel: settings.low_channel,
            high_channel: settings.high_channel,
            gains: [Gain::Bp10V; CHANNEL_COUNT],
            sample_rate: settings.sample_rate,
            count: settings.sample_count,
            // External sync, rising edge: the trace controller's trigger
            // pulse clocks the conversions
            options: ScanOptions::EXTERNAL_SYNC,
            sync_mode: settings.sync_mode,
        }
    }
}

/// Vendor seam for the acquisition module.
#[cfg_attr(test, mockall::automock)]
pub trait DaqBackend: Send {
    fn product(&self) -> Result<String, DeviceError>;

    fn serial_number(&self) -> Result<String, DeviceError>;

    fn set_sync(&mut self, mode: u8) -> Result<(), DeviceError>;

    /// Run a scan and block until `config.count` scans have arrived.
    fn ain_scan(&mut self, config: &ScanConfig) -> Result<Vec<i16>, DeviceError>;

    fn ain_stop(&mut self) -> Result<(), DeviceError>;
}

/// Outcome of one triggered scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub samples: usize,
    pub low_channel: u8,
    pub high_channel: u8,
    pub min_volts: f64,
    pub max_volts: f64,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.samples == 0 {
            return write!(
                f,
                "DAQ scan complete: no samples on channels {}-{}",
                self.low_channel, self.high_channel
            );
        }
        write!(
            f,
            "DAQ scan complete: {} samples on channels {}-{} ({:.3} V .. {:.3} V)",
            self.samples, self.low_channel, self.high_channel, self.min_volts, self.max_volts
        )
    }
}

/// Acquisition collaborator for the USB DAQ module.
pub struct DataLogger {
    backend: Box<dyn DaqBackend>,
    config: ScanConfig,
}

impl DataLogger {
    /// Wrap a backend and slave its clock to the external trigger.
    pub fn new(mut backend: Box<dyn DaqBackend>, settings: &DaqSettings) -> Result<Self, DeviceError> {
        let config = ScanConfig::from(settings);
        backend.set_sync(config.sync_mode)?;

        tracing::debug!(
            "DAQ configured: channels {}-{}, {} Hz, options {:#04x}, sync {}",
            config.low_channel,
            config.high_channel,
            config.sample_rate,
            config.options.bits(),
            config.sync_mode
        );

        Ok(Self { backend, config })
    }

    /// Open the first USB-1608FS on the bus.
    pub fn open(settings: &DaqSettings) -> Result<Self, DeviceError> {
        let backend = Usb1608Fs::open()?;
        Self::new(Box::new(backend), settings)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Product name and serial number as reported by the device.
    pub fn device_info(&self) -> Result<(String, String), DeviceError> {
        let product = self.backend.product()?;
        let serial_number = self.backend.serial_number()?;
        Ok((product, serial_number))
    }

    /// Arm a trigger-gated scan and block until it completes.
    ///
    /// Every sample is dumped at DEBUG as raw hex and volts.
    pub fn ready_analog_scan(&mut self) -> Result<ScanSummary, DeviceError> {
        let data = match self.backend.ain_scan(&self.config) {
            Ok(data) => data,
            Err(e) => {
                // Leave the module idle even when the scan itself failed
                if let Err(stop_err) = self.backend.ain_stop() {
                    tracing::warn!("AInStop after failed scan also failed: {}", stop_err);
                }
                return Err(e);
            }
        };

        let mut min_volts = f64::INFINITY;
        let mut max_volts = f64::NEG_INFINITY;
        for (i, raw) in data.iter().copied().enumerate() {
            let volts = self.config.gain_for_sample(i).volts(raw);
            min_volts = min_volts.min(volts);
            max_volts = max_volts.max(volts);
            tracing::debug!("data[{}] = {:#06x}\t{:.3} V", i, raw, volts);
        }

        self.backend.ain_stop()?;

        Ok(ScanSummary {
            samples: data.len(),
            low_channel: self.config.low_channel,
            high_channel: self.config.high_channel,
            min_volts: if data.is_empty() { 0.0 } else { min_volts },
            max_volts: if data.is_empty() { 0.0 } else { max_volts },
        })
    }

    /// Stop any scan in progress.
    pub fn reset(&mut self) -> Result<String, DeviceError> {
        self.backend.ain_stop()?;
        Ok("DAQ reset.".to_string())
    }
}
