// MCC USB-1608FS backend over hidapi
//
// The module is a HID-class device. Commands are output reports whose report
// ID is the command code; scan data comes back as 64-byte input reports.

use crate::services::DeviceError;
use crate::services::acquisition::{CHANNEL_COUNT, DaqBackend, ScanConfig};
use hidapi::{HidApi, HidDevice};

pub const MCC_VENDOR_ID: u16 = 0x09db;
pub const USB_1608FS_PRODUCT_ID: u16 = 0x007d;

const AIN_SCAN: u8 = 0x11;
const AIN_STOP: u8 = 0x12;
const ALOAD_QUEUE: u8 = 0x13;
const SET_SYNC: u8 = 0x43;

const REPORT_LEN: usize = 64;
/// Samples carried by one input report; the last two bytes are a report counter.
const SAMPLES_PER_REPORT: usize = 31;
const TIMER_CLOCK_HZ: f64 = 10_000_000.0;
const MAX_PRESCALE: u8 = 8;
/// Upper bound on samples reserved up front; larger scans grow as data arrives.
const MAX_PREALLOCATED_SAMPLES: usize = REPORT_LEN * 64;

/// Pacer timer settings for a sample rate: (prescale exponent, preload).
///
/// The smallest prescale whose preload fits in 16 bits wins; rates too slow
/// for the largest prescale (or not positive) get the slowest timer.
pub fn timer_settings(sample_rate: f64) -> (u8, u16) {
    if sample_rate.is_nan() || sample_rate <= 0.0 {
        return (MAX_PRESCALE, u16::MAX);
    }
    for prescale in 0..=MAX_PRESCALE {
        let preload = TIMER_CLOCK_HZ / (sample_rate * f64::from(1u32 << prescale));
        if preload <= f64::from(u16::MAX) {
            return (prescale, preload.round().max(1.0) as u16);
        }
    }
    (MAX_PRESCALE, u16::MAX)
}

/// ALOAD_QUEUE report: one gain code per channel.
pub fn gain_queue_report(config: &ScanConfig) -> [u8; CHANNEL_COUNT + 1] {
    let mut report = [0u8; CHANNEL_COUNT + 1];
    report[0] = ALOAD_QUEUE;
    for (slot, gain) in report[1..].iter_mut().zip(config.gains.iter()) {
        *slot = gain.code();
    }
    report
}

/// AIN_SCAN report: channel range, scan count, pacer timer and option bits.
pub fn scan_report(config: &ScanConfig) -> [u8; 11] {
    let (prescale, preload) = timer_settings(config.sample_rate);
    let count = config.count.to_le_bytes();
    let preload = preload.to_le_bytes();
    [
        AIN_SCAN,
        config.low_channel,
        config.high_channel,
        count[0],
        count[1],
        count[2],
        count[3],
        prescale,
        preload[0],
        preload[1],
        config.options.bits(),
    ]
}

/// Total samples a scan produces: scans × channels.
pub fn scan_sample_total(config: &ScanConfig) -> Result<usize, DeviceError> {
    usize::try_from(config.count)
        .ok()
        .and_then(|count| count.checked_mul(config.channels()))
        .ok_or(DeviceError::ScanTooLarge {
            count: config.count,
            channels: config.channels(),
        })
}

/// Capacity to reserve before the first report arrives.
pub fn preallocated_samples(total: usize) -> usize {
    total.min(MAX_PREALLOCATED_SAMPLES)
}

/// Signed little-endian samples of one input report, at most `limit` of them.
pub fn decode_samples(report: &[u8], limit: usize) -> impl Iterator<Item = i16> + '_ {
    report
        .chunks_exact(2)
        .take(SAMPLES_PER_REPORT.min(limit))
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
}

/// HID handle to a USB-1608FS.
pub struct Usb1608Fs {
    _api: HidApi,
    device: HidDevice,
}

impl Usb1608Fs {
    /// Open the first USB-1608FS found on the bus.
    pub fn open() -> Result<Self, DeviceError> {
        let api = HidApi::new()?;
        let device = api
            .open(MCC_VENDOR_ID, USB_1608FS_PRODUCT_ID)
            .map_err(|e| {
                DeviceError::DeviceUnavailable(format!(
                    "no USB-1608FS ({:04x}:{:04x}) found: {}",
                    MCC_VENDOR_ID, USB_1608FS_PRODUCT_ID, e
                ))
            })?;

        tracing::info!("Opened USB-1608FS");
        Ok(Self { _api: api, device })
    }

    fn send(&self, report: &[u8]) -> Result<(), DeviceError> {
        let written = self.device.write(report)?;
        if written < report.len() {
            return Err(DeviceError::ShortWrite {
                device: "USB-1608FS",
                written,
                expected: report.len(),
            });
        }
        Ok(())
    }
}

impl DaqBackend for Usb1608Fs {
    fn product(&self) -> Result<String, DeviceError> {
        Ok(self.device.get_product_string()?.unwrap_or_default())
    }

    fn serial_number(&self) -> Result<String, DeviceError> {
        Ok(self.device.get_serial_number_string()?.unwrap_or_default())
    }

    fn set_sync(&mut self, mode: u8) -> Result<(), DeviceError> {
        self.send(&[SET_SYNC, mode])
    }

    fn ain_scan(&mut self, config: &ScanConfig) -> Result<Vec<i16>, DeviceError> {
        let total = scan_sample_total(config)?;

        self.send(&gain_queue_report(config))?;
        self.send(&scan_report(config))?;
        tracing::debug!("AInScan armed for {} samples, waiting for trigger", total);

        let mut data = Vec::with_capacity(preallocated_samples(total));
        let mut report = [0u8; REPORT_LEN];
        while data.len() < total {
            // Blocks until the trigger input starts the pacer
            let read = self.device.read(&mut report)?;
            data.extend(decode_samples(&report[..read], total - data.len()));
        }

        Ok(data)
    }

    fn ain_stop(&mut self) -> Result<(), DeviceError> {
        self.send(&[AIN_STOP])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DaqSettings;
    use crate::services::acquisition::{Gain, ScanOptions};

    #[test]
    fn test_timer_settings_default_rate() {
        assert_eq!(timer_settings(4000.0), (0, 2500));
    }

    #[test]
    fn test_timer_settings_needs_prescale() {
        // 10 MHz / 100 Hz does not fit in 16 bits without prescaling
        assert_eq!(timer_settings(100.0), (1, 50_000));
    }

    #[test]
    fn test_timer_settings_clamps_slow_rates() {
        assert_eq!(timer_settings(0.01), (MAX_PRESCALE, u16::MAX));
        assert_eq!(timer_settings(0.0), (MAX_PRESCALE, u16::MAX));
    }

    #[test]
    fn test_scan_report_layout() {
        let config = ScanConfig::from(&DaqSettings::default());
        let report = scan_report(&config);

        assert_eq!(report[0], AIN_SCAN);
        assert_eq!(report[1..3], [0, 1]);
        assert_eq!(u32::from_le_bytes([report[3], report[4], report[5], report[6]]), 1000);
        assert_eq!(report[7], 0);
        assert_eq!(u16::from_le_bytes([report[8], report[9]]), 2500);
        assert_eq!(report[10], ScanOptions::EXTERNAL_SYNC.bits());
    }

    #[test]
    fn test_gain_queue_report() {
        let mut config = ScanConfig::from(&DaqSettings::default());
        config.gains[1] = Gain::Bp2V;
        let report = gain_queue_report(&config);

        assert_eq!(report[0], ALOAD_QUEUE);
        assert_eq!(report[1], Gain::Bp10V.code());
        assert_eq!(report[2], Gain::Bp2V.code());
    }

    #[test]
    fn test_decode_samples_respects_limit() {
        let mut report = [0u8; REPORT_LEN];
        report[0..2].copy_from_slice(&(-2i16).to_le_bytes());
        report[2..4].copy_from_slice(&300i16.to_le_bytes());

        let samples: Vec<i16> = decode_samples(&report, 2).collect();
        assert_eq!(samples, vec![-2, 300]);

        // Counter bytes at the end are never decoded as samples
        assert_eq!(decode_samples(&report, usize::MAX).count(), SAMPLES_PER_REPORT);
    }

    #[test]
    fn test_scan_sample_total() {
        let mut config = ScanConfig::from(&DaqSettings::default());
        assert_eq!(scan_sample_total(&config).unwrap(), 2000);

        config.count = u32::MAX;
        config.high_channel = 7;
        // Fits on 64-bit targets; 32-bit targets report ScanTooLarge
        match scan_sample_total(&config) {
            Ok(total) => assert_eq!(total as u64, u64::from(u32::MAX) * 8),
            Err(e) => assert!(matches!(e, DeviceError::ScanTooLarge { channels: 8, .. })),
        }
    }

    #[test]
    fn test_preallocation_is_capped() {
        assert_eq!(preallocated_samples(2000), 2000);
        assert_eq!(preallocated_samples(usize::MAX), MAX_PREALLOCATED_SAMPLES);
    }
}
