#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

//! # BME280 Environmental Sensor Driver
//!
//! Driver for the Bosch BME280 combined temperature / pressure / humidity
//! sensor, speaking the register protocol over a pluggable [`Transport`].
//!
//! ## Features
//! - **Fixed-Point Compensation**: bit-exact vendor algorithm, no FPU needed
//!   until the final scaling to physical units.
//! - **Bus Agnostic**: the driver only sees the [`Transport`] trait; an I²C
//!   adapter over `embedded-hal` is included in [`i2c`].
//! - **Skipped Channels**: disabled channels come back as `NaN` instead of
//!   garbage.
//!
//! ## Units
//! - **Temperature**: degrees Celsius
//! - **Pressure**: Pascal (divide by 100 for hPa)
//! - **Humidity**: percent relative humidity
//!
//! ## Operation
//! Construction runs the full initialization protocol: identity check, soft
//! reset, calibration readout and configuration write. Afterwards every
//! [`Bme280::read_sample`] triggers (in forced mode) and reads one
//! measurement. The driver is synchronous and blocking; it owns its transport
//! handle exclusively and performs no retries beyond the documented status
//! polls.

pub mod calc;
pub mod calib;
pub mod i2c;
pub mod settings;
pub mod transport;

use embedded_hal::delay::DelayNs;

use crate::calib::Calibration;
use crate::error::{Error, Result};
use crate::settings::{Mode, Settings};
use crate::transport::Transport;

pub use crate::settings::SettingsBuilder;

/// Register map of the BME280.
mod regs {
    pub const ID: u8 = 0xD0;
    pub const RESET: u8 = 0xE0;
    pub const CALIB_LOW: u8 = 0x88;
    pub const CALIB_HIGH: u8 = 0xE1;
    pub const CTRL_HUM: u8 = 0xF2;
    pub const STATUS: u8 = 0xF3;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const CONFIG: u8 = 0xF5;
    pub const PRESS_MSB: u8 = 0xF7;

    pub const CHIP_ID: u8 = 0x60;
    pub const RESET_COMMAND: u8 = 0xB6;
    pub const STATUS_MEASURING: u8 = 0x08;
    pub const STATUS_IM_UPDATE: u8 = 0x01;

    /// Burst-read length covering press, temp and hum data registers.
    pub const SAMPLE_LEN: usize = 8;
}

/// Device settle time after a soft reset, before the bus responds again.
const RESET_SETTLE_MS: u32 = 300;
/// Poll interval while the device copies its calibration image after reset.
const CALIBRATION_POLL_MS: u32 = 100;
/// Poll interval while a forced conversion is in progress.
const MEASURING_POLL_MS: u32 = 1;

/// Error types for the BME280 driver.
pub mod error {
    /// Errors surfaced by the driver.
    ///
    /// There is no soft-error category: any failure aborts the running
    /// operation, and device state is undefined until the next successful
    /// `configure` or `read_sample`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Error<E> {
        /// Bus failure, wrapping the transport's own error. Never retried by
        /// the driver.
        Transport(E),
        /// The identity register did not report a BME280. Initialization
        /// stops before touching any other register.
        IdentityMismatch { expected: u8, actual: u8 },
        /// A status poll exceeded the configured attempt limit
        /// ([`Bme280::set_poll_limit`](crate::Bme280::set_poll_limit)).
        PollTimeout,
    }

    /// Result type alias for BME280 operations.
    pub type Result<T, E> = core::result::Result<T, Error<E>>;
}

/// One compensated measurement.
///
/// A channel that was skipped (oversampling [`None`](settings::Oversampling::None)
/// or the device reporting the skip sentinel) is `NaN`; the other channels are
/// unaffected. Pressure and humidity are also `NaN` whenever temperature is,
/// since their compensation needs the shared `t_fine` term.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Pascal.
    pub pressure: f32,
    /// Percent relative humidity.
    pub humidity: f32,
}

/// The BME280 driver.
///
/// Owns the bus transport and a delay provider for its lifetime. Constructed
/// fully initialized via [`Bme280::new`]; reconfigured (which re-runs the
/// whole initialization protocol) via [`Bme280::configure`].
#[derive(Debug)]
pub struct Bme280<T, D> {
    transport: T,
    delay: D,
    settings: Settings,
    calibration: Calibration,
    poll_limit: Option<u32>,
}

impl<T, D, E> Bme280<T, D>
where
    T: Transport<Error = E>,
    D: DelayNs,
{
    /// Initializes the sensor with the default configuration: forced mode,
    /// 1x oversampling on all channels, filter off, 0.5 ms standby.
    ///
    /// Runs the full protocol: identity check, soft reset, calibration
    /// readout, configuration write. The transport is closed again on every
    /// error path.
    ///
    /// # Errors
    /// [`Error::IdentityMismatch`] if the device on the bus is not a BME280,
    /// [`Error::Transport`] on any bus failure.
    pub fn new(transport: T, delay: D) -> Result<Self, E> {
        Self::with_settings(transport, delay, Settings::default())
    }

    /// Like [`Bme280::new`] but applies the given settings directly.
    pub fn with_settings(transport: T, delay: D, settings: Settings) -> Result<Self, E> {
        let mut driver = Self {
            transport,
            delay,
            settings,
            calibration: Calibration::default(),
            poll_limit: None,
        };
        if let Err(err) = driver.initialize() {
            let _ = driver.transport.close();
            return Err(err);
        }
        Ok(driver)
    }

    /// Applies a new configuration.
    ///
    /// This is a full reset, not an incremental update: the complete
    /// initialization protocol runs again, including the identity check and
    /// calibration readout.
    pub fn configure(&mut self, settings: Settings) -> Result<(), E> {
        self.settings = settings;
        self.initialize()
    }

    /// The currently applied settings.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// The calibration coefficients read during initialization.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Bounds the status-poll loops to `limit` read attempts each, surfacing
    /// [`Error::PollTimeout`] beyond that.
    ///
    /// `None` (the default) polls indefinitely, relying on the caller for an
    /// upper bound; the documented settle times are sub-second.
    pub fn set_poll_limit(&mut self, limit: Option<u32>) {
        self.poll_limit = limit;
    }

    /// Reads one compensated sample.
    ///
    /// In forced mode this re-arms a one-shot conversion (the device falls
    /// back to sleep after each one) and waits for it to finish. In normal
    /// mode the data registers are read as-is; the read may race an ongoing
    /// conversion, which is inherent to continuous sampling.
    pub fn read_sample(&mut self) -> Result<Sample, E> {
        if self.settings.mode == Mode::Forced {
            self.write_byte(regs::CTRL_MEAS, self.settings.ctrl_meas_byte())?;
            self.poll_status_clear(regs::STATUS_MEASURING, MEASURING_POLL_MS)?;
        }

        let mut raw = [0u8; regs::SAMPLE_LEN];
        self.read_block(regs::PRESS_MSB, &mut raw)?;

        // 20-bit pressure and temperature, 16-bit humidity. The MSB is
        // sign-extended so a skipped channel (0x80000 / 0x8000 on the wire)
        // lands exactly on the compensation sentinels.
        let adc_p = adc_20bit(raw[0], raw[1], raw[2]);
        let adc_t = adc_20bit(raw[3], raw[4], raw[5]);
        let adc_h = adc_16bit(raw[6], raw[7]);

        Ok(calc::compensate(adc_t, adc_p, adc_h, &self.calibration))
    }

    /// Releases the bus transport.
    pub fn close(mut self) -> Result<(), E> {
        self.transport.close().map_err(Error::Transport)
    }

    /// The initialization / configuration protocol. Shared by construction
    /// and [`Bme280::configure`].
    fn initialize(&mut self) -> Result<(), E> {
        let actual = self.read_byte(regs::ID)?;
        if actual != regs::CHIP_ID {
            return Err(Error::IdentityMismatch {
                expected: regs::CHIP_ID,
                actual,
            });
        }

        // Soft reset; nothing is acknowledged, and the device is not
        // bus-responsive until the settle time has passed.
        self.write_byte(regs::RESET, regs::RESET_COMMAND)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        // The device then copies its calibration image from NVM.
        self.poll_status_clear(regs::STATUS_IM_UPDATE, CALIBRATION_POLL_MS)?;

        let mut image = [0u8; calib::IMAGE_LEN];
        let (low, high) = image.split_at_mut(calib::LOW_BLOCK_LEN);
        self.read_block(regs::CALIB_LOW, low)?;
        self.read_block(regs::CALIB_HIGH, high)?;
        self.calibration = Calibration::from_image(&image);

        // One ordered transaction. ctrl_hum is only latched by the following
        // ctrl_meas write, so the order of the pairs is part of the protocol.
        self.transport
            .write_block(&[
                (regs::CONFIG, self.settings.config_byte()),
                (regs::CTRL_HUM, self.settings.ctrl_hum_byte()),
                (regs::CTRL_MEAS, self.settings.ctrl_meas_byte()),
            ])
            .map_err(Error::Transport)
    }

    /// Polls the status register until `mask` reads clear, sleeping
    /// `interval_ms` between attempts.
    fn poll_status_clear(&mut self, mask: u8, interval_ms: u32) -> Result<(), E> {
        let mut attempts = 0u32;
        loop {
            if self.read_byte(regs::STATUS)? & mask == 0 {
                return Ok(());
            }
            attempts += 1;
            if let Some(limit) = self.poll_limit {
                if attempts >= limit {
                    return Err(Error::PollTimeout);
                }
            }
            self.delay.delay_ms(interval_ms);
        }
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, E> {
        self.transport.read_byte(register).map_err(Error::Transport)
    }

    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.transport
            .read_block(register, buffer)
            .map_err(Error::Transport)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.transport
            .write_byte(register, value)
            .map_err(Error::Transport)
    }
}

/// Reassembles a 20-bit ADC word from msb/lsb/xlsb, sign-extending the MSB.
fn adc_20bit(msb: u8, lsb: u8, xlsb: u8) -> i32 {
    ((i32::from(msb as i8) << 8 | i32::from(lsb)) << 4) | i32::from(xlsb >> 4)
}

/// Reassembles the 16-bit humidity ADC word, sign-extending the MSB.
fn adc_16bit(msb: u8, lsb: u8) -> i32 {
    i32::from(i16::from_be_bytes([msb, lsb]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adc_decode_matches_register_layout() {
        // 0x655AC: msb 0x65, lsb 0x5A, xlsb high nibble 0xC
        assert_eq!(adc_20bit(0x65, 0x5A, 0xC0), 415148);
        assert_eq!(adc_20bit(0x7E, 0xED, 0x00), 519888);
        assert_eq!(adc_16bit(0x71, 0xC8), 29000);
        // Low nibble of xlsb is reserved and must be ignored.
        assert_eq!(adc_20bit(0x65, 0x5A, 0xCF), 415148);
    }

    #[test]
    fn skipped_channels_decode_to_sentinels() {
        assert_eq!(adc_20bit(0x80, 0x00, 0x00), calc::SKIPPED_TP);
        assert_eq!(adc_16bit(0x80, 0x00), calc::SKIPPED_H);
    }
}
