//! Operating settings and their register encodings.
//!
//! Every enum here carries the exact bit code the BME280 expects in its
//! control registers. The codes are written out as literal tables; in
//! particular the [`StandbyTime`] codes are not in duration order, so deriving
//! them from variant position would silently program the wrong standby
//! interval.

/// Power / measurement mode (`mode[1:0]` in `ctrl_meas`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// No measurements, lowest power. Registers remain readable.
    Sleep,
    /// One measurement cycle per trigger, then automatic return to sleep.
    #[default]
    Forced,
    /// Continuous free-running measurement on the standby cadence.
    Normal,
}

impl Mode {
    pub(crate) fn bits(self) -> u8 {
        match self {
            Mode::Sleep => 0b00,
            Mode::Forced => 0b01,
            Mode::Normal => 0b11,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Mode::Sleep),
            0b01 => Some(Mode::Forced),
            0b11 => Some(Mode::Normal),
            _ => None,
        }
    }
}

/// Per-channel oversampling (`osrs_t`, `osrs_p`, `osrs_h`, 3 bits each).
///
/// Higher oversampling reduces noise through hardware averaging at the cost
/// of measurement time. `None` disables the channel entirely; the device then
/// reports the skip sentinel for it and the compensated value comes back as
/// `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    /// Channel disabled, no measurement performed.
    None,
    #[default]
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    pub(crate) fn bits(self) -> u8 {
        match self {
            Oversampling::None => 0b000,
            Oversampling::X1 => 0b001,
            Oversampling::X2 => 0b010,
            Oversampling::X4 => 0b011,
            Oversampling::X8 => 0b100,
            Oversampling::X16 => 0b101,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Oversampling::None),
            0b001 => Some(Oversampling::X1),
            0b010 => Some(Oversampling::X2),
            0b011 => Some(Oversampling::X4),
            0b100 => Some(Oversampling::X8),
            0b101 => Some(Oversampling::X16),
            _ => None,
        }
    }
}

/// IIR filter coefficient (`filter[2:0]` in `config`).
///
/// Smooths short-term disturbances in pressure and temperature readings.
/// Has no effect on humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    #[default]
    Off,
    X2,
    X4,
    X8,
    X16,
}

impl Filter {
    pub(crate) fn bits(self) -> u8 {
        match self {
            Filter::Off => 0b000,
            Filter::X2 => 0b001,
            Filter::X4 => 0b010,
            Filter::X8 => 0b011,
            Filter::X16 => 0b100,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Filter::Off),
            0b001 => Some(Filter::X2),
            0b010 => Some(Filter::X4),
            0b011 => Some(Filter::X8),
            0b100 => Some(Filter::X16),
            _ => None,
        }
    }
}

/// Standby duration between measurements in [`Mode::Normal`]
/// (`t_sb[2:0]` in `config`).
///
/// The register codes are not monotonic in duration: 10 ms and 20 ms joined
/// the family late and took the two highest codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StandbyTime {
    /// 0.5 ms
    #[default]
    Ms0_5,
    /// 10 ms
    Ms10,
    /// 20 ms
    Ms20,
    /// 62.5 ms
    Ms62_5,
    /// 125 ms
    Ms125,
    /// 250 ms
    Ms250,
    /// 500 ms
    Ms500,
    /// 1000 ms
    Ms1000,
}

impl StandbyTime {
    pub(crate) fn bits(self) -> u8 {
        match self {
            StandbyTime::Ms0_5 => 0b000,
            StandbyTime::Ms10 => 0b110,
            StandbyTime::Ms20 => 0b111,
            StandbyTime::Ms62_5 => 0b001,
            StandbyTime::Ms125 => 0b010,
            StandbyTime::Ms250 => 0b011,
            StandbyTime::Ms500 => 0b100,
            StandbyTime::Ms1000 => 0b101,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(StandbyTime::Ms0_5),
            0b110 => Some(StandbyTime::Ms10),
            0b111 => Some(StandbyTime::Ms20),
            0b001 => Some(StandbyTime::Ms62_5),
            0b010 => Some(StandbyTime::Ms125),
            0b011 => Some(StandbyTime::Ms250),
            0b100 => Some(StandbyTime::Ms500),
            0b101 => Some(StandbyTime::Ms1000),
            _ => None,
        }
    }
}

/// Complete operating configuration applied by
/// [`Bme280::configure`](crate::Bme280::configure).
///
/// The default matches the configuration the driver applies on construction:
/// forced mode, 1x oversampling on all channels, filter off, 0.5 ms standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub mode: Mode,
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    pub filter: Filter,
    pub standby_time: StandbyTime,
}

impl Settings {
    /// Register value for `config` (0xF5): standby and filter.
    /// Bits 1:0 are reserved and stay zero.
    pub fn config_byte(&self) -> u8 {
        self.standby_time.bits() << 5 | self.filter.bits() << 3
    }

    /// Register value for `ctrl_hum` (0xF2): humidity oversampling.
    ///
    /// The device only latches this register on the next `ctrl_meas` write,
    /// so it must always be written before [`Self::ctrl_meas_byte`].
    pub fn ctrl_hum_byte(&self) -> u8 {
        self.humidity_oversampling.bits()
    }

    /// Register value for `ctrl_meas` (0xF4): temperature and pressure
    /// oversampling plus the mode.
    pub fn ctrl_meas_byte(&self) -> u8 {
        self.temperature_oversampling.bits() << 5
            | self.pressure_oversampling.bits() << 3
            | self.mode.bits()
    }
}

/// Builder for [`Settings`].
///
/// # Example
/// ```rust
/// use bme280_driver::settings::{Filter, Mode, Oversampling, SettingsBuilder, StandbyTime};
///
/// let settings = SettingsBuilder::new()
///     .mode(Mode::Normal)
///     .pressure_oversampling(Oversampling::X4)
///     .filter(Filter::X16)
///     .standby_time(StandbyTime::Ms125)
///     .build();
/// assert_eq!(settings.config_byte(), 0b010_100_00);
/// ```
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn temperature_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.temperature_oversampling = os;
        self
    }

    pub fn pressure_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.pressure_oversampling = os;
        self
    }

    pub fn humidity_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.humidity_oversampling = os;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.settings.filter = filter;
        self
    }

    pub fn standby_time(mut self, standby: StandbyTime) -> Self {
        self.settings.standby_time = standby;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
