//! Bus transport abstraction.
//!
//! The driver speaks to the sensor exclusively through this trait, which
//! keeps the register protocol testable on the host and independent of the
//! concrete bus. An I²C implementation over `embedded-hal` is provided in
//! [`crate::i2c`]; SPI or a Linux character device fit behind the same seam.

/// Register-addressed byte transport to a single device.
///
/// Implementations target one fixed device address; the driver assumes
/// exclusive ownership of the handle for its lifetime.
pub trait Transport {
    /// Bus-level error type, surfaced unchanged through
    /// [`Error::Transport`](crate::error::Error::Transport).
    type Error;

    /// Reads one byte from `register`.
    fn read_byte(&mut self, register: u8) -> Result<u8, Self::Error>;

    /// Fills `buffer` starting at `register`, auto-incrementing.
    ///
    /// May split the transfer internally, but must either fill the whole
    /// buffer or fail.
    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes one byte to `register`.
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Writes the `(register, value)` pairs as one logical transaction, in
    /// the given order.
    ///
    /// Ordering is part of the contract: the sensor latches some registers
    /// only relative to writes of others.
    fn write_block(&mut self, pairs: &[(u8, u8)]) -> Result<(), Self::Error>;

    /// Releases the underlying bus handle.
    fn close(&mut self) -> Result<(), Self::Error>;
}
