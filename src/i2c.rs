//! I²C implementation of the [`Transport`] seam over `embedded-hal`.

use embedded_hal::i2c::I2c;

use crate::transport::Transport;

/// I²C device address, selected by the SDO strap pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// SDO tied to GND.
    SdoGnd = 0x76,
    /// SDO tied to V_DDIO.
    SdoVddio = 0x77,
}

/// Register-addressed transport over a blocking `embedded-hal` I²C bus.
#[derive(Debug)]
pub struct I2cTransport<I2C> {
    bus: I2C,
    address: u8,
}

/// Most pairs a single bus write carries; longer blocks are split, order
/// preserved.
const PAIRS_PER_WRITE: usize = 8;

impl<I2C, E> I2cTransport<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(bus: I2C, address: Address) -> Self {
        Self {
            bus,
            address: address as u8,
        }
    }

    /// Releases the I²C bus without consuming it through [`Transport::close`].
    pub fn free(self) -> I2C {
        self.bus
    }
}

impl<I2C, E> Transport for I2cTransport<I2C>
where
    I2C: I2c<Error = E>,
{
    type Error = E;

    fn read_byte(&mut self, register: u8) -> Result<u8, E> {
        let mut buffer = [0];
        self.bus.write_read(self.address, &[register], &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.bus.write_read(self.address, &[register], buffer)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.bus.write(self.address, &[register, value])
    }

    fn write_block(&mut self, pairs: &[(u8, u8)]) -> Result<(), E> {
        // The sensor accepts interleaved register/value pairs in one write
        // cycle; flatten into a stack buffer.
        for chunk in pairs.chunks(PAIRS_PER_WRITE) {
            let mut flat = [0u8; PAIRS_PER_WRITE * 2];
            for (slot, &(register, value)) in flat.chunks_exact_mut(2).zip(chunk) {
                slot[0] = register;
                slot[1] = value;
            }
            self.bus.write(self.address, &flat[..chunk.len() * 2])?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), E> {
        // embedded-hal buses have no teardown; ownership release happens via
        // drop or `free`.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    #[test]
    fn read_byte_is_a_write_read() {
        let expectations = [Transaction::write_read(0x76, vec![0xD0], vec![0x60])];
        let mut transport = I2cTransport::new(Mock::new(&expectations), Address::SdoGnd);
        assert_eq!(transport.read_byte(0xD0).unwrap(), 0x60);
        transport.free().done();
    }

    #[test]
    fn read_block_uses_register_auto_increment() {
        let expectations = [Transaction::write_read(
            0x77,
            vec![0x88],
            vec![0x70, 0x6B, 0xA3],
        )];
        let mut transport = I2cTransport::new(Mock::new(&expectations), Address::SdoVddio);
        let mut buffer = [0u8; 3];
        transport.read_block(0x88, &mut buffer).unwrap();
        assert_eq!(buffer, [0x70, 0x6B, 0xA3]);
        transport.free().done();
    }

    #[test]
    fn write_block_flattens_pairs_into_one_write() {
        let expectations = [Transaction::write(
            0x76,
            vec![0xF5, 0x00, 0xF2, 0x01, 0xF4, 0x25],
        )];
        let mut transport = I2cTransport::new(Mock::new(&expectations), Address::SdoGnd);
        transport
            .write_block(&[(0xF5, 0x00), (0xF2, 0x01), (0xF4, 0x25)])
            .unwrap();
        transport.free().done();
    }
}
