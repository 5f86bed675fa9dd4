//! Microchip MCP41xxx/MCP42xxx 8 bit digital potentiometer.
//!
//! The device is write-only. The driver keeps a shadow of the wiper codes.
#![cfg_attr(not(test), no_std)]

use arbitrary_int::u2;
use bitbybit::{bitenum, bitfield};
use embedded_hal::spi::{self, SpiDevice};

#[bitenum(u2, exhaustive = true)]
#[derive(PartialEq, Debug)]
pub enum Op {
    Nop = 0,
    Write = 1,
    Shutdown = 2,
    _Nop = 3,
}

#[bitfield(u8, default = 0x00)]
#[derive(Debug, PartialEq)]
pub struct Command {
    /// Potentiometer select mask, bit 0 for P0 and bit 1 for P1.
    #[bits(0..=1, rw)]
    select: u2,
    #[bits(4..=5, rw)]
    op: Op,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pot {
    P0 = 0,
    P1 = 1,
}

impl Pot {
    fn mask(self) -> u2 {
        u2::new(1 << self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("SPI")]
    Bus(spi::ErrorKind),
}

impl<E: spi::Error> From<E> for Error {
    fn from(value: E) -> Self {
        Self::Bus(value.kind())
    }
}

#[derive(Clone, Debug)]
pub struct Mcp41xxx<B> {
    bus: B,
    wiper: [Option<u8>; 2],
}

impl<B: SpiDevice<u8>> Mcp41xxx<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            wiper: [None; 2],
        }
    }

    fn command(&mut self, op: Op, select: u2, data: u8) -> Result<(), Error> {
        let cmd = Command::default().with_op(op).with_select(select);
        Ok(self.bus.write(&[cmd.raw_value(), data])?)
    }

    /// Last code written to the wiper, `None` after power-up or shutdown.
    pub fn wiper(&self, pot: Pot) -> Option<u8> {
        self.wiper[pot as usize]
    }

    pub fn set_wiper(&mut self, pot: Pot, code: u8) -> Result<(), Error> {
        self.command(Op::Write, pot.mask(), code)?;
        self.wiper[pot as usize] = Some(code);
        Ok(())
    }

    /// Disconnect terminal A and short the wiper to terminal B.
    ///
    /// A subsequent [Mcp41xxx::set_wiper] leaves shutdown.
    pub fn shutdown(&mut self, pot: Pot) -> Result<(), Error> {
        self.command(Op::Shutdown, pot.mask(), 0)?;
        self.wiper[pot as usize] = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::spi::{ErrorType, Operation};

    #[derive(Default)]
    struct Recorder(Vec<u8>);

    impl ErrorType for Recorder {
        type Error = Infallible;
    }

    impl SpiDevice<u8> for Recorder {
        fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    self.0.extend_from_slice(data);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn write_wiper() {
        let mut pot = Mcp41xxx::new(Recorder::default());
        assert_eq!(pot.wiper(Pot::P0), None);
        pot.set_wiper(Pot::P0, 0xa5).unwrap();
        pot.set_wiper(Pot::P1, 3).unwrap();
        assert_eq!(pot.bus.0, [0x11, 0xa5, 0x12, 0x03]);
        assert_eq!(pot.wiper(Pot::P0), Some(0xa5));
    }

    #[test]
    fn shutdown_forgets_wiper() {
        let mut pot = Mcp41xxx::new(Recorder::default());
        pot.set_wiper(Pot::P0, 255).unwrap();
        pot.shutdown(Pot::P0).unwrap();
        assert_eq!(pot.bus.0, [0x11, 0xff, 0x21, 0x00]);
        assert_eq!(pot.wiper(Pot::P0), None);
    }
}
