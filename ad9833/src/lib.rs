#![cfg_attr(not(test), no_std)]

use arbitrary_int::{u12, u14, u28, Number};
use bitbybit::{bitenum, bitfield};
use embedded_hal::spi::{self, SpiDevice};
use num_traits::float::FloatCore;

/// Register selected by the two (three for phase) most significant bits of a
/// serial word.
#[bitenum(u2, exhaustive = true)]
#[derive(PartialEq, Debug)]
pub enum Target {
    Control = 0,
    Freq0 = 1,
    Freq1 = 2,
    Phase = 3,
}

#[bitfield(u16, default = 0x0000)]
#[derive(Debug, PartialEq)]
pub struct Control {
    #[bit(1, rw)]
    mode: bool,
    #[bit(3, rw)]
    div2: bool,
    #[bit(5, rw)]
    opbiten: bool,
    #[bit(6, rw)]
    sleep12: bool,
    #[bit(7, rw)]
    sleep1: bool,
    #[bit(8, rw)]
    reset: bool,
    #[bit(10, rw)]
    pselect: bool,
    #[bit(11, rw)]
    fselect: bool,
    #[bit(12, rw)]
    hlb: bool,
    #[bit(13, rw)]
    b28: bool,
    #[bits(14..=15, rw)]
    target: Target,
}

#[bitfield(u16)]
#[derive(Debug, PartialEq)]
pub struct FreqWord {
    #[bits(0..=13, rw)]
    data: u14,
    #[bits(14..=15, rw)]
    target: Target,
}

#[bitfield(u16, default = 0x0000)]
#[derive(Debug, PartialEq)]
pub struct PhaseWord {
    #[bits(0..=11, rw)]
    data: u12,
    #[bit(13, rw)]
    phase1: bool,
    #[bits(14..=15, rw)]
    target: Target,
}

/// Frequency and phase register bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Register {
    #[default]
    Zero,
    One,
}

impl Register {
    fn freq_target(self) -> Target {
        match self {
            Self::Zero => Target::Freq0,
            Self::One => Target::Freq1,
        }
    }
}

/// Output waveform as routed to VOUT.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    /// DAC data MSB, full output frequency.
    Square,
    /// DAC data MSB, half output frequency.
    HalfSquare,
}

impl Control {
    pub fn with_waveform(self, waveform: Waveform) -> Self {
        match waveform {
            Waveform::Sine => {
                self.with_opbiten(false).with_mode(false).with_div2(false)
            }
            Waveform::Triangle => {
                self.with_opbiten(false).with_mode(true).with_div2(false)
            }
            Waveform::Square => {
                self.with_opbiten(true).with_mode(false).with_div2(true)
            }
            Waveform::HalfSquare => {
                self.with_opbiten(true).with_mode(false).with_div2(false)
            }
        }
    }

    pub fn with_register(self, register: Register) -> Self {
        let one = register == Register::One;
        self.with_fselect(one).with_pselect(one)
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

/// Typical master clock of AD9833 breakout modules.
pub const MCLK: f64 = 25e6;

pub fn frequency_to_ftw(frequency: f64, mclk: f64) -> u28 {
    let lsb = mclk.recip() * (1u32 << 28) as f64;
    // Alias into Nyquist
    u28::new(((frequency * lsb).round() as i64 as u32) & u28::MASK)
}

pub fn phase_to_pow(phase: f32) -> u12 {
    u12::new(
        ((phase * (1u32 << 12) as f32).round() as i32 as u16) & u12::MASK,
    )
}

#[derive(Clone, Debug)]
pub struct Ad9833<B> {
    bus: B,
    mclk: f64,
    control: Control,
}

impl<B: SpiDevice<u8>> Ad9833<B> {
    pub fn new(bus: B, mclk: f64) -> Self {
        Self {
            bus,
            mclk,
            control: Control::default().with_b28(true),
        }
    }

    fn write(&mut self, word: u16) -> Result<(), Error> {
        Ok(self.bus.write(&word.to_be_bytes())?)
    }

    pub fn mclk(&self) -> f64 {
        self.mclk
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn set_control(&mut self, control: Control) -> Result<(), Error> {
        let control = control.with_target(Target::Control);
        self.write(control.raw_value())?;
        self.control = control;
        Ok(())
    }

    /// Reset and clear both register banks. Leaves a 0 Hz sine selected.
    pub fn init(&mut self) -> Result<(), Error> {
        let control = Control::default().with_b28(true);
        self.set_control(control.with_reset(true))?;
        for register in [Register::Zero, Register::One] {
            self.set_ftw(register, u28::new(0))?;
            self.set_pow(register, u12::new(0))?;
        }
        self.set_control(control)
    }

    /// Both 14 bit halves are written back to back, LSBs first.
    pub fn set_ftw(
        &mut self,
        register: Register,
        ftw: u28,
    ) -> Result<(), Error> {
        if !self.control.b28() || self.control.hlb() {
            self.set_control(self.control.with_b28(true).with_hlb(false))?;
        }
        let target = register.freq_target();
        let lsb = u14::new(ftw.value() as u16 & u14::MASK);
        let msb = u14::new((ftw.value() >> 14) as u16 & u14::MASK);
        for data in [lsb, msb] {
            self.write(
                FreqWord::builder()
                    .with_data(data)
                    .with_target(target)
                    .build()
                    .raw_value(),
            )?;
        }
        Ok(())
    }

    pub fn set_frequency(
        &mut self,
        register: Register,
        frequency: f64,
    ) -> Result<u28, Error> {
        let ftw = frequency_to_ftw(frequency, self.mclk);
        self.set_ftw(register, ftw)?;
        Ok(ftw)
    }

    pub fn set_pow(
        &mut self,
        register: Register,
        pow: u12,
    ) -> Result<(), Error> {
        self.write(
            PhaseWord::builder()
                .with_data(pow)
                .with_phase1(register == Register::One)
                .with_target(Target::Phase)
                .build()
                .raw_value(),
        )
    }

    /// Phase in turns.
    pub fn set_phase(
        &mut self,
        register: Register,
        phase: f32,
    ) -> Result<u12, Error> {
        let pow = phase_to_pow(phase);
        self.set_pow(register, pow)?;
        Ok(pow)
    }

    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), Error> {
        self.set_control(self.control.with_waveform(waveform))
    }

    /// Power down the DAC and/or the internal clock.
    pub fn set_sleep(&mut self, dac: bool, clock: bool) -> Result<(), Error> {
        self.set_control(self.control.with_sleep12(dac).with_sleep1(clock))
    }

    /// Program frequency, phase and waveform of one bank and route it to the
    /// output.
    ///
    /// The output is held in reset while the registers are updated so that
    /// no intermediate frequency is ever generated.
    pub fn program(
        &mut self,
        register: Register,
        frequency: f64,
        phase: f32,
        waveform: Waveform,
    ) -> Result<u28, Error> {
        let control = self.control.with_b28(true).with_hlb(false);
        self.set_control(control.with_reset(true))?;
        let ftw = self.set_frequency(register, frequency)?;
        self.set_phase(register, phase)?;
        self.set_control(
            control
                .with_reset(false)
                .with_sleep1(false)
                .with_sleep12(false)
                .with_waveform(waveform)
                .with_register(register),
        )?;
        Ok(ftw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::spi::{ErrorType, Operation};

    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
    }

    impl Recorder {
        fn words(&self) -> Vec<u16> {
            self.bytes
                .chunks(2)
                .map(|w| u16::from_be_bytes([w[0], w[1]]))
                .collect()
        }
    }

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
                    self.bytes.extend_from_slice(data);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn ftw() {
        assert_eq!(frequency_to_ftw(0.0, MCLK).value(), 0);
        assert_eq!(frequency_to_ftw(12.5e6, MCLK).value(), 1 << 27);
        assert_eq!(frequency_to_ftw(1e3, MCLK).value(), 10737);
    }

    #[test]
    fn pow() {
        assert_eq!(phase_to_pow(0.0).value(), 0);
        assert_eq!(phase_to_pow(0.25).value(), 1024);
        assert_eq!(phase_to_pow(1.0).value(), 0);
    }

    #[test]
    fn init_clears_both_banks() {
        let mut dds = Ad9833::new(Recorder::default(), MCLK);
        dds.init().unwrap();
        assert_eq!(
            dds.bus.words(),
            [
                0x2100, 0x4000, 0x4000, 0xc000, 0x8000, 0x8000, 0xe000,
                0x2000
            ]
        );
    }

    #[test]
    fn program_sine() {
        let mut dds = Ad9833::new(Recorder::default(), MCLK);
        let ftw = dds
            .program(Register::Zero, 1e3, 0.0, Waveform::Sine)
            .unwrap();
        assert_eq!(ftw.value(), 0x29f1);
        assert_eq!(
            dds.bus.words(),
            [0x2100, 0x69f1, 0x4000, 0xc000, 0x2000]
        );
    }

    #[test]
    fn program_bank_one() {
        let mut dds = Ad9833::new(Recorder::default(), MCLK);
        dds.program(Register::One, 12.5e6, 0.25, Waveform::Triangle)
            .unwrap();
        assert_eq!(
            dds.bus.words(),
            [0x2100, 0x8000, 0xa000, 0xe400, 0x2c02]
        );
    }

    #[test]
    fn waveform_bits() {
        let c = Control::default().with_b28(true);
        assert_eq!(c.with_waveform(Waveform::Sine).raw_value(), 0x2000);
        assert_eq!(c.with_waveform(Waveform::Triangle).raw_value(), 0x2002);
        assert_eq!(c.with_waveform(Waveform::Square).raw_value(), 0x2028);
        assert_eq!(c.with_waveform(Waveform::HalfSquare).raw_value(), 0x2020);
    }

    #[test]
    fn sleep() {
        let mut dds = Ad9833::new(Recorder::default(), MCLK);
        dds.set_sleep(true, true).unwrap();
        assert_eq!(dds.bus.words(), [0x20c0]);
        assert!(dds.control().sleep1());
    }
}
