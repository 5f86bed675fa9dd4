//! AD9833 DDS followed by an MCP41010 digital potentiometer as attenuator.
use ad9833::Ad9833;
use embedded_hal_1::spi::SpiDevice;
use fra::{Register, SignalSource, Waveform};
use mcp41xxx::{Mcp41xxx, Pot};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("DDS: {0}")]
    Dds(#[from] ad9833::Error),
    #[error("Attenuator: {0}")]
    Attenuator(#[from] mcp41xxx::Error),
}

fn waveform(waveform: Waveform) -> ad9833::Waveform {
    match waveform {
        Waveform::Sine => ad9833::Waveform::Sine,
        Waveform::Triangle => ad9833::Waveform::Triangle,
        Waveform::Square => ad9833::Waveform::Square,
        Waveform::HalfSquare => ad9833::Waveform::HalfSquare,
    }
}

fn register(register: Register) -> ad9833::Register {
    match register {
        Register::Zero => ad9833::Register::Zero,
        Register::One => ad9833::Register::One,
    }
}

pub struct Generator<D, P> {
    dds: Ad9833<D>,
    attenuator: Mcp41xxx<P>,
}

impl<D: SpiDevice<u8>, P: SpiDevice<u8>> Generator<D, P> {
    /// Reset the DDS and mute the attenuator.
    pub fn new(dds: D, attenuator: P, mclk: f64) -> Result<Self, Error> {
        let mut dds = Ad9833::new(dds, mclk);
        dds.init()?;
        let mut attenuator = Mcp41xxx::new(attenuator);
        attenuator.set_wiper(Pot::P0, 0)?;
        Ok(Self { dds, attenuator })
    }

    pub fn dds(&mut self) -> &mut Ad9833<D> {
        &mut self.dds
    }

    pub fn attenuator(&mut self) -> &mut Mcp41xxx<P> {
        &mut self.attenuator
    }
}

impl<D: SpiDevice<u8>, P: SpiDevice<u8>> SignalSource for Generator<D, P> {
    type Error = Error;

    fn set_waveform(
        &mut self,
        frequency: f32,
        phase: f32,
        wf: Waveform,
        reg: Register,
    ) -> Result<(), Error> {
        let ftw = self.dds.program(
            register(reg),
            frequency as f64,
            phase,
            waveform(wf),
        )?;
        log::debug!(
            "DDS {reg:?}: {frequency} Hz (FTW {:#x}) {wf:?}",
            ftw.value()
        );
        Ok(())
    }

    fn set_amplitude(&mut self, code: u8) -> Result<(), Error> {
        Ok(self.attenuator.set_wiper(Pot::P0, code)?)
    }
}
