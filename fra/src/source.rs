use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// Stimulus waveform.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    /// Square wave at half the programmed frequency.
    HalfSquare,
}

/// DDS frequency/phase register bank.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum Register {
    #[default]
    Zero,
    One,
}

/// A stimulus generator with a DDS oscillator and an 8 bit attenuator.
pub trait SignalSource {
    type Error: Debug;

    /// Program and output the given waveform.
    ///
    /// # Args
    /// * `frequency` - Output frequency (Hz)
    /// * `phase` - Phase offset (turns)
    /// * `waveform` - Output waveform
    /// * `register` - Register bank to program and select
    fn set_waveform(
        &mut self,
        frequency: f32,
        phase: f32,
        waveform: Waveform,
        register: Register,
    ) -> Result<(), Self::Error>;

    /// Set the attenuator code. 0 is silence, 255 full scale.
    fn set_amplitude(&mut self, code: u8) -> Result<(), Self::Error>;
}

impl<T: SignalSource + ?Sized> SignalSource for &mut T {
    type Error = T::Error;

    fn set_waveform(
        &mut self,
        frequency: f32,
        phase: f32,
        waveform: Waveform,
        register: Register,
    ) -> Result<(), Self::Error> {
        T::set_waveform(self, frequency, phase, waveform, register)
    }

    fn set_amplitude(&mut self, code: u8) -> Result<(), Self::Error> {
        T::set_amplitude(self, code)
    }
}

/// Zero amplitude and frequency.
pub fn silence<S: SignalSource + ?Sized>(
    source: &mut S,
) -> Result<(), S::Error> {
    source.set_amplitude(0)?;
    source.set_waveform(0.0, 0.0, Waveform::Sine, Register::Zero)
}
