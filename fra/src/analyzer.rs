use core::fmt::Debug;
use embedded_hal::delay::DelayNs;

use crate::{
    model_gain, silence, sweep, Acquire, FilterVerdict, GainCurve, Register,
    Sampler, Settings, SignalSource, Waveform, POINTS, SAMPLES,
};

/// Model gains below this are treated as a transmission zero.
const MIN_MODEL_GAIN: f32 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error<E: Debug> {
    #[error("Signal source: {0:?}")]
    Source(E),
}

/// Stimulus amplitude needed for `target_vpp` at the reference network
/// output.
///
/// Saturates at `max_vpp` where the model gain vanishes.
pub fn drive_for_target(
    frequency: f32,
    target_vpp: f32,
    max_vpp: f32,
) -> f32 {
    let gain = model_gain(frequency);
    if gain < MIN_MODEL_GAIN {
        max_vpp
    } else {
        target_vpp / gain
    }
}

/// Signal setpoints and swept analysis on one source/ADC pair.
pub struct Analyzer<S, A, D, const N: usize = POINTS, const L: usize = SAMPLES>
{
    source: S,
    sampler: Sampler<A, L>,
    delay: D,
    settings: Settings,
}

impl<S, A, D, const N: usize, const L: usize> Analyzer<S, A, D, N, L>
where
    S: SignalSource,
    A: Acquire,
    D: DelayNs,
{
    pub fn new(source: S, adc: A, delay: D, settings: Settings) -> Self {
        Self {
            source,
            sampler: Sampler::new(adc),
            delay,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler<A, L> {
        &mut self.sampler
    }

    /// Idle output: 0 Hz sine on register 0 at zero amplitude.
    pub fn init(&mut self) -> Result<(), Error<S::Error>> {
        self.source
            .set_waveform(0.0, 0.0, Waveform::Sine, Register::Zero)
            .map_err(Error::Source)?;
        self.source.set_amplitude(0).map_err(Error::Source)
    }

    /// Fixed amplitude sine at `frequency` (Hz).
    pub fn set_tunable_signal(
        &mut self,
        frequency: f32,
    ) -> Result<(), Error<S::Error>> {
        self.source
            .set_waveform(frequency, 0.0, Waveform::Sine, Register::Zero)
            .map_err(Error::Source)?;
        self.source
            .set_amplitude(self.settings.tunable_code)
            .map_err(Error::Source)?;
        log::info!(
            "Tunable signal: {frequency} Hz at code {}",
            self.settings.tunable_code
        );
        Ok(())
    }

    /// Sine at `frequency` (Hz) with the stimulus amplitude chosen so that
    /// the reference network output reaches `target_vpp` (V).
    ///
    /// Returns the attenuator code used.
    pub fn set_calibrated_signal(
        &mut self,
        frequency: f32,
        target_vpp: f32,
    ) -> Result<u8, Error<S::Error>> {
        let calibration = &self.settings.calibration;
        let drive =
            drive_for_target(frequency, target_vpp, calibration.max_vpp);
        let code = calibration.vpp_to_code(drive);
        self.source
            .set_waveform(frequency, 0.0, Waveform::Sine, Register::Zero)
            .map_err(Error::Source)?;
        self.source.set_amplitude(code).map_err(Error::Source)?;
        log::info!(
            "Calibrated signal: {frequency} Hz, {target_vpp} V out, \
             {drive} V drive, code {code}"
        );
        Ok(code)
    }

    pub fn stop_all_output(&mut self) -> Result<(), Error<S::Error>> {
        silence(&mut self.source).map_err(Error::Source)?;
        log::info!("Output stopped");
        Ok(())
    }

    /// Measure the gain curve. Leaves the output silent.
    pub fn run_sweep(&mut self) -> GainCurve<N> {
        sweep(
            &mut self.source,
            &mut self.sampler,
            &mut self.delay,
            &self.settings.sweep,
        )
    }

    pub fn run_sweep_and_classify(&mut self) -> FilterVerdict {
        let curve = self.run_sweep();
        self.settings.classifier.classify(&curve)
    }

    pub fn into_parts(self) -> (S, A, D) {
        (self.source, self.sampler.into_inner(), self.delay)
    }
}
