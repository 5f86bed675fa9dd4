use embedded_hal::delay::DelayNs;
use miniconf::Tree;
use serde::{Deserialize, Serialize};

use crate::{
    silence, Acquire, Input, Register, Sampler, SignalSource, Waveform,
};

/// Number of sweep points.
pub const POINTS: usize = 500;

/// Stimulus schedule of a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Tree, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Frequency of the first point (Hz).
    pub start_hz: f32,
    /// Frequency increment between points (Hz).
    pub step_hz: f32,
    /// Settling time after each frequency change (ms).
    pub settle_ms: u32,
    /// Attenuator code held for the duration of the sweep.
    pub drive_code: u8,
    /// Stimulus level below which a point records zero gain (V).
    pub noise_floor: f32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_hz: 200.0,
            step_hz: 200.0,
            settle_ms: 5,
            drive_code: 128,
            noise_floor: 0.01,
        }
    }
}

impl SweepConfig {
    pub fn frequency(&self, index: usize) -> f32 {
        self.start_hz + index as f32 * self.step_hz
    }
}

/// Measured gain magnitude on a uniform frequency grid.
///
/// Index `i` corresponds to `start_hz + i * step_hz`.
#[derive(Clone, Debug, PartialEq)]
pub struct GainCurve<const N: usize = POINTS> {
    start_hz: f32,
    step_hz: f32,
    gains: [f32; N],
    faults: u32,
}

impl<const N: usize> GainCurve<N> {
    /// Negative and NaN gains are stored as 0.
    pub fn new(start_hz: f32, step_hz: f32, gains: [f32; N]) -> Self {
        Self {
            start_hz,
            step_hz,
            gains: gains.map(|g| if g > 0.0 { g } else { 0.0 }),
            faults: 0,
        }
    }

    pub fn frequency(&self, index: usize) -> f32 {
        self.start_hz + index as f32 * self.step_hz
    }

    pub fn gains(&self) -> &[f32; N] {
        &self.gains
    }

    /// Number of points with a source or acquisition failure.
    ///
    /// Their gain reads 0.
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// `(frequency, gain)` pairs in ascending frequency.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.gains
            .iter()
            .enumerate()
            .map(|(i, &g)| (self.frequency(i), g))
    }

    /// Index and value of the largest gain.
    pub fn peak(&self) -> Option<(usize, f32)> {
        self.gains
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, g)| match best {
                Some((_, b)) if b >= g => best,
                _ => Some((i, g)),
            })
    }
}

/// Step the source through the configured frequency ladder and record the
/// gain at each point.
///
/// Failures are logged and the affected point reads 0. The source is left
/// silent (zero amplitude and frequency).
pub fn sweep<S, A, D, const N: usize, const L: usize>(
    source: &mut S,
    sampler: &mut Sampler<A, L>,
    delay: &mut D,
    config: &SweepConfig,
) -> GainCurve<N>
where
    S: SignalSource + ?Sized,
    A: Acquire,
    D: DelayNs + ?Sized,
{
    log::info!(
        "Sweep: {N} points from {} Hz in {} Hz steps",
        config.start_hz,
        config.step_hz
    );
    let mut curve = GainCurve::new(config.start_hz, config.step_hz, [0.0; N]);

    if let Err(err) = source.set_amplitude(config.drive_code) {
        log::warn!("Sweep drive level: {err:?}");
    }

    for i in 0..N {
        let frequency = config.frequency(i);
        if let Err(err) =
            source.set_waveform(frequency, 0.0, Waveform::Sine, Register::Zero)
        {
            log::warn!("Sweep point {i} ({frequency} Hz): {err:?}");
            curve.faults += 1;
            continue;
        }
        delay.delay_ms(config.settle_ms);

        let mut read = |input: Input| {
            sampler.measure(input).unwrap_or_else(|err| {
                log::warn!("Sweep point {i} {}: {err}", input.as_ref());
                curve.faults += 1;
                0.0
            })
        };
        let vin = read(Input::Stimulus);
        let vout = read(Input::Response);

        curve.gains[i] = if vin >= config.noise_floor {
            vout / vin
        } else {
            0.0
        };
        log::trace!(
            "{frequency} Hz: {vin} V -> {vout} V, gain {}",
            curve.gains[i]
        );
    }

    if let Err(err) = silence(source) {
        log::warn!("Sweep idle: {err:?}");
    }
    if curve.faults > 0 {
        log::warn!("Sweep completed with {} faults", curve.faults);
    } else {
        log::info!("Sweep complete");
    }
    curve
}
