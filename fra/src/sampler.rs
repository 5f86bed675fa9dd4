use serde::{Deserialize, Serialize};

/// Samples per acquisition.
pub const SAMPLES: usize = 1024;
/// Acquisition completion timeout (ms).
pub const TIMEOUT_MS: u32 = 100;
/// ADC reference voltage (V).
pub const VREF: f32 = 3.3;
/// ADC full scale (12 bit counts).
pub const FULL_SCALE: f32 = 4095.0;

/// Analog input selection.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::AsRefStr,
)]
pub enum Input {
    /// Network input, as driven by the source.
    Stimulus,
    /// Network output.
    Response,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("Input channel configuration failed")]
    Configure,
    #[error("Acquisition could not be started")]
    Start,
    #[error("Acquisition timed out")]
    Timeout,
}

/// A block acquiring ADC.
pub trait Acquire {
    /// Route `input` to the converter for subsequent captures.
    fn configure(&mut self, input: Input) -> Result<(), AcquireError>;

    /// Fill `samples` with consecutive conversions and block until done.
    ///
    /// On error the content of `samples` is unspecified.
    fn capture(
        &mut self,
        samples: &mut [u16],
        timeout_ms: u32,
    ) -> Result<(), AcquireError>;
}

impl<T: Acquire + ?Sized> Acquire for &mut T {
    fn configure(&mut self, input: Input) -> Result<(), AcquireError> {
        T::configure(self, input)
    }

    fn capture(
        &mut self,
        samples: &mut [u16],
        timeout_ms: u32,
    ) -> Result<(), AcquireError> {
        T::capture(self, samples, timeout_ms)
    }
}

/// Peak-to-peak voltage of a block of ADC counts. 0 for an empty block.
pub fn peak_to_peak(samples: &[u16]) -> f32 {
    let Some((min, max)) = samples.iter().fold(None, |acc, &x| match acc {
        None => Some((x, x)),
        Some((min, max)) => Some((x.min(min), x.max(max))),
    }) else {
        return 0.0;
    };
    (max - min) as f32 * (VREF / FULL_SCALE)
}

/// Peak-to-peak voltmeter owning its acquisition buffer.
pub struct Sampler<A, const L: usize = SAMPLES> {
    adc: A,
    buffer: [u16; L],
}

impl<A: Acquire, const L: usize> Sampler<A, L> {
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            buffer: [0; L],
        }
    }

    /// Acquire one block from `input` and return its peak-to-peak voltage.
    pub fn measure(&mut self, input: Input) -> Result<f32, AcquireError> {
        self.adc.configure(input)?;
        self.adc.capture(&mut self.buffer, TIMEOUT_MS)?;
        Ok(peak_to_peak(&self.buffer))
    }

    /// Like [Sampler::measure] but reports failures as 0 V.
    pub fn read_vpp_blocking(&mut self, input: Input) -> f32 {
        self.measure(input).unwrap_or_else(|err| {
            log::warn!("{} acquisition failed: {err}", input.as_ref());
            0.0
        })
    }

    /// The most recent block.
    pub fn samples(&self) -> &[u16; L] {
        &self.buffer
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    pub fn into_inner(self) -> A {
        self.adc
    }
}
