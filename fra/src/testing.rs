use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;

use crate::{Acquire, AcquireError, Input, Register, SignalSource, Waveform};

pub fn isclose(a: f32, b: f32, rtol: f32, atol: f32) -> bool {
    (a - b).abs() <= a.abs().max(b.abs()) * rtol + atol
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SourceOp {
    Waveform {
        frequency: f32,
        phase: f32,
        waveform: Waveform,
        register: Register,
    },
    Amplitude(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fault;

/// Records every source operation.
#[derive(Default, Debug)]
pub struct Generator {
    pub ops: Vec<SourceOp>,
    /// Reject waveform updates at this frequency.
    pub fail_at: Option<f32>,
    pub fail_amplitude: bool,
}

impl Generator {
    pub fn frequencies(&self) -> Vec<f32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SourceOp::Waveform { frequency, .. } => Some(*frequency),
                _ => None,
            })
            .collect()
    }

    pub fn amplitudes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SourceOp::Amplitude(code) => Some(*code),
                _ => None,
            })
            .collect()
    }
}

impl SignalSource for Generator {
    type Error = Fault;

    fn set_waveform(
        &mut self,
        frequency: f32,
        phase: f32,
        waveform: Waveform,
        register: Register,
    ) -> Result<(), Fault> {
        if self.fail_at == Some(frequency) {
            return Err(Fault);
        }
        self.ops.push(SourceOp::Waveform {
            frequency,
            phase,
            waveform,
            register,
        });
        Ok(())
    }

    fn set_amplitude(&mut self, code: u8) -> Result<(), Fault> {
        if self.fail_amplitude {
            return Err(Fault);
        }
        self.ops.push(SourceOp::Amplitude(code));
        Ok(())
    }
}

/// Fills captures with a square wave spanning a fixed count range per input.
#[derive(Debug)]
pub struct Bench {
    pub input: Option<Input>,
    pub stimulus: (u16, u16),
    pub response: (u16, u16),
    /// Consumed by successive response captures before `response` applies.
    pub responses: VecDeque<(u16, u16)>,
    pub fail: Option<AcquireError>,
    pub fail_configure: bool,
    pub captures: usize,
}

impl Default for Bench {
    fn default() -> Self {
        Self {
            input: None,
            stimulus: (0, 0),
            response: (0, 0),
            responses: VecDeque::new(),
            fail: None,
            fail_configure: false,
            captures: 0,
        }
    }
}

impl Acquire for Bench {
    fn configure(&mut self, input: Input) -> Result<(), AcquireError> {
        if self.fail_configure {
            return Err(AcquireError::Configure);
        }
        self.input = Some(input);
        Ok(())
    }

    fn capture(
        &mut self,
        samples: &mut [u16],
        _timeout_ms: u32,
    ) -> Result<(), AcquireError> {
        if let Some(err) = self.fail {
            return Err(err);
        }
        let (lo, hi) = match self.input.ok_or(AcquireError::Start)? {
            Input::Stimulus => self.stimulus,
            Input::Response => {
                self.responses.pop_front().unwrap_or(self.response)
            }
        };
        for (i, s) in samples.iter_mut().enumerate() {
            *s = if i % 2 == 0 { lo } else { hi };
        }
        self.captures += 1;
        Ok(())
    }
}

/// Accumulates requested delays.
#[derive(Default, Debug)]
pub struct Clock {
    pub elapsed_ns: u64,
}

impl DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}
