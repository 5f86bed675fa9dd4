//! Basic blocking delay
//!
//! Busy waits on the core clock. Used for ADC calibration and sweep settling.
use embedded_hal_02::blocking::delay::DelayUs;
use embedded_hal_1::delay::DelayNs;

/// A basic delay implementation.
pub struct AsmDelay {
    frequency_us: u32,
}

impl AsmDelay {
    /// Create a new delay.
    ///
    /// # Args
    /// * `freq` - The CPU core frequency.
    pub fn new(freq: u32) -> AsmDelay {
        AsmDelay {
            frequency_us: freq / 1_000_000,
        }
    }
}

impl<U> DelayUs<U> for AsmDelay
where
    U: Into<u32>,
{
    fn delay_us(&mut self, us: U) {
        DelayNs::delay_us(self, us.into())
    }
}

impl DelayNs for AsmDelay {
    fn delay_ns(&mut self, ns: u32) {
        cortex_m::asm::delay(
            ((ns as u64 * self.frequency_us as u64).div_ceil(1_000)) as u32,
        )
    }

    fn delay_us(&mut self, us: u32) {
        // Chunked to stay within u32 cycles
        let chunk = u32::MAX / self.frequency_us.max(1);
        let mut us = us;
        while us > chunk {
            cortex_m::asm::delay(chunk * self.frequency_us);
            us -= chunk;
        }
        cortex_m::asm::delay(us * self.frequency_us)
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            DelayNs::delay_us(self, 1_000);
        }
    }
}
