//! Block acquisition on the internal ADC1
//!
//! # Design
//!
//! Each capture is a single one-shot DMA transfer of [SAMPLES] consecutive
//! 12 bit conversions from the selected input into a buffer in AXI SRAM.
//! The ADC runs continuously from its kernel clock, there is no trigger
//! timer. Completion is polled against a [Systick] deadline. On completion
//! or timeout the ADC is stopped and the stream released, so the next capture
//! starts from a clean state.
//!
//! Two inputs are routed to ADC1:
//! * PA3 (INP15): stimulus, the network input
//! * PC0 (INP10): response, the network output
use fugit::ExtU32;
use rtic_monotonics::Monotonic;
use stm32h7xx_hal as hal;

use hal::adc::{self, Adc, AdcDmaMode};
use hal::dma::{
    dma::{DmaConfig, Stream0},
    PeripheralToMemory, Transfer,
};
use hal::gpio::{Analog, PA3, PC0};
use hal::stm32::{ADC1, DMA1};

use fra::{Acquire, AcquireError, Input, SAMPLES};

use super::Systick;

// Only referenced in `DmaSampler::new()`.
#[link_section = ".axisram.buffers"]
static mut ADC_BUF: [u16; SAMPLES] = [0; SAMPLES];

type AdcEnabled = Adc<ADC1, adc::Enabled>;

struct Idle {
    stream: Stream0<DMA1>,
    adc: AdcEnabled,
    buffer: &'static mut [u16; SAMPLES],
}

pub struct DmaSampler {
    idle: Option<Idle>,
    stimulus: PA3<Analog>,
    response: PC0<Analog>,
    input: Input,
}

impl DmaSampler {
    /// # Note
    /// This may only be called once.
    pub fn new(
        stream: Stream0<DMA1>,
        adc: Adc<ADC1, adc::Disabled>,
        stimulus: PA3<Analog>,
        response: PC0<Analog>,
    ) -> Self {
        let mut adc = adc.enable();
        adc.set_resolution(adc::Resolution::TwelveBit);
        adc.set_sample_time(adc::AdcSampleTime::T_32);

        // Note(unsafe): ADC_BUF is owned by this sampler. It is not used
        // anywhere else.
        let buffer = unsafe { &mut *core::ptr::addr_of_mut!(ADC_BUF) };

        Self {
            idle: Some(Idle {
                stream,
                adc,
                buffer,
            }),
            stimulus,
            response,
            input: Input::Stimulus,
        }
    }

    fn stop(adc: &AdcEnabled) {
        let rb = adc.inner();
        if rb.cr.read().adstart().bit_is_set() {
            rb.cr.modify(|_, w| w.adstp().set_bit());
            while rb.cr.read().adstart().bit_is_set() {}
        }
    }
}

impl Acquire for DmaSampler {
    fn configure(&mut self, input: Input) -> Result<(), AcquireError> {
        self.input = input;
        Ok(())
    }

    fn capture(
        &mut self,
        samples: &mut [u16],
        timeout_ms: u32,
    ) -> Result<(), AcquireError> {
        let Idle {
            stream,
            adc,
            buffer,
        } = self.idle.take().ok_or(AcquireError::Start)?;

        let config = DmaConfig::default().memory_increment(true);
        let mut transfer: Transfer<_, _, PeripheralToMemory, _, _> =
            Transfer::init(stream, adc, buffer, None, config);

        let (stimulus, response) = (&mut self.stimulus, &mut self.response);
        let input = self.input;
        transfer.start(|adc| match input {
            Input::Stimulus => {
                adc.start_conversion_dma(stimulus, AdcDmaMode::OneShot)
            }
            Input::Response => {
                adc.start_conversion_dma(response, AdcDmaMode::OneShot)
            }
        });

        let deadline = Systick::now() + timeout_ms.millis();
        let mut timed_out = false;
        while !transfer.get_transfer_complete_flag() {
            if Systick::now() >= deadline {
                timed_out = true;
                break;
            }
        }

        let (stream, adc, buffer, _) = transfer.free();
        Self::stop(&adc);
        let result = if timed_out {
            Err(AcquireError::Timeout)
        } else {
            let n = samples.len().min(buffer.len());
            samples[..n].copy_from_slice(&buffer[..n]);
            Ok(())
        };
        self.idle = Some(Idle {
            stream,
            adc,
            buffer,
        });
        result
    }
}
