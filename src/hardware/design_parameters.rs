use stm32h7xx_hal::time::{Hertz, MegaHertz};

/// Core clock.
pub const SYSCLK: MegaHertz = MegaHertz::MHz(400);

/// Serial clock of the AD9833 (40 MHz max).
pub const DDS_SCK: MegaHertz = MegaHertz::MHz(5);

/// AD9833 master clock as fitted on the DDS module.
pub const DDS_MCLK: f64 = 25e6;

/// Serial clock of the MCP41010 (10 MHz max).
pub const ATTENUATOR_SCK: MegaHertz = MegaHertz::MHz(5);

/// ADC kernel clock after the ADC prescaler.
// With 32.5 cycles sampling and 6.5 cycles conversion at 12 bit this gives
// ~102.6 kS/s, i.e. ~10 ms per 1024 sample capture. That spans two periods of
// the lowest sweep frequency.
//
// Sweep points above ~51 kHz are undersampled. Peak-to-peak detection only
// needs the samples to cover the signal phase, which holds except next to
// low order fractions of the sample rate. At 34.2 kHz (~fs/3) the largest
// phase gap is ~77 degrees and a capture can under-read by up to ~22 %, so
// that point's gain may be off by a few tens of percent. The band edges
// used for classification (200-2000 Hz, 98.2-100 kHz) are unaffected. A
// faster rate moves the weak points rather than removing them: 2x rate has
// eight points with gaps above 18 degrees against five here, and only the
// 34.2 kHz one exceeds 34 degrees.
pub const ADC_CLOCK: Hertz = Hertz::MHz(4);

/// Touch panel UART baud rate.
pub const HMI_BAUD: u32 = 9600;
