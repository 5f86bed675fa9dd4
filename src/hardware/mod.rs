//! Module for all hardware-specific setup of the characterizer
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use embedded_hal_compat::{markers::ForwardOutputPin, Forward};
pub use stm32h7xx_hal as hal;

pub mod adc;
pub mod delay;
pub mod design_parameters;
pub mod hmi_serial;
pub mod setup;

pub use adc::DmaSampler;
pub use delay::AsmDelay;
pub use hmi_serial::{HmiReceiver, HmiTransmitter};

rtic_monotonics::systick_monotonic!(Systick, 1_000);

pub type ChipSelect =
    Forward<hal::gpio::ErasedPin<hal::gpio::Output>, ForwardOutputPin>;

pub type SpiDevice<SPI> = ExclusiveDevice<
    Forward<hal::spi::Spi<SPI, hal::spi::Enabled>>,
    ChipSelect,
    NoDelay,
>;

/// AD9833 on SPI1 (mode 2), MCP41010 on SPI2 (mode 0).
pub type Generator = crate::signal_source::Generator<
    SpiDevice<hal::stm32::SPI1>,
    SpiDevice<hal::stm32::SPI2>,
>;

pub type Analyzer = fra::Analyzer<Generator, DmaSampler, AsmDelay>;

#[inline(never)]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::{
        fmt::Write,
        sync::atomic::{AtomicBool, Ordering},
    };
    use cortex_m::asm;
    use rtt_target::{ChannelMode, UpChannel};

    cortex_m::interrupt::disable();

    // Recursion protection
    static PANICKED: AtomicBool = AtomicBool::new(false);
    while PANICKED.load(Ordering::Relaxed) {
        asm::bkpt();
    }
    PANICKED.store(true, Ordering::Relaxed);

    // Red user LED
    let gpiob = unsafe { &*hal::stm32::GPIOB::ptr() };
    gpiob.odr.modify(|_, w| w.odr14().high());

    // Analogous to panic-rtt-target
    if let Some(mut channel) = unsafe { UpChannel::conjure(0) } {
        channel.set_mode(ChannelMode::BlockIfFull);
        writeln!(channel, "{}", info).ok();
    }

    // Abort
    asm::udf();
}

#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("HardFault at {:#?}", ef);
}

#[cortex_m_rt::exception]
unsafe fn DefaultHandler(irqn: i16) {
    panic!("Unhandled exception (IRQn = {})", irqn);
}
