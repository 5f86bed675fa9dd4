//! Characterizer hardware configuration
//!
//! This file contains all of the hardware-specific configuration of the
//! board: clocks, logging, the DDS and attenuator SPI buses, the ADC and the
//! touch panel UART.
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use embedded_hal_compat::ForwardCompat;
use stm32h7xx_hal::{self as hal, prelude::*};

use crate::build_info;

use super::{
    delay::AsmDelay, design_parameters, DmaSampler, Generator, HmiReceiver,
    HmiTransmitter, Systick,
};

/// The available hardware interfaces.
pub struct Devices {
    pub generator: Generator,
    pub adc: DmaSampler,
    pub delay: AsmDelay,
    pub hmi_rx: HmiReceiver,
    pub hmi_tx: HmiTransmitter,
}

/// Configure the hardware for operation.
///
/// # Args
/// * `core` - The cortex-m peripherals.
/// * `device` - The microcontroller peripherals to be configured.
///
/// # Returns
/// All device interfaces. The signal generator is reset and muted, the ADC
/// is idle and the UART receive interrupts are enabled.
pub fn setup(
    core: hal::stm32::CorePeripherals,
    device: hal::stm32::Peripherals,
) -> Devices {
    // Set up RTT logging
    {
        // Enable debug during WFE/WFI-induced sleep
        device.DBGMCU.cr.modify(|_, w| w.dbgsleep_d1().set_bit());

        // Set up RTT channel to use for `rprintln!()` as "best effort".
        // This removes a critical section around the logging and thus allows
        // the UART interrupt to preempt the idle loop at low latency.
        // If the interrupt preempts while idle is logging, the interrupt's
        // log message will be lost.
        let channels = rtt_target::rtt_init_default!();
        // Note(unsafe): The closure we pass does not establish a critical
        // section as demanded but it does ensure synchronization and
        // implements a lock.
        unsafe {
            rtt_target::set_print_channel_cs(
                channels.up.0,
                &((|arg, f| {
                    static LOCKED: AtomicBool = AtomicBool::new(false);
                    if LOCKED.compare_exchange_weak(
                        false,
                        true,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    ) == Ok(false)
                    {
                        f(arg);
                        LOCKED.store(false, Ordering::Release);
                    }
                }) as rtt_target::CriticalSectionFunc),
            );
        }

        static LOGGER: rtt_logger::RTTLogger =
            rtt_logger::RTTLogger::new(log::LevelFilter::Info);
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(log::LevelFilter::Trace))
            .unwrap();
        log::info!(
            "Starting {} {}",
            build_info::PKG_NAME,
            build_info::GIT_VERSION.unwrap_or(build_info::PKG_VERSION)
        );
    }

    let pwr = device.PWR.constrain();
    let vos = pwr.freeze();

    // Clear reset flags.
    device.RCC.rsr.write(|w| w.rmvf().set_bit());

    // Select the PLLs for SPI.
    device
        .RCC
        .d2ccip1r
        .modify(|_, w| w.spi123sel().pll2_p());

    device.RCC.d3ccipr.modify(|_, w| w.adcsel().per());

    let rcc = device.RCC.constrain();
    let ccdr = rcc
        .use_hse(8.MHz())
        .sysclk(design_parameters::SYSCLK.convert())
        .hclk(200.MHz())
        // Fixed frequency HSI, only used for the ADC kernel clock
        .per_ck(64.MHz())
        .pll2_p_ck(100.MHz())
        .freeze(vos, &device.SYSCFG);

    Systick::start(core.SYST, ccdr.clocks.sysclk().to_Hz());

    let mut delay = AsmDelay::new(ccdr.clocks.c_ck().to_Hz());

    let gpioa = device.GPIOA.split(ccdr.peripheral.GPIOA);
    let gpiob = device.GPIOB.split(ccdr.peripheral.GPIOB);
    let gpioc = device.GPIOC.split(ccdr.peripheral.GPIOC);
    let gpiod = device.GPIOD.split(ccdr.peripheral.GPIOD);

    // Panic indicator, off.
    gpiob.pb14.into_push_pull_output().set_low();

    let generator = {
        let dds_spi: hal::spi::Spi<_, _, u8> = device.SPI1.spi(
            (
                gpioa.pa5.into_alternate(), // SCK
                hal::spi::NoMiso,
                gpiob.pb5.into_alternate(), // MOSI/SDATA
            ),
            hal::spi::MODE_2,
            design_parameters::DDS_SCK.convert(),
            ccdr.peripheral.SPI1,
            &ccdr.clocks,
        );
        let mut fsync = gpiod.pd14.into_push_pull_output();
        fsync.set_high();
        let dds = ExclusiveDevice::new(
            dds_spi.forward(),
            fsync.erase().forward(),
            NoDelay,
        )
        .unwrap();

        let att_spi: hal::spi::Spi<_, _, u8> = device.SPI2.spi(
            (
                gpiob.pb13.into_alternate(), // SCK
                hal::spi::NoMiso,
                gpiob.pb15.into_alternate(), // MOSI/SI
            ),
            hal::spi::MODE_0,
            design_parameters::ATTENUATOR_SCK.convert(),
            ccdr.peripheral.SPI2,
            &ccdr.clocks,
        );
        let mut cs = gpiob.pb12.into_push_pull_output();
        cs.set_high();
        let attenuator = ExclusiveDevice::new(
            att_spi.forward(),
            cs.erase().forward(),
            NoDelay,
        )
        .unwrap();

        match Generator::new(dds, attenuator, design_parameters::DDS_MCLK) {
            Ok(generator) => generator,
            Err(err) => panic!("Signal generator initialization failed: {err}"),
        }
    };

    let adc = {
        let adc1 = hal::adc::Adc::adc1(
            device.ADC1,
            design_parameters::ADC_CLOCK,
            &mut delay,
            ccdr.peripheral.ADC12,
            &ccdr.clocks,
        );
        let streams = hal::dma::dma::StreamsTuple::new(
            device.DMA1,
            ccdr.peripheral.DMA1,
        );
        DmaSampler::new(
            streams.0,
            adc1,
            gpioa.pa3.into_analog(),
            gpioc.pc0.into_analog(),
        )
    };

    let (hmi_rx, hmi_tx) = {
        let mut serial = device
            .USART1
            .serial(
                (
                    gpiob.pb6.into_alternate(), // TX
                    gpiob.pb7.into_alternate(), // RX
                ),
                design_parameters::HMI_BAUD.bps(),
                ccdr.peripheral.USART1,
                &ccdr.clocks,
            )
            .unwrap();
        serial.listen(hal::serial::Event::Rxne);
        serial.listen(hal::serial::Event::Idle);
        let (tx, rx) = serial.split();
        (HmiReceiver::new(rx), HmiTransmitter::new(tx))
    };

    log::info!("setup() complete");

    Devices {
        generator,
        adc,
        delay,
        hmi_rx,
        hmi_tx,
    }
}
