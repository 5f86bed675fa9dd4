//! Filter characterizer application.
//!
//! Commands arrive from the touch panel over USART1. The UART interrupt
//! frames and parses them and queues them for the idle loop, which executes
//! one command at a time. Sweeps block the idle loop for several seconds
//! while the UART keeps receiving.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(not(target_os = "none"))]
fn main() {
    let settings = fra::Settings::default();
    let json: heapless::String<512> =
        serde_json_core::to_string(&settings).unwrap();
    println!("{json}");
}

#[cfg(target_os = "none")]
#[rtic::app(device = characterizer::hardware::hal::stm32, peripherals = true)]
mod app {
    use characterizer::{
        dispatch::dispatch,
        hardware::{self, Analyzer, HmiReceiver, HmiTransmitter},
        hmi::Command,
    };
    use heapless::spsc::{Consumer, Producer, Queue};

    /// Pending command capacity (one less than the queue size).
    const QUEUE_SIZE: usize = 4;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        analyzer: Analyzer,
        hmi_tx: HmiTransmitter,
        hmi_rx: HmiReceiver,
        commands_tx: Producer<'static, Command, QUEUE_SIZE>,
        commands_rx: Consumer<'static, Command, QUEUE_SIZE>,
    }

    #[init(local = [queue: Queue<Command, QUEUE_SIZE> = Queue::new()])]
    fn init(c: init::Context) -> (Shared, Local) {
        let devices = hardware::setup::setup(c.core, c.device);

        let settings = fra::Settings::default();
        match serde_json_core::to_string::<_, 512>(&settings) {
            Ok(json) => log::info!("Settings: {json}"),
            Err(err) => log::warn!("Settings: {err:?}"),
        }

        let mut analyzer = Analyzer::new(
            devices.generator,
            devices.adc,
            devices.delay,
            settings,
        );
        if let Err(err) = analyzer.init() {
            log::error!("Output init failed: {err}");
        }

        let (commands_tx, commands_rx) = c.local.queue.split();

        (
            Shared {},
            Local {
                analyzer,
                hmi_tx: devices.hmi_tx,
                hmi_rx: devices.hmi_rx,
                commands_tx,
                commands_rx,
            },
        )
    }

    #[idle(local=[analyzer, hmi_tx, commands_rx])]
    fn idle(c: idle::Context) -> ! {
        loop {
            match c.local.commands_rx.dequeue() {
                Some(command) => {
                    if let Some(page) = dispatch(c.local.analyzer, command) {
                        c.local.hmi_tx.send(page);
                    }
                }
                None => cortex_m::asm::wfi(),
            }
        }
    }

    #[task(binds = USART1, priority = 2, local=[hmi_rx, commands_tx])]
    fn usart1(c: usart1::Context) {
        match c.local.hmi_rx.handle_interrupt() {
            Some(Ok(command)) => {
                if let Err(command) = c.local.commands_tx.enqueue(command) {
                    log::warn!("Command queue full, dropping {command:?}");
                }
            }
            Some(Err(err)) => log::warn!("Panel frame rejected: {err}"),
            None => {}
        }
    }
}
