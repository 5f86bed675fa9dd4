//! Touch panel UART (USART1, PB6 TX, PB7 RX)
//!
//! Reception is interrupt driven. RXNE drains the data register into a
//! [Framer]. IDLE closes the frame.
use embedded_hal_02::serial::{Read, Write};
use stm32h7xx_hal as hal;

use crate::hmi::{Command, Framer, Page, ParseError};

pub struct HmiReceiver {
    rx: hal::serial::Rx<hal::stm32::USART1>,
    framer: Framer,
}

impl HmiReceiver {
    pub fn new(rx: hal::serial::Rx<hal::stm32::USART1>) -> Self {
        Self {
            rx,
            framer: Framer::default(),
        }
    }

    /// Service the USART1 interrupt.
    ///
    /// Returns the parsed frame once the line went idle.
    pub fn handle_interrupt(&mut self) -> Option<Result<Command, ParseError>> {
        while let Ok(byte) = self.rx.read() {
            self.framer.push(byte);
        }

        // Note(unsafe): Only the IDLE flag is read and cleared here. The HAL
        // does not expose it.
        let usart = unsafe { &*hal::stm32::USART1::ptr() };
        if usart.isr.read().idle().bit_is_set() {
            usart.icr.write(|w| w.idlecf().set_bit());
            self.framer.idle()
        } else {
            None
        }
    }
}

pub struct HmiTransmitter {
    tx: hal::serial::Tx<hal::stm32::USART1>,
}

impl HmiTransmitter {
    pub fn new(tx: hal::serial::Tx<hal::stm32::USART1>) -> Self {
        Self { tx }
    }

    /// Blocking write of the page instruction.
    pub fn send(&mut self, page: Page) {
        for byte in page.encode() {
            while self.tx.write(byte).is_err() {}
        }
        while self.tx.flush().is_err() {}
        log::info!("Sent page {}", page.0);
    }
}
