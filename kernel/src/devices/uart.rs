/// Polled 16550 UART. COM1 carries the kernel log and doubles as an input line for the displayed
/// terminal. More information can be found here https://wiki.osdev.org/Serial_Ports.
use crate::x86::helpers::{inb, outb};

use super::{defs::*, error::SerialError};

pub struct SerialPort {
    base: u16,
}

pub static COM1_PORT: SerialPort = SerialPort::new(COM1);

impl SerialPort {
    pub const fn new(base: u16) -> Self {
        SerialPort { base }
    }

    fn register(&self, offset: u16) -> u16 {
        self.base + offset
    }

    /// 38400 baud, 8N1, receive interrupt on. Fails when nothing answers at the port.
    pub fn init(&self) -> Result<(), SerialError> {
        outb(self.register(UART_INTERRUPT_ENABLE), 0x00);
        outb(self.register(UART_LINE_CONTROL), UART_DIVISOR_LATCH);
        outb(self.register(UART_DATA), (UART_BAUD_DIVISOR & 0xFF) as u8);
        outb(self.register(UART_INTERRUPT_ENABLE), (UART_BAUD_DIVISOR >> 8) as u8);
        outb(self.register(UART_LINE_CONTROL), UART_8N1);
        outb(self.register(UART_FIFO_CONTROL), 0x00);
        outb(self.register(UART_MODEM_CONTROL), 0x00);
        outb(self.register(UART_INTERRUPT_ENABLE), 0x01);

        // A missing port floats the status line high
        if inb(self.register(UART_LINE_STATUS)) == 0xFF {
            return Err(SerialError::PortUnavailable);
        }

        // Drop anything pending from before the reset
        inb(self.register(UART_FIFO_CONTROL));
        inb(self.register(UART_DATA));
        Ok(())
    }

    /// Gives up waiting for the transmitter after a bounded number of polls
    pub fn send(&self, byte: u8) {
        for _ in 0..UART_SEND_RETRIES {
            if inb(self.register(UART_LINE_STATUS)) & UART_TRANSMIT_EMPTY != 0 {
                break;
            }
        }

        outb(self.register(UART_DATA), byte);
    }

    pub fn receive(&self) -> Option<u8> {
        if inb(self.register(UART_LINE_STATUS)) & UART_DATA_READY == 0 {
            return None;
        }

        Some(inb(self.register(UART_DATA)))
    }
}
