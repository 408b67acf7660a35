use core::fmt;
use lazy_static::lazy_static;
use spin::Mutex;

#[cfg(target_arch = "x86")]
use super::uart::COM1_PORT;

/// Kernel log sink. Output is dropped until a serial port is attached.
pub struct Console {
    attached: bool,
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.attached {
            return Ok(());
        }

        for byte in s.bytes() {
            if byte == b'\n' {
                self.put_byte(b'\r');
            }
            self.put_byte(byte);
        }
        Ok(())
    }
}

impl Console {
    pub const fn new() -> Self {
        Console { attached: false }
    }

    #[cfg(target_arch = "x86")]
    fn put_byte(&self, byte: u8) {
        COM1_PORT.send(byte);
    }

    #[cfg(not(target_arch = "x86"))]
    fn put_byte(&self, _byte: u8) {}

    pub fn attach(&mut self) {
        self.attached = true;
    }
}

lazy_static! {
    pub static ref CONSOLE: Mutex<Console> = Mutex::new(Console::new());
}
