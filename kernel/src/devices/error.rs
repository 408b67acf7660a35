use core::fmt;

#[derive(Copy, Clone, Debug)]
pub enum SerialError {
    PortUnavailable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceError {
    // Nothing to deliver yet, retry once interrupts had a chance to run
    WouldBlock,
    NotOpen,
    InvalidFrequency(u32),
    InvalidLength(usize),
    InvalidTerminal(usize),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceError::WouldBlock => write!(f, "operation would block"),
            DeviceError::NotOpen => write!(f, "device is not open"),
            DeviceError::InvalidFrequency(hz) => write!(f, "invalid frequency {} Hz", hz),
            DeviceError::InvalidLength(length) => write!(f, "invalid buffer length {}", length),
            DeviceError::InvalidTerminal(terminal) => write!(f, "invalid terminal {}", terminal),
        }
    }
}
