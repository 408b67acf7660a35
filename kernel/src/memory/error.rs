use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryError {
    // User pointer outside of the program window
    MemorySpaceViolation(u32),

    // User range runs past the memory backing the program window
    PageNotFound(u32),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryError::MemorySpaceViolation(address) => {
                write!(f, "address {:#x} is outside the program window", address)
            }
            MemoryError::PageNotFound(address) => write!(f, "address {:#x} is not backed", address),
        }
    }
}
