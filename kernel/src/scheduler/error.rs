use core::fmt;

use crate::{
    devices::error::DeviceError, filesystem::error::FsError, memory::error::MemoryError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutableError {
    InvalidMagic([u8; 4]),
    NotRegularFile(u32),
    MissingEntryPoint,
    ImageOverflow(u32, u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessError {
    EmptyCommand,
    FileNotFound,
    InvalidExecutable(ExecutableError),
    SlotAllocationFailure,
    LoadFailure(FsError),
    NoCurrentProcess,
    InvalidTerminal(usize),
    NoArguments,
    BadAddress(MemoryError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileError {
    InvalidDescriptor(u32),
    TooManyOpenFiles,
    FileNotFound,
    UnsupportedFileType(u32),
    // Operation the descriptor's device class does not provide
    BadCall,
    WouldBlock,
    NoCurrentProcess,
    BadAddress(MemoryError),
    Device(DeviceError),
    Filesystem(FsError),
}

impl From<MemoryError> for ProcessError {
    fn from(error: MemoryError) -> Self {
        ProcessError::BadAddress(error)
    }
}

impl From<ExecutableError> for ProcessError {
    fn from(error: ExecutableError) -> Self {
        ProcessError::InvalidExecutable(error)
    }
}

impl From<MemoryError> for FileError {
    fn from(error: MemoryError) -> Self {
        FileError::BadAddress(error)
    }
}

impl From<FsError> for FileError {
    fn from(error: FsError) -> Self {
        FileError::Filesystem(error)
    }
}

impl From<DeviceError> for FileError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::WouldBlock => FileError::WouldBlock,
            error => FileError::Device(error),
        }
    }
}

impl fmt::Display for ExecutableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutableError::InvalidMagic(magic) => write!(f, "invalid magic {:02x?}", magic),
            ExecutableError::NotRegularFile(raw) => write!(f, "file of type {} is not a program", raw),
            ExecutableError::MissingEntryPoint => write!(f, "missing entry point"),
            ExecutableError::ImageOverflow(size, capacity) => {
                write!(f, "image of {} bytes exceeds {} bytes", size, capacity)
            }
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessError::EmptyCommand => write!(f, "empty command"),
            ProcessError::FileNotFound => write!(f, "executable not found"),
            ProcessError::InvalidExecutable(error) => write!(f, "invalid executable: {}", error),
            ProcessError::SlotAllocationFailure => write!(f, "too many processes"),
            ProcessError::LoadFailure(error) => write!(f, "failed to load image: {}", error),
            ProcessError::NoCurrentProcess => write!(f, "no current process"),
            ProcessError::InvalidTerminal(terminal) => write!(f, "invalid terminal {}", terminal),
            ProcessError::NoArguments => write!(f, "no arguments"),
            ProcessError::BadAddress(error) => write!(f, "{}", error),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileError::InvalidDescriptor(fd) => write!(f, "invalid descriptor {}", fd),
            FileError::TooManyOpenFiles => write!(f, "too many open files"),
            FileError::FileNotFound => write!(f, "file not found"),
            FileError::UnsupportedFileType(raw) => write!(f, "unsupported file type {}", raw),
            FileError::BadCall => write!(f, "operation not supported"),
            FileError::WouldBlock => write!(f, "operation would block"),
            FileError::NoCurrentProcess => write!(f, "no current process"),
            FileError::BadAddress(error) => write!(f, "{}", error),
            FileError::Device(error) => write!(f, "{}", error),
            FileError::Filesystem(error) => write!(f, "{}", error),
        }
    }
}
