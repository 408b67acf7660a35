/// Descriptor layer. Every open descriptor is bound to one device class, and each class answers
/// the same four operations (open, read, write, close). Classes without a meaningful operation
/// fail it with `FileError::BadCall`.
use crate::{
    devices::Devices,
    scheduler::{
        defs::{Pid, TerminalId, FIRST_USER_FD, MAX_OPEN_FILES, STDIN, STDOUT},
        error::FileError,
    },
};

use super::{DirectoryEntry, FileSystem, FileType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOps {
    Stdin,
    Stdout,
    Rtc,
    Regular,
    Directory,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
    pub ops: FileOps,
    pub inode: Option<u32>,
    pub position: Option<u32>,
    pub in_use: bool,
}

/// Process performing the I/O, plus the services the device classes reach into
pub struct FileContext<'a, F, D> {
    pub fs: &'a F,
    pub devices: &'a mut D,
    pub pid: Pid,
    pub terminal: TerminalId,
}

impl FileDescriptor {
    pub const CLOSED: FileDescriptor = FileDescriptor {
        ops: FileOps::Closed,
        inode: None,
        position: None,
        in_use: false,
    };

    const fn console(ops: FileOps) -> Self {
        FileDescriptor {
            ops,
            inode: None,
            position: None,
            in_use: true,
        }
    }

    pub fn open(ops: FileOps, entry: &DirectoryEntry) -> Self {
        FileDescriptor {
            ops,
            inode: Some(entry.inode),
            position: Some(0),
            in_use: true,
        }
    }
}

impl FileOps {
    pub fn for_type(raw: u32) -> Result<FileOps, FileError> {
        match FileType::from_raw(raw) {
            Some(FileType::Rtc) => Ok(FileOps::Rtc),
            Some(FileType::Directory) => Ok(FileOps::Directory),
            Some(FileType::Regular) => Ok(FileOps::Regular),
            None => Err(FileError::UnsupportedFileType(raw)),
        }
    }

    pub fn open<F: FileSystem, D: Devices>(
        self,
        io: &mut FileContext<F, D>,
    ) -> Result<(), FileError> {
        match self {
            FileOps::Rtc => Ok(io.devices.rtc_open(io.pid)?),
            FileOps::Regular | FileOps::Directory => Ok(()),
            _ => Err(FileError::BadCall),
        }
    }

    pub fn read<F: FileSystem, D: Devices>(
        self,
        descriptor: &mut FileDescriptor,
        io: &mut FileContext<F, D>,
        buffer: &mut [u8],
    ) -> Result<usize, FileError> {
        match self {
            FileOps::Stdin => Ok(io.devices.terminal_read(io.terminal, buffer)?),
            FileOps::Rtc => Ok(io.devices.rtc_read(io.pid)?),
            FileOps::Regular => {
                let inode = descriptor.inode.ok_or(FileError::BadCall)?;
                let position = descriptor.position.unwrap_or(0);
                let read = io.fs.read(inode, position, buffer)?;
                descriptor.position = Some(position + read as u32);
                Ok(read)
            }
            FileOps::Directory => {
                let position = descriptor.position.unwrap_or(0);
                let Some(entry) = io.fs.entry_at(position) else {
                    return Ok(0);
                };

                let name = entry.name();
                let length = name.len().min(buffer.len());
                buffer[..length].copy_from_slice(&name[..length]);
                descriptor.position = Some(position + 1);
                Ok(length)
            }
            FileOps::Stdout | FileOps::Closed => Err(FileError::BadCall),
        }
    }

    pub fn write<F: FileSystem, D: Devices>(
        self,
        io: &mut FileContext<F, D>,
        buffer: &[u8],
    ) -> Result<usize, FileError> {
        match self {
            FileOps::Stdout => Ok(io.devices.terminal_write(io.terminal, buffer)?),
            FileOps::Rtc => Ok(io.devices.rtc_write(io.pid, buffer)?),
            _ => Err(FileError::BadCall),
        }
    }

    pub fn close<F: FileSystem, D: Devices>(
        self,
        descriptor: &mut FileDescriptor,
        io: &mut FileContext<F, D>,
    ) -> Result<(), FileError> {
        let closed = match self {
            FileOps::Rtc => io.devices.rtc_close(io.pid).map_err(FileError::from),
            FileOps::Regular | FileOps::Directory => Ok(()),
            _ => return Err(FileError::BadCall),
        };

        // The slot is freed even when the device refuses the close
        *descriptor = FileDescriptor::CLOSED;
        closed
    }
}

/// Per-process descriptor table. Slots 0 and 1 are the terminal for the whole life of the
/// process.
#[derive(Clone, Copy, Debug)]
pub struct FileTable {
    descriptors: [FileDescriptor; MAX_OPEN_FILES],
}

impl FileTable {
    pub fn new() -> Self {
        let mut descriptors = [FileDescriptor::CLOSED; MAX_OPEN_FILES];
        descriptors[STDIN] = FileDescriptor::console(FileOps::Stdin);
        descriptors[STDOUT] = FileDescriptor::console(FileOps::Stdout);
        FileTable { descriptors }
    }

    pub fn get(&self, fd: u32) -> Result<&FileDescriptor, FileError> {
        match self.descriptors.get(fd as usize) {
            Some(descriptor) if descriptor.in_use => Ok(descriptor),
            _ => Err(FileError::InvalidDescriptor(fd)),
        }
    }

    pub fn get_mut(&mut self, fd: u32) -> Result<&mut FileDescriptor, FileError> {
        match self.descriptors.get_mut(fd as usize) {
            Some(descriptor) if descriptor.in_use => Ok(descriptor),
            _ => Err(FileError::InvalidDescriptor(fd)),
        }
    }

    pub fn free_slot(&self) -> Result<usize, FileError> {
        (FIRST_USER_FD..MAX_OPEN_FILES)
            .find(|&fd| !self.descriptors[fd].in_use)
            .ok_or(FileError::TooManyOpenFiles)
    }

    pub fn install(&mut self, fd: usize, descriptor: FileDescriptor) {
        self.descriptors[fd] = descriptor;
    }

    /// Descriptors opened by the process itself
    pub fn user_descriptors(&self) -> impl Iterator<Item = usize> + '_ {
        (FIRST_USER_FD..MAX_OPEN_FILES).filter(move |&fd| self.descriptors[fd].in_use)
    }
}
