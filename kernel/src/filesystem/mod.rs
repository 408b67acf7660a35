pub mod defs;
pub mod error;
pub mod fops;
pub mod fs;

use self::{defs::FILE_NAME_LENGTH, error::FsError};

/// Class of a directory entry as stored in the image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FileType {
    Rtc = 0,
    Directory = 1,
    Regular = 2,
}

impl FileType {
    pub fn from_raw(raw: u32) -> Option<FileType> {
        match raw {
            0 => Some(FileType::Rtc),
            1 => Some(FileType::Directory),
            2 => Some(FileType::Regular),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: [u8; FILE_NAME_LENGTH],
    pub file_type: u32,
    pub inode: u32,
    pub size: u32,
}

impl DirectoryEntry {
    /// Name without its NUL padding
    pub fn name(&self) -> &[u8] {
        let length = self
            .name
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(FILE_NAME_LENGTH);
        &self.name[..length]
    }
}

/// Read-only view of the boot filesystem
pub trait FileSystem {
    fn resolve(&self, name: &[u8]) -> Result<DirectoryEntry, FsError>;

    /// Copies bytes of `inode` starting at `offset`. Returns 0 at end of file.
    fn read(&self, inode: u32, offset: u32, buffer: &mut [u8]) -> Result<usize, FsError>;

    fn entry_at(&self, index: u32) -> Option<DirectoryEntry>;
}
