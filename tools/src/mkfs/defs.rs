use serde::Serialize;

/// Kind of a directory entry, stored as a u32 in the image
#[repr(u32)]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FileType {
    Rtc = 0,
    Directory = 1,
    Regular = 2,
}

/// First bytes of the boot block. The rest of the 64 byte header is reserved.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BootHeader {
    pub directory_count: u32,
    pub inode_count: u32,
    pub data_block_count: u32,
}

/// Directory entry without its 24 reserved trailing bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DirectoryEntry {
    pub name: [u8; FILE_NAME_LENGTH],
    pub file_type: u32,
    pub inode: u32,
}

// General FS Information
pub const BLOCK_SIZE: usize = 4096;
pub const BOOT_HEADER_SIZE: usize = 64;
pub const DIRECTORY_ENTRY_SIZE: usize = 64;
pub const MAX_DIRECTORY_ENTRIES: usize = (BLOCK_SIZE - BOOT_HEADER_SIZE) / DIRECTORY_ENTRY_SIZE;

// INodes: a length followed by the data block numbers, one inode per block
pub const BLOCKS_PER_INODE: usize = BLOCK_SIZE / 4 - 1;
pub const MAX_FILE_SIZE: usize = BLOCKS_PER_INODE * BLOCK_SIZE;

// Directories
pub const FILE_NAME_LENGTH: usize = 32;
pub const RTC_NAME: &str = "rtc";
