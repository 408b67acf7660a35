/// Image Layout
pub const BLOCK_SIZE: usize = 4096;
pub const BOOT_HEADER_SIZE: usize = 64;
pub const DIRECTORY_ENTRY_SIZE: usize = 64;
pub const MAX_DIRECTORY_ENTRIES: usize = (BLOCK_SIZE - BOOT_HEADER_SIZE) / DIRECTORY_ENTRY_SIZE;
pub const BLOCKS_PER_INODE: usize = BLOCK_SIZE / 4 - 1;

/// Directory Entries
pub const FILE_NAME_LENGTH: usize = 32;
pub const FILE_TYPE_OFFSET: usize = 32;
pub const INODE_OFFSET: usize = 36;
