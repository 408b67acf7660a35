use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    // Image is shorter than its boot block claims
    CorruptedImage,
    FileNotFound,
    InvalidINode(u32),
    InvalidDataBlock(u32),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FsError::CorruptedImage => write!(f, "corrupted filesystem image"),
            FsError::FileNotFound => write!(f, "file not found"),
            FsError::InvalidINode(inode) => write!(f, "invalid inode {}", inode),
            FsError::InvalidDataBlock(block) => write!(f, "invalid data block {}", block),
        }
    }
}
