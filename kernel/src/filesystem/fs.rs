/// Boot filesystem handed over by the loader as a flat image of 4 KiB blocks: a boot block with
/// the directory, one block per inode listing its data blocks, then the data blocks themselves.
/// Nothing is ever written back, so the image is only borrowed.
use core::cmp::min;

use super::{
    defs::*,
    error::FsError,
    DirectoryEntry, FileSystem,
};

#[derive(Clone, Copy, Debug)]
pub struct ReadOnlyFs<'a> {
    image: &'a [u8],
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

impl<'a> ReadOnlyFs<'a> {
    /// Filesystem with no files, used until the boot module is mounted
    pub const fn unmounted() -> Self {
        ReadOnlyFs { image: &[] }
    }

    pub fn mount(image: &'a [u8]) -> Result<Self, FsError> {
        if image.len() < BLOCK_SIZE {
            return Err(FsError::CorruptedImage);
        }

        let fs = ReadOnlyFs { image };
        let blocks = 1 + fs.inode_count() as usize + fs.data_block_count() as usize;
        if fs.directory_count() as usize > MAX_DIRECTORY_ENTRIES || image.len() < blocks * BLOCK_SIZE
        {
            return Err(FsError::CorruptedImage);
        }

        Ok(fs)
    }

    pub fn is_mounted(&self) -> bool {
        !self.image.is_empty()
    }

    fn header(&self, offset: usize) -> u32 {
        if self.is_mounted() {
            read_u32(self.image, offset)
        } else {
            0
        }
    }

    pub fn directory_count(&self) -> u32 {
        self.header(0)
    }

    pub fn inode_count(&self) -> u32 {
        self.header(4)
    }

    pub fn data_block_count(&self) -> u32 {
        self.header(8)
    }

    fn inode_block(&self, inode: u32) -> Result<usize, FsError> {
        if inode >= self.inode_count() {
            return Err(FsError::InvalidINode(inode));
        }

        Ok((1 + inode as usize) * BLOCK_SIZE)
    }

    fn data_block(&self, block: u32) -> Result<usize, FsError> {
        if block >= self.data_block_count() {
            return Err(FsError::InvalidDataBlock(block));
        }

        Ok((1 + self.inode_count() as usize + block as usize) * BLOCK_SIZE)
    }

    fn file_length(&self, inode: u32) -> Result<u32, FsError> {
        Ok(read_u32(self.image, self.inode_block(inode)?))
    }

    fn dentry(&self, index: u32) -> DirectoryEntry {
        let base = BOOT_HEADER_SIZE + index as usize * DIRECTORY_ENTRY_SIZE;
        let mut name = [0u8; FILE_NAME_LENGTH];
        name.copy_from_slice(&self.image[base..base + FILE_NAME_LENGTH]);

        let inode = read_u32(self.image, base + INODE_OFFSET);
        DirectoryEntry {
            name,
            file_type: read_u32(self.image, base + FILE_TYPE_OFFSET),
            inode,
            size: self.file_length(inode).unwrap_or(0),
        }
    }
}

impl<'a> FileSystem for ReadOnlyFs<'a> {
    fn resolve(&self, name: &[u8]) -> Result<DirectoryEntry, FsError> {
        if name.is_empty() || name.len() > FILE_NAME_LENGTH {
            return Err(FsError::FileNotFound);
        }

        (0..self.directory_count())
            .map(|index| self.dentry(index))
            .find(|entry| entry.name() == name)
            .ok_or(FsError::FileNotFound)
    }

    fn read(&self, inode: u32, offset: u32, buffer: &mut [u8]) -> Result<usize, FsError> {
        let inode_base = self.inode_block(inode)?;
        let length = read_u32(self.image, inode_base);
        if offset >= length {
            return Ok(0);
        }

        let count = min(buffer.len(), (length - offset) as usize);
        let mut copied = 0;

        while copied < count {
            let position = offset as usize + copied;
            let block_index = position / BLOCK_SIZE;
            if block_index >= BLOCKS_PER_INODE {
                return Err(FsError::CorruptedImage);
            }

            let block = read_u32(self.image, inode_base + 4 + block_index * 4);
            let start = self.data_block(block)? + position % BLOCK_SIZE;
            let chunk = min(count - copied, BLOCK_SIZE - position % BLOCK_SIZE);

            buffer[copied..copied + chunk].copy_from_slice(&self.image[start..start + chunk]);
            copied += chunk;
        }

        Ok(copied)
    }

    fn entry_at(&self, index: u32) -> Option<DirectoryEntry> {
        if index < self.directory_count() {
            Some(self.dentry(index))
        } else {
            None
        }
    }
}
