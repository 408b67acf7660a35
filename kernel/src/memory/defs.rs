use core::mem::size_of;

use bitflags::bitflags;

/// Macros

#[macro_export]
macro_rules! PAGE_DIR_INDEX {
    ($n:expr) => {
        ($n >> $crate::memory::defs::PAGE_DIR_SHIFT) & 0x3FF
    };
}

/// VM Definitions
pub const PAGE_SIZE: usize = 4096;
pub const LARGE_PAGE_SIZE: usize = 0x40_0000; // 4 MiB
pub const PAGE_ENTRY_SIZE: usize = size_of::<u32>();
pub const NUMBER_PAGE_ENTRIES: usize = PAGE_SIZE / PAGE_ENTRY_SIZE;

pub const PAGE_DIR_SHIFT: usize = 22;

/// Physical Layout
pub const KERNEL_STACK_TOP: u32 = 0x80_0000; // 8 MiB, end of the kernel page
pub const KERNEL_STACK_SIZE: u32 = 0x2000; // 8 KiB per process
pub const PROGRAM_FRAME_BASE: u32 = 0x80_0000; // First 4 MiB frame handed to processes
pub const VGA_MEMORY: u32 = 0xB8000;

/// User Layout
pub const PROGRAM_WINDOW: u32 = 0x0800_0000; // 128 MiB
pub const PROGRAM_WINDOW_END: u32 = PROGRAM_WINDOW + LARGE_PAGE_SIZE as u32;
pub const PROGRAM_IMAGE: u32 = 0x0804_8000;
pub const PROGRAM_IMAGE_OFFSET: usize = (PROGRAM_IMAGE - PROGRAM_WINDOW) as usize;
pub const USER_STACK_TOP: u32 = PROGRAM_WINDOW_END - 4;
pub const VIDEO_WINDOW: u32 = 0x0840_0000; // 132 MiB

pub const PROGRAM_DIRECTORY_INDEX: usize = PAGE_DIR_INDEX!(PROGRAM_WINDOW as usize);
pub const VIDEO_DIRECTORY_INDEX: usize = PAGE_DIR_INDEX!(VIDEO_WINDOW as usize);

bitflags! {
    pub struct PageFlags: u32 {
        const PRESENT           = 0x001;
        const WRITABLE          = 0x002;
        const USER              = 0x004;
        const LARGE             = 0x080; // 4 MiB page, directory entries only
    }
}

/// Raw page directory or page table entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageEntry(pub u32);

impl PageEntry {
    pub const NOT_PRESENT: PageEntry = PageEntry(0);

    pub fn new(address: u32, flags: PageFlags) -> Self {
        PageEntry((address & !0xFFF) | flags.bits())
    }

    pub fn address(&self) -> u32 {
        self.0 & !0xFFF
    }

    pub fn flags(&self) -> PageFlags {
        PageFlags::from_bits_truncate(self.0)
    }

    pub fn is_present(&self) -> bool {
        self.flags().contains(PageFlags::PRESENT)
    }
}

/// Text-mode page the video window can point at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoPage {
    Live,
    Scratch(usize),
}

impl VideoPage {
    pub fn address(&self) -> u32 {
        match self {
            VideoPage::Live => VGA_MEMORY,
            VideoPage::Scratch(terminal) => VGA_MEMORY + (*terminal as u32 + 1) * PAGE_SIZE as u32,
        }
    }
}
