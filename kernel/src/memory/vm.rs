use core::ops::Range;

use super::{
    defs::*,
    error::MemoryError,
};

/// Kernel stack reserved for a process slot. Stacks grow down from the end of the kernel page,
/// one 8 KiB region per slot, so no two slots ever overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelStack(u32);

impl KernelStack {
    pub const fn for_slot(pid: usize) -> Self {
        KernelStack(KERNEL_STACK_TOP - pid as u32 * KERNEL_STACK_SIZE - 4)
    }

    pub fn top(&self) -> u32 {
        self.0
    }
}

/// Page-directory writer for the two per-process windows. The kernel's own identity mapping is
/// installed at boot and never touched through this interface.
pub trait PageTables {
    fn set_directory_entry(&mut self, index: usize, entry: PageEntry);

    /// The single entry of the page table backing the video window
    fn set_video_entry(&mut self, entry: PageEntry);

    /// Physical address of the page table backing the video window
    fn video_table(&self) -> u32;

    fn flush_tlb(&mut self);

    /// Memory currently visible through the program window, starting at `PROGRAM_WINDOW`
    fn program_window(&mut self) -> &mut [u8];
}

/// Privilege-transition stack loaded by the CPU on every user to kernel entry
pub trait TaskState {
    fn set_kernel_stack(&mut self, stack: KernelStack);
}

pub trait Hardware: PageTables + TaskState {}

impl<T: PageTables + TaskState> Hardware for T {}

/// Physical 4 MiB frame holding the image of `pid`
pub fn program_frame(pid: usize) -> u32 {
    PROGRAM_FRAME_BASE + (pid * LARGE_PAGE_SIZE) as u32
}

/// Binds the program window to the frame of `pid`. Safe to repeat.
pub fn map_process<T: PageTables>(tables: &mut T, pid: usize) {
    let flags = PageFlags::PRESENT | PageFlags::WRITABLE | PageFlags::USER | PageFlags::LARGE;
    tables.set_directory_entry(
        PROGRAM_DIRECTORY_INDEX,
        PageEntry::new(program_frame(pid), flags),
    );
    tables.flush_tlb();
}

/// Binds the video window to the live text buffer when `terminal` is on screen, otherwise to the
/// terminal's scratch page so that background writes land off screen.
pub fn map_video<T: PageTables>(tables: &mut T, terminal: usize, displayed: usize) {
    let flags = PageFlags::PRESENT | PageFlags::WRITABLE | PageFlags::USER;
    let page = if terminal == displayed {
        VideoPage::Live
    } else {
        VideoPage::Scratch(terminal)
    };

    let table = tables.video_table();
    tables.set_directory_entry(VIDEO_DIRECTORY_INDEX, PageEntry::new(table, flags));
    tables.set_video_entry(PageEntry::new(page.address(), flags));
    tables.flush_tlb();
}

pub fn unmap_video<T: PageTables>(tables: &mut T) {
    tables.set_directory_entry(VIDEO_DIRECTORY_INDEX, PageEntry::NOT_PRESENT);
    tables.flush_tlb();
}

/// Translates a user range into offsets of the program window
pub fn user_range(address: u32, length: u32) -> Result<Range<usize>, MemoryError> {
    let end = address
        .checked_add(length)
        .ok_or(MemoryError::MemorySpaceViolation(address))?;

    if address < PROGRAM_WINDOW || end > PROGRAM_WINDOW_END {
        return Err(MemoryError::MemorySpaceViolation(address));
    }

    let start = (address - PROGRAM_WINDOW) as usize;
    Ok(start..start + length as usize)
}

/// Borrows a user range out of the program window
pub fn user_slice(window: &mut [u8], address: u32, length: u32) -> Result<&mut [u8], MemoryError> {
    let range = user_range(address, length)?;
    window
        .get_mut(range)
        .ok_or(MemoryError::PageNotFound(address))
}

/// Copies a NUL-terminated user string into `buffer`, truncating at its capacity
pub fn user_string<'a>(
    window: &[u8],
    address: u32,
    buffer: &'a mut [u8],
) -> Result<&'a [u8], MemoryError> {
    let start = user_range(address, 0)?.start;
    let source = window.get(start..).ok_or(MemoryError::PageNotFound(address))?;
    if source.is_empty() {
        return Err(MemoryError::PageNotFound(address));
    }

    let length = source
        .iter()
        .take(buffer.len())
        .position(|&byte| byte == 0)
        .unwrap_or_else(|| source.len().min(buffer.len()));

    buffer[..length].copy_from_slice(&source[..length]);
    Ok(&buffer[..length])
}
