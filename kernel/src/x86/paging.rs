use core::{ptr::addr_of, slice};

use crate::memory::{
    defs::*,
    vm::{KernelStack, PageTables, TaskState},
};

use super::{
    defs::TaskStateSegment,
    helpers::{flush_tlb, rcr3},
};

/// Page table backing the video window. Only its first entry is ever used.
#[repr(C, align(4096))]
struct PageTable([PageEntry; NUMBER_PAGE_ENTRIES]);

static mut VIDEO_TABLE: PageTable = PageTable([PageEntry::NOT_PRESENT; NUMBER_PAGE_ENTRIES]);

/// Loaded into the task register by the boot code
#[no_mangle]
pub static mut TSS: TaskStateSegment = TaskStateSegment::new();

/// Live page directory and task state of the CPU. The kernel is identity mapped, so physical
/// addresses of kernel statics can be handed to the MMU as they are.
pub struct X86Hardware;

impl PageTables for X86Hardware {
    fn set_directory_entry(&mut self, index: usize, entry: PageEntry) {
        let directory = rcr3() as *mut PageEntry;
        unsafe { directory.add(index).write_volatile(entry) };
    }

    fn set_video_entry(&mut self, entry: PageEntry) {
        unsafe { VIDEO_TABLE.0[0] = entry };
    }

    fn video_table(&self) -> u32 {
        unsafe { addr_of!(VIDEO_TABLE) as u32 }
    }

    fn flush_tlb(&mut self) {
        flush_tlb();
    }

    fn program_window(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(PROGRAM_WINDOW as *mut u8, LARGE_PAGE_SIZE) }
    }
}

impl TaskState for X86Hardware {
    fn set_kernel_stack(&mut self, stack: KernelStack) {
        unsafe { TSS.esp0 = stack.top() };
    }
}
