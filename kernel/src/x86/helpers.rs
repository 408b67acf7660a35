use core::arch::asm;

use super::defs::EFlags;

// ******** Control Registers ********

#[inline]
pub fn lcr3(page_dir: usize) {
    unsafe {
        asm!("mov cr3, {}", in(reg) page_dir, options(nostack, preserves_flags));
    }
}

#[inline]
pub fn rcr3() -> usize {
    let page_dir: usize;
    unsafe {
        asm!("mov {}, cr3", out(reg) page_dir, options(nomem, nostack, preserves_flags));
    }
    page_dir
}

/// Reloading CR3 drops every non-global TLB entry
#[inline]
pub fn flush_tlb() {
    lcr3(rcr3());
}

// ******** Interrupts ********

#[inline]
pub fn cli() {
    unsafe {
        asm!("cli", options(nomem, nostack));
    }
}

#[inline]
pub fn sti() {
    unsafe {
        asm!("sti", options(nomem, nostack));
    }
}

/// Enables interrupts and waits for the next one. `sti` only takes effect after the following
/// instruction, so no interrupt can slip in between the two.
#[inline]
pub fn sti_hlt() {
    unsafe {
        asm!("sti; hlt", options(nomem, nostack));
    }
}

#[inline]
pub fn hlt() {
    unsafe {
        asm!("hlt", options(nomem, nostack));
    }
}

#[inline]
pub fn read_eflags() -> u32 {
    let eflags: u32;
    unsafe {
        asm!("pushfd; pop {}", out(reg) eflags, options(nomem, preserves_flags));
    }
    eflags
}

#[inline]
pub fn interrupts_enabled() -> bool {
    EFlags::from_bits_truncate(read_eflags()).contains(EFlags::INTERRUPT_ENABLE)
}

// ************ I/O Ports ************

#[inline]
pub fn outb(port: u16, value: u8) {
    unsafe {
        asm!(
            "out dx, al",
            in("dx") port,
            in("al") value,
            options(nomem, nostack, preserves_flags)
        );
    }
}

#[inline]
pub fn inb(port: u16) -> u8 {
    let value: u8;
    unsafe {
        asm!(
            "in al, dx",
            out("al") value,
            in("dx") port,
            options(nomem, nostack, preserves_flags)
        );
    }
    value
}
