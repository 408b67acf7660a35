/// Context primitive. A saved context is the kernel stack pointer left after pushing the
/// callee-saved registers, so the same restore path serves switches, returns from execute and
/// never-returning resumes. The restored call returns with eax holding the delivered status.
use core::arch::global_asm;

use crate::{
    devices::uart::COM1_PORT,
    scheduler::context::{ContextSwitch, SavedContext, UserEntry},
};

use super::{
    defs::{EFlags, USER_CS, USER_DS},
    helpers::{cli, read_eflags, sti_hlt},
};

global_asm!(
    ".global context_enter_user",
    "context_enter_user:",
    "    push ebp",
    "    push ebx",
    "    push esi",
    "    push edi",
    // [esp + 20] save, [esp + 24] eip, [esp + 28] esp, [esp + 32] eflags,
    // [esp + 36] cs, [esp + 40] ds
    "    mov eax, [esp + 20]",
    "    test eax, eax",
    "    jz 2f",
    "    mov [eax], esp",
    "    mov [eax + 4], ebp",
    "2:",
    "    mov ecx, [esp + 24]",
    "    mov edx, [esp + 28]",
    "    mov ebx, [esp + 32]",
    "    mov esi, [esp + 36]",
    "    mov eax, [esp + 40]",
    "    mov ds, ax",
    "    mov es, ax",
    "    mov fs, ax",
    "    mov gs, ax",
    "    push eax",
    "    push edx",
    "    push ebx",
    "    push esi",
    "    push ecx",
    "    iretd",
    "",
    ".global context_switch",
    "context_switch:",
    "    push ebp",
    "    push ebx",
    "    push esi",
    "    push edi",
    "    mov eax, [esp + 20]",
    "    mov [eax], esp",
    "    mov [eax + 4], ebp",
    "    mov ebp, [esp + 28]",
    "    mov esp, [esp + 24]",
    "    xor eax, eax",
    "    pop edi",
    "    pop esi",
    "    pop ebx",
    "    pop ebp",
    "    ret",
    "",
    ".global context_resume",
    "context_resume:",
    "    mov eax, [esp + 12]",
    "    mov ebp, [esp + 8]",
    "    mov esp, [esp + 4]",
    "    pop edi",
    "    pop esi",
    "    pop ebx",
    "    pop ebp",
    "    ret",
);

extern "C" {
    fn context_enter_user(
        save: *mut SavedContext,
        eip: u32,
        esp: u32,
        eflags: u32,
        cs: u32,
        ds: u32,
    ) -> u32;
    fn context_switch(save: *mut SavedContext, esp: u32, ebp: u32);
    fn context_resume(esp: u32, ebp: u32, status: u32) -> !;
}

pub struct HardwareContext;

impl ContextSwitch for HardwareContext {
    unsafe fn enter_user(&mut self, save: *mut SavedContext, entry: UserEntry) -> u32 {
        let eflags = EFlags::from_bits_truncate(read_eflags()) | EFlags::INTERRUPT_ENABLE;
        context_enter_user(
            save,
            entry.eip,
            entry.esp,
            eflags.bits(),
            USER_CS as u32,
            USER_DS as u32,
        )
    }

    unsafe fn switch(&mut self, save: *mut SavedContext, next: SavedContext) {
        context_switch(save, next.esp, next.ebp);
    }

    unsafe fn resume(&mut self, next: SavedContext, status: u32) {
        context_resume(next.esp, next.ebp, status)
    }

    fn wait_for_interrupt(&mut self) {
        sti_hlt();
        cli();

        // Serial input is polled as well, the line may be down to interrupts
        while let Some(byte) = COM1_PORT.receive() {
            super::platform::serial_byte(byte);
        }
    }
}
