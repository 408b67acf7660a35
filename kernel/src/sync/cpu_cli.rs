use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Depth of nested `push_cli` calls and the interrupt flag observed by the outermost one.
struct CpuState {
    number_cli: AtomicUsize,
    interrupts_were_enabled: AtomicBool,
    #[cfg(not(target_arch = "x86"))]
    interrupt_flag: AtomicBool,
}

impl CpuState {
    const fn new() -> Self {
        CpuState {
            number_cli: AtomicUsize::new(0),
            interrupts_were_enabled: AtomicBool::new(false),
            #[cfg(not(target_arch = "x86"))]
            interrupt_flag: AtomicBool::new(false),
        }
    }
}

#[cfg(not(test))]
fn cpu() -> &'static CpuState {
    static CPU: CpuState = CpuState::new();
    &CPU
}

/// Every test thread stands in for its own CPU
#[cfg(test)]
fn cpu() -> &'static CpuState {
    std::thread_local! {
        static CPU: &'static CpuState = std::boxed::Box::leak(std::boxed::Box::new(CpuState::new()));
    }
    CPU.with(|cpu| *cpu)
}

#[cfg(target_arch = "x86")]
mod flag {
    pub use crate::x86::helpers::{cli as disable, interrupts_enabled as enabled, sti as enable};
}

/// Off target there is no interrupt flag to toggle, so a simulated one keeps the nesting
/// bookkeeping observable.
#[cfg(not(target_arch = "x86"))]
mod flag {
    use core::sync::atomic::Ordering;

    use super::cpu;

    pub fn enabled() -> bool {
        cpu().interrupt_flag.load(Ordering::SeqCst)
    }

    pub fn disable() {
        cpu().interrupt_flag.store(false, Ordering::SeqCst);
    }

    pub fn enable() {
        cpu().interrupt_flag.store(true, Ordering::SeqCst);
    }
}

pub fn push_cli() {
    // Clear interrupts as soon as possible
    let interrupt_status = flag::enabled();
    flag::disable();

    // Save the current state of the Interrupt Flag
    let cpu = cpu();
    if cpu.number_cli.fetch_add(1, Ordering::SeqCst) == 0 {
        cpu.interrupts_were_enabled.store(interrupt_status, Ordering::SeqCst);
    }
}

pub fn pop_cli() {
    if flag::enabled() {
        panic!("[FATAL] pop_cli with interrupts enabled");
    }

    let cpu = cpu();
    let number_cli = cpu.number_cli.load(Ordering::SeqCst);
    if number_cli == 0 {
        panic!("[FATAL] pop_cli without matching push_cli");
    }
    cpu.number_cli.store(number_cli - 1, Ordering::SeqCst);

    if number_cli == 1 && cpu.interrupts_were_enabled.load(Ordering::SeqCst) {
        flag::enable();
    }
}

/// Interrupt-disabled section that ends when the guard is dropped
pub struct CliGuard {
    _private: (),
}

impl CliGuard {
    pub fn new() -> Self {
        push_cli();
        CliGuard { _private: () }
    }
}

impl Drop for CliGuard {
    fn drop(&mut self) {
        pop_cli();
    }
}
