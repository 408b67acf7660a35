#![cfg_attr(not(test), no_std)]

pub mod devices;
pub mod filesystem;
pub mod interrupts;
pub mod memory;
pub mod misc;
pub mod scheduler;
pub mod sync;
pub mod x86;

#[cfg(test)]
mod testing;

#[cfg(not(test))]
use core::panic::PanicInfo;

// Once the Kernel panics, enter an infinite loop
#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    sync::cpu_cli::push_cli();
    println!("{}", info);
    loop {}
}
