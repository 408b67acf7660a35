/// Wiring of the scheduler core to the real machine, and the entry points the interrupt stubs
/// and boot code call into.
use core::slice;

use spin::Mutex;
use volatile::Volatile;

use crate::{
    devices::{
        debug::debug_init,
        defs::{SCHEDULER_HZ, SCREEN_CELLS},
        DeviceSet, ScreenMemory,
    },
    filesystem::fs::ReadOnlyFs,
    interrupts::{irqs, system_calls},
    memory::defs::VideoPage,
    misc::logo::print_logo,
    println,
    scheduler::scheduler::Scheduler,
};

use super::{context::HardwareContext, paging::X86Hardware, timer};

/// VGA text buffer and the scratch pages right after it
pub struct VgaMemory;

impl ScreenMemory for VgaMemory {
    fn page(&mut self, page: VideoPage) -> &mut [Volatile<u16>] {
        unsafe { slice::from_raw_parts_mut(page.address() as *mut Volatile<u16>, SCREEN_CELLS) }
    }
}

pub type Kernel = Scheduler<ReadOnlyFs<'static>, DeviceSet<VgaMemory>, X86Hardware>;

pub static SCHEDULER: Mutex<Kernel> = Mutex::new(Scheduler::new(
    ReadOnlyFs::unmounted(),
    DeviceSet::new(VgaMemory),
    X86Hardware,
));

/// Called by the boot code with interrupts disabled, the GDT, IDT and TSS loaded and the boot
/// filesystem module at `fs_address`.
#[no_mangle]
pub extern "C" fn kernel_main(fs_address: u32, fs_length: u32) -> ! {
    if debug_init().is_ok() {
        print_logo();
    }

    let image = unsafe { slice::from_raw_parts(fs_address as *const u8, fs_length as usize) };
    let fs = match ReadOnlyFs::mount(image) {
        Ok(fs) => fs,
        Err(error) => panic!("[FATAL] Unable to mount boot filesystem: {}", error),
    };

    {
        let mut kernel = SCHEDULER.lock();
        println!(
            "[KERNEL] Mounted {} files, {} data blocks",
            fs.directory_count(),
            fs.data_block_count()
        );
        *kernel.filesystem_mut() = fs;
        kernel.devices_mut().init();
    }

    timer::init_pit(SCHEDULER_HZ);
    timer::init_rtc();

    println!("[KERNEL] Starting root shell");
    if let Err(error) = system_calls::perform(&SCHEDULER, &mut HardwareContext, |kernel| kernel.boot()) {
        panic!("[FATAL] Unable to start root shell: {}", error);
    }

    panic!("[FATAL] Returned from root shell");
}

#[no_mangle]
pub extern "C" fn timer_interrupt() {
    irqs::timer_tick(&SCHEDULER, &mut HardwareContext);
}

#[no_mangle]
pub extern "C" fn rtc_interrupt() {
    timer::rtc_acknowledge();
    if let Some(mut kernel) = SCHEDULER.try_lock() {
        kernel.devices_mut().rtc_tick();
    }
}

#[no_mangle]
pub extern "C" fn system_call(number: u32, arg0: u32, arg1: u32, arg2: u32) -> i32 {
    system_calls::system_call(&SCHEDULER, &mut HardwareContext, number, arg0, arg1, arg2)
}

#[no_mangle]
pub extern "C" fn deliver_fault(vector: u32) {
    irqs::deliver_fault(&SCHEDULER, &mut HardwareContext, vector as u8);
}

#[no_mangle]
pub extern "C" fn terminal_switch(terminal: u32) {
    irqs::terminal_switch(&SCHEDULER, terminal as usize);
}

/// Keyboard byte, already translated to ASCII
#[no_mangle]
pub extern "C" fn keyboard_input(byte: u8) {
    serial_byte(byte);
}

/// Feeds the displayed terminal. A byte arriving while the scheduler is locked is dropped.
pub fn serial_byte(byte: u8) {
    if let Some(mut kernel) = SCHEDULER.try_lock() {
        kernel.devices_mut().push_input(byte);
    }
}
