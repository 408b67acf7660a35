use spin::Mutex;

use crate::{
    devices::Devices,
    filesystem::FileSystem,
    interrupts::defs::system_call as SystemCall,
    memory::vm::Hardware,
    println,
    scheduler::{
        context::{ContextSwitch, Handoff},
        error::{FileError, ProcessError},
        scheduler::Scheduler,
    },
};

/// Runs a lifecycle call under the lock, then gives the CPU to whatever it handed back. The lock
/// is released before the context primitive runs since the caller may not come back to drop it.
pub fn perform<F, D, H, C, L>(
    scheduler: &Mutex<Scheduler<F, D, H>>,
    cpu: &mut C,
    call: L,
) -> Result<u32, ProcessError>
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
    C: ContextSwitch,
    L: FnOnce(&mut Scheduler<F, D, H>) -> Result<Handoff, ProcessError>,
{
    let (handoff, save) = {
        let mut kernel = scheduler.lock();
        let handoff = call(&mut kernel)?;
        let suspend = match handoff {
            Handoff::Enter { suspend, .. } => suspend,
            Handoff::Resume { .. } => None,
        };
        (handoff, kernel.context_slot(suspend))
    };

    let status = match handoff {
        Handoff::Enter { entry, .. } => unsafe { cpu.enter_user(save, entry) },
        Handoff::Resume {
            context, status, ..
        } => {
            unsafe { cpu.resume(context, status) };
            status
        }
    };

    Ok(status)
}

/// Every system call passes through this handler. Arguments arrive in the order ebx, ecx, edx;
/// the result goes back in eax, `-1` on any failure.
pub fn system_call<F, D, H, C>(
    scheduler: &Mutex<Scheduler<F, D, H>>,
    cpu: &mut C,
    number: u32,
    arg0: u32,
    arg1: u32,
    arg2: u32,
) -> i32
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
    C: ContextSwitch,
{
    match number {
        SystemCall::HALT => {
            if let Err(error) = perform(scheduler, cpu, |kernel| kernel.halt(arg0 & 0xFF)) {
                panic!("[FATAL] Unable to halt process: {}", error);
            }
            0
        }
        SystemCall::EXECUTE => perform(scheduler, cpu, |kernel| kernel.execute_user(arg0))
            .map(|status| status as i32)
            .unwrap_or(SystemCall::FAILURE),
        SystemCall::READ => read(scheduler, cpu, arg0, arg1, arg2),
        SystemCall::WRITE => scheduler
            .lock()
            .write_user(arg0, arg1, arg2)
            .map(|count| count as i32)
            .unwrap_or(SystemCall::FAILURE),
        SystemCall::OPEN => scheduler
            .lock()
            .open_user(arg0)
            .map(|fd| fd as i32)
            .unwrap_or(SystemCall::FAILURE),
        SystemCall::CLOSE => scheduler
            .lock()
            .close(arg0)
            .map(|_| 0)
            .unwrap_or(SystemCall::FAILURE),
        SystemCall::GETARGS => scheduler
            .lock()
            .getargs_user(arg0, arg1)
            .map(|_| 0)
            .unwrap_or(SystemCall::FAILURE),
        SystemCall::VIDMAP => scheduler
            .lock()
            .vidmap(arg0)
            .map(|_| 0)
            .unwrap_or(SystemCall::FAILURE),
        _ => {
            println!("[WARNING] Invalid system call {}", number);
            SystemCall::FAILURE
        }
    }
}

/// Reads wait for their device with the lock released and interrupts enabled, so the timer can
/// run other processes and the keyboard or clock can deliver what the reader waits for.
fn read<F, D, H, C>(
    scheduler: &Mutex<Scheduler<F, D, H>>,
    cpu: &mut C,
    fd: u32,
    address: u32,
    length: u32,
) -> i32
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
    C: ContextSwitch,
{
    loop {
        let result = scheduler.lock().read_user(fd, address, length);
        match result {
            Err(FileError::WouldBlock) => cpu.wait_for_interrupt(),
            Ok(count) => return count as i32,
            Err(_) => return SystemCall::FAILURE,
        }
    }
}
