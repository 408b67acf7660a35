use spin::Mutex;

use crate::{
    devices::Devices,
    filesystem::FileSystem,
    memory::vm::Hardware,
    println,
    scheduler::{
        context::{ContextSwitch, Resumption},
        defs::TerminalId,
        error::ProcessError,
        scheduler::Scheduler,
    },
};

use super::{defs::Fault, system_calls::perform};

/// Clock tick: hand the CPU to the next runnable process. A tick that lands while the
/// scheduler is locked is dropped, the next one will catch up.
pub fn timer_tick<F, D, H, C>(scheduler: &Mutex<Scheduler<F, D, H>>, cpu: &mut C)
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
    C: ContextSwitch,
{
    let (switch, save) = {
        let Some(mut kernel) = scheduler.try_lock() else {
            return;
        };
        let Some(switch) = kernel.schedule() else {
            return;
        };
        let save = kernel.context_slot(Some(switch.from));
        (switch, save)
    };

    match switch.resume {
        Resumption::Context(next) => unsafe { cpu.switch(save, next) },
        Resumption::Enter(entry) => {
            unsafe { cpu.enter_user(save, entry) };
        }
    }
}

/// Processor exception raised by user code: the process dies, its parent carries on
pub fn deliver_fault<F, D, H, C>(scheduler: &Mutex<Scheduler<F, D, H>>, cpu: &mut C, vector: u8)
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
    C: ContextSwitch,
{
    let fault = Fault::from_vector(vector);
    if let Err(error) = perform(scheduler, cpu, |kernel| kernel.fault(fault)) {
        panic!("[FATAL] {} exception not recoverable: {}", fault, error);
    }
}

/// Keyboard hot key for terminal `terminal`
pub fn terminal_switch<F, D, H>(scheduler: &Mutex<Scheduler<F, D, H>>, terminal: TerminalId)
where
    F: FileSystem,
    D: Devices,
    H: Hardware,
{
    match scheduler.lock().switch_terminal(terminal) {
        Ok(()) | Err(ProcessError::InvalidTerminal(_)) => {}
        Err(error) => println!("[ERROR] Unable to start terminal {}: {}", terminal, error),
    }
}
