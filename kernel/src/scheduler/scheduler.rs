use core::ptr;

use crate::{
    devices::Devices,
    filesystem::FileSystem,
    memory::vm::{self, Hardware},
    sync::cpu_cli::CliGuard,
};

use super::{
    context::{Handoff, Resumption, SavedContext, Switch},
    defs::*,
    error::ProcessError,
    exec::{Placement, ParsedCommand},
    process::{Pcb, ProcessTable},
};

#[cfg(feature = "trace-scheduler")]
use crate::println;

/// Process control and scheduling state. Everything the lifecycle calls mutate lives here so a
/// single lock covers it; callers outside the lock only ever see a `ProcessSnapshot`.
pub struct Scheduler<F, D, H> {
    pub(super) processes: ProcessTable,
    pub(super) current: Option<Pid>,
    pub(super) displayed: TerminalId,
    pub(super) active: [bool; NUM_TERMINALS],
    pub(super) fs: F,
    pub(super) devices: D,
    pub(super) hardware: H,
}

/// Copy of the scheduling state taken under the lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub current: Option<Pid>,
    pub current_terminal: Option<TerminalId>,
    pub displayed: TerminalId,
    pub active: [bool; NUM_TERMINALS],
    pub live: usize,
}

impl<F: FileSystem, D: Devices, H: Hardware> Scheduler<F, D, H> {
    pub const fn new(fs: F, devices: D, hardware: H) -> Self {
        Scheduler {
            processes: ProcessTable::new(),
            current: None,
            displayed: 0,
            active: [false; NUM_TERMINALS],
            fs,
            devices,
            hardware,
        }
    }

    /// Launches the root shell of the first terminal
    pub fn boot(&mut self) -> Result<Handoff, ProcessError> {
        let _cli = CliGuard::new();

        self.active[0] = true;
        let pid = match self.launch(&ParsedCommand::shell(), Placement::Root(0)) {
            Ok(pid) => pid,
            Err(error) => {
                self.active[0] = false;
                return Err(error);
            }
        };

        Ok(self.enter(pid, None))
    }

    pub fn snapshot(&self) -> ProcessSnapshot {
        let _cli = CliGuard::new();

        ProcessSnapshot {
            current: self.current,
            current_terminal: self
                .current
                .and_then(|pid| self.processes.get(pid))
                .map(|pcb| pcb.terminal),
            displayed: self.displayed,
            active: self.active,
            live: self.processes.live(),
        }
    }

    pub fn process(&self, pid: Pid) -> Option<&Pcb> {
        self.processes.get(pid)
    }

    pub fn filesystem_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    pub fn devices_mut(&mut self) -> &mut D {
        &mut self.devices
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Where the context primitive records the suspended context of `pid`. Null for an empty
    /// slot, in which case nothing is recorded.
    pub fn context_slot(&mut self, pid: Option<Pid>) -> *mut SavedContext {
        match pid.and_then(|pid| self.processes.get_mut(pid)) {
            Some(pcb) => &mut pcb.context as *mut SavedContext,
            None => ptr::null_mut(),
        }
    }

    /// Makes `pid` current: program window, video window and privilege stack all follow it
    pub(super) fn make_current(&mut self, pid: Pid) {
        let previous_video = self
            .current
            .and_then(|current| self.processes.get(current))
            .map_or(false, |pcb| pcb.video_mapped);

        let Some(pcb) = self.processes.get(pid) else {
            panic!("[FATAL] Switching to empty slot {}", pid);
        };
        let (terminal, video_mapped, stack) = (pcb.terminal, pcb.video_mapped, pcb.kernel_stack);

        vm::map_process(&mut self.hardware, pid);
        if video_mapped {
            vm::map_video(&mut self.hardware, terminal, self.displayed);
        } else if previous_video {
            vm::unmap_video(&mut self.hardware);
        }

        self.hardware.set_kernel_stack(stack);
        self.current = Some(pid);
    }

    /// First run of `pid`, recording `suspend` when a caller waits for it
    pub(super) fn enter(&mut self, pid: Pid, suspend: Option<Pid>) -> Handoff {
        self.make_current(pid);

        let pcb = self.current_pcb_mut();
        pcb.started = true;
        Handoff::Enter {
            pid,
            entry: pcb.entry,
            suspend,
        }
    }

    pub(super) fn current_pcb_mut(&mut self) -> &mut Pcb {
        match self.current.and_then(|pid| self.processes.get_mut(pid)) {
            Some(pcb) => pcb,
            None => panic!("[FATAL] No current process"),
        }
    }

    /// Round robin step, run on every timer tick. Returns the switch to perform, if any.
    pub fn schedule(&mut self) -> Option<Switch> {
        let _cli = CliGuard::new();

        let from = self.current?;
        let to = self.processes.next_runnable(from);
        if to == from {
            return None;
        }

        self.make_current(to);
        let pcb = self.current_pcb_mut();
        let resume = if pcb.started {
            Resumption::Context(pcb.context)
        } else {
            pcb.started = true;
            Resumption::Enter(pcb.entry)
        };

        #[cfg(feature = "trace-scheduler")]
        println!("[SCHED] {} -> {}", from, to);

        Some(Switch { from, to, resume })
    }

    /// Brings `terminal` on screen, starting its root shell the first time it is shown
    pub fn switch_terminal(&mut self, terminal: TerminalId) -> Result<(), ProcessError> {
        let _cli = CliGuard::new();

        if terminal >= NUM_TERMINALS || terminal == self.displayed {
            return Err(ProcessError::InvalidTerminal(terminal));
        }

        self.devices.switch_screen(self.displayed, terminal);
        self.displayed = terminal;

        if let Some(pcb) = self.current.and_then(|pid| self.processes.get(pid)) {
            if pcb.video_mapped {
                vm::map_video(&mut self.hardware, pcb.terminal, self.displayed);
            }
        }

        if !self.active[terminal] {
            self.active[terminal] = true;
            if let Err(error) = self.spawn(terminal) {
                self.active[terminal] = false;
                return Err(error);
            }
        }

        Ok(())
    }
}
