use crate::{
    devices::Devices,
    filesystem::{fops::FileContext, FileSystem},
    interrupts::defs::Fault,
    memory::vm::{self, Hardware},
    println,
    sync::cpu_cli::CliGuard,
};

use super::{
    context::Handoff,
    defs::*,
    error::ProcessError,
    exec::{ParsedCommand, Placement},
    process::Pcb,
    scheduler::Scheduler,
};

impl<F: FileSystem, D: Devices, H: Hardware> Scheduler<F, D, H> {
    /// Terminates the current process. Its parent resumes with `status` as the result of the
    /// execute call that launched it; a terminal root is replaced by a fresh shell instead.
    pub fn halt(&mut self, status: u32) -> Result<Handoff, ProcessError> {
        let _cli = CliGuard::new();

        let pid = self.current.ok_or(ProcessError::NoCurrentProcess)?;
        let pcb = self.teardown(pid);
        self.current = None;

        match pcb.parent {
            Some(parent) => {
                self.heal_terminals();
                self.resume_parent(parent, status)
            }
            None if self.processes.has_terminal(pcb.terminal) => {
                // Parent halted earlier, the terminal still has its shell
                self.heal_terminals();
                Ok(self.continue_next(pid))
            }
            None => {
                let shell = self.launch(&ParsedCommand::shell(), Placement::Root(pcb.terminal))?;
                Ok(self.enter(shell, None))
            }
        }
    }

    /// Kills the current process after an unhandled processor exception
    pub fn fault(&mut self, fault: Fault) -> Result<Handoff, ProcessError> {
        let _cli = CliGuard::new();

        let pid = self.current.ok_or(ProcessError::NoCurrentProcess)?;
        let pcb = self.current_pcb_mut();
        pcb.fault = Some(fault);
        println!(
            "[ERROR] Process {} ({:?}) killed by {} exception (code {})",
            pid,
            pcb.command,
            fault,
            fault.code()
        );

        self.halt(CRASH_STATUS)
    }

    /// Releases everything `pid` holds and frees its slot
    fn teardown(&mut self, pid: Pid) -> Pcb {
        let Some(pcb) = self.processes.get_mut(pid) else {
            panic!("[FATAL] Tearing down empty slot {}", pid);
        };

        if pcb.video_mapped {
            vm::unmap_video(&mut self.hardware);
        }

        let mut io = FileContext {
            fs: &self.fs,
            devices: &mut self.devices,
            pid,
            terminal: pcb.terminal,
        };
        for fd in FIRST_USER_FD..MAX_OPEN_FILES {
            if let Ok(descriptor) = pcb.files.get_mut(fd as u32) {
                let ops = descriptor.ops;
                if let Err(error) = ops.close(descriptor, &mut io) {
                    println!("[WARNING] Process {} failed to close fd {}: {}", pid, fd, error);
                }
            }
        }

        for child in self.processes.iter_mut().filter(|child| child.parent == Some(pid)) {
            child.parent = None;
        }

        match self.processes.release(pid) {
            Some(pcb) => pcb,
            None => panic!("[FATAL] Tearing down empty slot {}", pid),
        }
    }

    /// Starts a root shell on every active terminal left without processes
    fn heal_terminals(&mut self) {
        for terminal in 0..NUM_TERMINALS {
            if self.active[terminal] && !self.processes.has_terminal(terminal) {
                if let Err(error) = self.spawn(terminal) {
                    println!("[ERROR] Unable to restart shell on terminal {}: {}", terminal, error);
                }
            }
        }
    }

    fn resume_parent(&mut self, parent: Pid, status: u32) -> Result<Handoff, ProcessError> {
        let Some(pcb) = self.processes.get_mut(parent) else {
            panic!("[FATAL] Parent {} vanished", parent);
        };
        pcb.blocked = false;
        let context = pcb.context;

        self.make_current(parent);
        Ok(Handoff::Resume {
            pid: parent,
            context,
            status,
        })
    }

    /// Hands the CPU to whichever process follows the freed slot
    fn continue_next(&mut self, freed: Pid) -> Handoff {
        let next = self.processes.next_runnable(freed);
        if next == freed {
            panic!("[FATAL] No runnable process left");
        }

        self.make_current(next);
        let pcb = self.current_pcb_mut();
        if pcb.started {
            Handoff::Resume {
                pid: next,
                context: pcb.context,
                status: 0,
            }
        } else {
            pcb.started = true;
            Handoff::Enter {
                pid: next,
                entry: pcb.entry,
                suspend: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::defs::PROGRAM_DIRECTORY_INDEX,
        scheduler::context::{Resumption, SavedContext, UserEntry},
        testing::{kernel, TestKernel, SHELL_ENTRY},
    };

    fn booted() -> TestKernel {
        let mut kernel = kernel();
        kernel.boot().unwrap();
        kernel
    }

    fn suspend(kernel: &mut TestKernel, pid: Pid, esp: u32) {
        let slot = kernel.context_slot(Some(pid));
        unsafe { *slot = SavedContext { esp, ebp: esp + 8 } };
    }

    #[test]
    fn round_trip_returns_status_to_parent() {
        let mut kernel = booted();
        let parent_mapping = kernel.hardware().directory[PROGRAM_DIRECTORY_INDEX];
        let parent_stack = kernel.process(0).unwrap().kernel_stack;

        kernel.execute(b"counter").unwrap();
        suspend(&mut kernel, 0, 0x7F_F000);

        let handoff = kernel.halt(7).unwrap();
        assert_eq!(
            handoff,
            Handoff::Resume {
                pid: 0,
                context: SavedContext {
                    esp: 0x7F_F000,
                    ebp: 0x7F_F008
                },
                status: 7,
            }
        );

        assert_eq!(kernel.hardware().directory[PROGRAM_DIRECTORY_INDEX], parent_mapping);
        assert_eq!(kernel.hardware().kernel_stack, Some(parent_stack));
        assert!(!kernel.process(0).unwrap().blocked);
        assert_eq!(kernel.snapshot().live, 1);
        assert_eq!(kernel.snapshot().current, Some(0));
    }

    #[test]
    fn blocked_parent_waits_for_child() {
        let mut kernel = booted();
        kernel.switch_terminal(1).unwrap();
        kernel.switch_terminal(0).unwrap();
        kernel.execute(b"counter").unwrap();
        assert_eq!(kernel.snapshot().current, Some(2));

        for _ in 0..6 {
            let switch = kernel.schedule().unwrap();
            assert_ne!(switch.to, 0);
        }

        assert_eq!(kernel.snapshot().current, Some(2));
        kernel.halt(7).unwrap();
        assert_eq!(kernel.snapshot().current, Some(0));

        let switch = kernel.schedule().unwrap();
        assert_eq!((switch.from, switch.to), (0, 1));
        let switch = kernel.schedule().unwrap();
        assert_eq!((switch.from, switch.to), (1, 0));
    }

    #[test]
    fn root_shell_is_relaunched() {
        let mut kernel = booted();

        let handoff = kernel.halt(0).unwrap();
        assert_eq!(
            handoff,
            Handoff::Enter {
                pid: 0,
                entry: UserEntry::new(SHELL_ENTRY),
                suspend: None,
            }
        );
        assert_eq!(kernel.process(0).unwrap().terminal, 0);
        assert_eq!(kernel.process(0).unwrap().parent, None);
    }

    #[test]
    fn halt_heals_orphaned_terminals() {
        let mut kernel = booted();
        kernel.execute(b"counter").unwrap();
        kernel.active[2] = true;

        kernel.halt(1).unwrap();

        assert!(kernel.processes.has_terminal(2));
        let healed = kernel.processes.iter().find(|pcb| pcb.terminal == 2).unwrap();
        assert_eq!(healed.parent, None);
        assert!(!healed.started);
        let healed = healed.pid;

        assert_eq!(kernel.snapshot().current, Some(0));
        let switch = kernel.schedule().unwrap();
        assert_eq!(switch.to, healed);
        assert_eq!(switch.resume, Resumption::Enter(UserEntry::new(SHELL_ENTRY)));
    }

    #[test]
    fn halt_releases_descriptors_and_video() {
        let mut kernel = booted();
        kernel.execute(b"counter").unwrap();
        kernel.open(b"rtc").unwrap();
        kernel.open(b"frame0.txt").unwrap();
        kernel.vidmap(crate::testing::USER_BUFFER).unwrap();
        assert!(kernel.hardware().video_present());

        kernel.halt(0).unwrap();

        assert!(!kernel.hardware().video_present());
        assert_eq!(kernel.devices.rtc_closed, vec![1]);
    }

    #[test]
    fn fault_kills_only_faulting_process() {
        let mut kernel = booted();
        kernel.execute(b"counter").unwrap();

        let handoff = kernel.fault(Fault::PageFault).unwrap();
        assert!(matches!(
            handoff,
            Handoff::Resume {
                pid: 0,
                status: CRASH_STATUS,
                ..
            }
        ));
        assert_eq!(kernel.snapshot().live, 1);
        assert_eq!(Fault::PageFault.code(), 15);
    }

    #[test]
    fn orphans_continue_without_relaunch() {
        let mut kernel = booted();
        kernel.switch_terminal(1).unwrap();
        // Shell 0 launches a program on the displayed terminal, then halts itself
        kernel.execute(b"counter").unwrap();
        kernel.schedule().unwrap();
        assert_eq!(kernel.snapshot().current, Some(0));
        kernel.halt(0).unwrap();
        assert_eq!(kernel.process(2).unwrap().parent, None);

        // Shell 0 came back as a fresh root; the orphan halting must not spawn another shell
        let live = kernel.snapshot().live;
        while kernel.snapshot().current != Some(2) {
            kernel.schedule().unwrap();
        }
        kernel.halt(0).unwrap();
        assert_eq!(kernel.snapshot().live, live - 1);
        assert!(kernel.processes.iter().all(|pcb| pcb.parent.is_none()));
    }

    #[test]
    fn halt_without_process_fails() {
        let mut kernel = kernel();
        assert_eq!(kernel.halt(0), Err(ProcessError::NoCurrentProcess));
    }
}
