use crate::{
    devices::Devices,
    filesystem::{error::FsError, FileSystem, FileType},
    memory::{
        defs::{LARGE_PAGE_SIZE, PROGRAM_IMAGE_OFFSET},
        vm::{self, Hardware},
    },
    sync::cpu_cli::CliGuard,
};

#[cfg(feature = "trace-scheduler")]
use crate::println;

use super::{
    context::{Handoff, UserEntry},
    defs::*,
    error::{ExecutableError, ProcessError},
    process::{CommandBuffer, Pcb},
    scheduler::Scheduler,
};

const HEADER_SIZE: usize = ENTRY_POINT_OFFSET as usize + 4;
const IMAGE_CAPACITY: usize = LARGE_PAGE_SIZE - PROGRAM_IMAGE_OFFSET;

/// The part of the executable header the loader cares about
#[derive(Debug, Clone, Copy)]
struct ExecutableHeader {
    entry: u32,
}

impl ExecutableHeader {
    fn read<F: FileSystem>(fs: &F, inode: u32) -> Result<Self, ProcessError> {
        let mut raw = [0u8; HEADER_SIZE];
        let read = fs
            .read(inode, 0, &mut raw)
            .map_err(ProcessError::LoadFailure)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&raw[..4]);
        if read < magic.len() || magic != EXECUTABLE_MAGIC {
            return Err(ExecutableError::InvalidMagic(magic).into());
        }

        if read < HEADER_SIZE {
            return Err(ExecutableError::MissingEntryPoint.into());
        }

        let mut entry = [0u8; 4];
        entry.copy_from_slice(&raw[ENTRY_POINT_OFFSET as usize..HEADER_SIZE]);
        Ok(ExecutableHeader {
            entry: u32::from_le_bytes(entry),
        })
    }
}

/// Command line split into the program name and its argument string
#[derive(Debug, Clone, Copy)]
pub struct ParsedCommand {
    pub name: CommandBuffer,
    pub arguments: CommandBuffer,
}

impl ParsedCommand {
    pub fn shell() -> Self {
        ParsedCommand {
            name: CommandBuffer::from(SHELL),
            arguments: CommandBuffer::empty(),
        }
    }
}

/// Splits a command line. The line ends at the first NUL or newline; the name is the first
/// space-delimited word and the remaining words, single-space separated, are the arguments.
pub fn parse_command(line: &[u8]) -> Result<ParsedCommand, ProcessError> {
    let end = line
        .iter()
        .position(|&byte| byte == 0 || byte == b'\n')
        .unwrap_or(line.len());
    let mut words = line[..end]
        .split(|&byte| byte == b' ')
        .filter(|word| !word.is_empty());

    let name = words.next().ok_or(ProcessError::EmptyCommand)?;
    let mut arguments = CommandBuffer::empty();
    for word in words {
        if !arguments.is_empty() {
            arguments.push(b" ");
        }
        arguments.push(word);
    }

    Ok(ParsedCommand {
        name: CommandBuffer::from(name),
        arguments,
    })
}

/// Who a new process belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Child of the caller on the displayed terminal
    Child(Option<Pid>),
    /// Root process of the given terminal
    Root(TerminalId),
}

impl<F: FileSystem, D: Devices, H: Hardware> Scheduler<F, D, H> {
    /// Launches `command` as a child of the current process and hands it the CPU. A caller on
    /// the same terminal is blocked until the child halts.
    pub fn execute(&mut self, command: &[u8]) -> Result<Handoff, ProcessError> {
        let _cli = CliGuard::new();

        let parsed = parse_command(command)?;
        let caller = self.current;
        let pid = self.launch(&parsed, Placement::Child(caller))?;

        let terminal = self.processes.get(pid).map(|pcb| pcb.terminal);
        if let Some(caller) = caller.and_then(|caller| self.processes.get_mut(caller)) {
            if Some(caller.terminal) == terminal {
                caller.blocked = true;
            }
        }

        Ok(self.enter(pid, caller))
    }

    /// `execute` with the command line read from user memory
    pub fn execute_user(&mut self, address: u32) -> Result<Handoff, ProcessError> {
        let mut line = [0u8; COMMAND_LENGTH];
        let command = vm::user_string(self.hardware.program_window(), address, &mut line)?;
        self.execute(command)
    }

    /// Creates a root shell for `terminal` that first runs when the scheduler picks it
    pub(super) fn spawn(&mut self, terminal: TerminalId) -> Result<Pid, ProcessError> {
        let pid = self.launch(&ParsedCommand::shell(), Placement::Root(terminal))?;
        self.restore_mapping();
        Ok(pid)
    }

    fn orphaned_terminal(&self) -> Option<TerminalId> {
        (0..NUM_TERMINALS).find(|&terminal| {
            self.active[terminal] && !self.processes.has_terminal(terminal)
        })
    }

    /// Program window back on the current process after loading someone else's image
    pub(super) fn restore_mapping(&mut self) {
        if let Some(pid) = self.current {
            vm::map_process(&mut self.hardware, pid);
        }
    }

    /// Validates the executable, fills a slot and copies the image into the slot's frame.
    /// On failure no slot is taken and the program window is back on the current process.
    pub(super) fn launch(
        &mut self,
        command: &ParsedCommand,
        placement: Placement,
    ) -> Result<Pid, ProcessError> {
        let name = command.name.as_bytes();
        let dentry = self
            .fs
            .resolve(name)
            .map_err(|_| ProcessError::FileNotFound)?;
        // Device and directory entries share inode 0 with the first regular file
        if FileType::from_raw(dentry.file_type) != Some(FileType::Regular) {
            return Err(ExecutableError::NotRegularFile(dentry.file_type).into());
        }
        let header = ExecutableHeader::read(&self.fs, dentry.inode)?;
        if dentry.size as usize > IMAGE_CAPACITY {
            return Err(ExecutableError::ImageOverflow(dentry.size, IMAGE_CAPACITY as u32).into());
        }

        let (parent, terminal) = match placement {
            Placement::Root(terminal) => (None, terminal),
            Placement::Child(caller) => match self.orphaned_terminal() {
                Some(terminal) if name == SHELL => (None, terminal),
                _ => (caller, self.displayed),
            },
        };

        let pid = self.processes.allocate(|pid| {
            Pcb::new(
                pid,
                parent,
                terminal,
                UserEntry::new(header.entry),
                command.name,
                command.arguments,
            )
        })?;

        vm::map_process(&mut self.hardware, pid);
        if let Err(error) = self.load_image(dentry.inode, dentry.size) {
            self.processes.release(pid);
            self.restore_mapping();
            return Err(error);
        }

        #[cfg(feature = "trace-scheduler")]
        println!(
            "[SCHED] Launched {:?} as process {} on terminal {}",
            command.name, pid, terminal
        );

        Ok(pid)
    }

    fn load_image(&mut self, inode: u32, size: u32) -> Result<(), ProcessError> {
        let window = self.hardware.program_window();
        let available = window.len().saturating_sub(PROGRAM_IMAGE_OFFSET) as u32;
        let image = window
            .get_mut(PROGRAM_IMAGE_OFFSET..PROGRAM_IMAGE_OFFSET + size as usize)
            .ok_or(ExecutableError::ImageOverflow(size, available))?;

        let read = self
            .fs
            .read(inode, 0, image)
            .map_err(ProcessError::LoadFailure)?;
        if read != size as usize {
            return Err(ProcessError::LoadFailure(FsError::CorruptedImage));
        }

        Ok(())
    }
}
