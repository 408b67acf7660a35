use crate::{filesystem::fops::FileTable, interrupts::defs::Fault, memory::vm::KernelStack};

use super::{
    context::{SavedContext, UserEntry},
    defs::*,
    error::ProcessError,
};

/// Fixed-capacity byte string holding a program name or its arguments
#[derive(Clone, Copy)]
pub struct CommandBuffer {
    bytes: [u8; COMMAND_LENGTH],
    length: usize,
}

impl CommandBuffer {
    pub const fn empty() -> Self {
        CommandBuffer {
            bytes: [0; COMMAND_LENGTH],
            length: 0,
        }
    }

    /// Appends as much of `bytes` as fits
    pub fn push(&mut self, bytes: &[u8]) {
        let count = bytes.len().min(COMMAND_LENGTH - self.length);
        self.bytes[self.length..self.length + count].copy_from_slice(&bytes[..count]);
        self.length += count;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl From<&[u8]> for CommandBuffer {
    fn from(bytes: &[u8]) -> Self {
        let mut buffer = CommandBuffer::empty();
        buffer.push(bytes);
        buffer
    }
}

impl core::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for &byte in self.as_bytes() {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

/// Process control block
#[derive(Debug)]
pub struct Pcb {
    pub pid: Pid,
    // None marks the root process of a terminal
    pub parent: Option<Pid>,
    pub terminal: TerminalId,
    pub context: SavedContext,
    pub kernel_stack: KernelStack,
    pub entry: UserEntry,
    // Set once the process got the CPU for the first time
    pub started: bool,
    // Waiting for a child on the same terminal
    pub blocked: bool,
    pub video_mapped: bool,
    pub command: CommandBuffer,
    pub arguments: CommandBuffer,
    pub fault: Option<Fault>,
    pub files: FileTable,
}

impl Pcb {
    pub fn new(
        pid: Pid,
        parent: Option<Pid>,
        terminal: TerminalId,
        entry: UserEntry,
        command: CommandBuffer,
        arguments: CommandBuffer,
    ) -> Self {
        Pcb {
            pid,
            parent,
            terminal,
            context: SavedContext::default(),
            kernel_stack: KernelStack::for_slot(pid),
            entry,
            started: false,
            blocked: false,
            video_mapped: false,
            command,
            arguments,
            fault: None,
            files: FileTable::new(),
        }
    }

    pub fn is_runnable(&self) -> bool {
        !self.blocked
    }
}

#[derive(Debug)]
pub enum Slot {
    Empty,
    Occupied(Pcb),
}

pub struct ProcessTable {
    slots: [Slot; MAX_PROCESSES],
}

impl ProcessTable {
    pub const fn new() -> Self {
        const EMPTY: Slot = Slot::Empty;
        ProcessTable {
            slots: [EMPTY; MAX_PROCESSES],
        }
    }

    pub fn get(&self, pid: Pid) -> Option<&Pcb> {
        match self.slots.get(pid) {
            Some(Slot::Occupied(pcb)) => Some(pcb),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Pcb> {
        match self.slots.get_mut(pid) {
            Some(Slot::Occupied(pcb)) => Some(pcb),
            _ => None,
        }
    }

    /// Fills the first empty slot with the PCB built for its pid
    pub fn allocate<B>(&mut self, build: B) -> Result<Pid, ProcessError>
    where
        B: FnOnce(Pid) -> Pcb,
    {
        let pid = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Slot::Empty))
            .ok_or(ProcessError::SlotAllocationFailure)?;

        self.slots[pid] = Slot::Occupied(build(pid));
        Ok(pid)
    }

    pub fn release(&mut self, pid: Pid) -> Option<Pcb> {
        match core::mem::replace(self.slots.get_mut(pid)?, Slot::Empty) {
            Slot::Occupied(pcb) => Some(pcb),
            Slot::Empty => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(pcb) => Some(pcb),
            Slot::Empty => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pcb> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied(pcb) => Some(pcb),
            Slot::Empty => None,
        })
    }

    pub fn live(&self) -> usize {
        self.iter().count()
    }

    pub fn has_terminal(&self, terminal: TerminalId) -> bool {
        self.iter().any(|pcb| pcb.terminal == terminal)
    }

    /// Circular scan after `current` for a runnable process. Falls back to `current` itself.
    pub fn next_runnable(&self, current: Pid) -> Pid {
        (1..=MAX_PROCESSES)
            .map(|offset| (current + offset) % MAX_PROCESSES)
            .find(|&pid| self.get(pid).map_or(false, Pcb::is_runnable))
            .unwrap_or(current)
    }
}
