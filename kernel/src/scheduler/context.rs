/// Saved kernel contexts and the primitive that moves the CPU between them. The scheduler core
/// only decides *which* context runs next and hands back a description of it; switching stacks
/// and dropping to ring 3 happens behind `ContextSwitch`, the single place that touches stack
/// pointers.
use crate::memory::defs::USER_STACK_TOP;

use super::defs::Pid;

/// Kernel stack position of a suspended process. Only meaningful while the process is not
/// current.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedContext {
    pub esp: u32,
    pub ebp: u32,
}

/// Ring 3 entry of a freshly loaded image
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserEntry {
    pub eip: u32,
    pub esp: u32,
}

impl UserEntry {
    pub fn new(eip: u32) -> Self {
        UserEntry {
            eip,
            esp: USER_STACK_TOP,
        }
    }
}

/// How the next process gets the CPU
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resumption {
    /// Continue where the process was last suspended
    Context(SavedContext),
    /// First run: drop straight into user mode
    Enter(UserEntry),
}

/// Result of a lifecycle call that gives the CPU away
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    /// Enter a freshly loaded process. When `suspend` is set, that process's context is
    /// recorded first and its execute call later returns the child's exit status.
    Enter {
        pid: Pid,
        entry: UserEntry,
        suspend: Option<Pid>,
    },
    /// Resume a suspended process, `status` becoming the result of its pending call
    Resume {
        pid: Pid,
        context: SavedContext,
        status: u32,
    },
}

/// Timer-driven move from one runnable process to another
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Switch {
    pub from: Pid,
    pub to: Pid,
    pub resume: Resumption,
}

pub trait ContextSwitch {
    /// Records the running context into `save` (unless null) and enters user mode at `entry`.
    /// Returns once the recorded context is resumed, yielding the delivered status.
    unsafe fn enter_user(&mut self, save: *mut SavedContext, entry: UserEntry) -> u32;

    /// Records the running context into `save` and continues `next`. Returns once the recorded
    /// context is resumed.
    unsafe fn switch(&mut self, save: *mut SavedContext, next: SavedContext);

    /// Abandons the running context and continues `next`, which sees `status` as the result of
    /// its suspended call.
    unsafe fn resume(&mut self, next: SavedContext, status: u32);

    /// Lets pending interrupts run, used while a reader waits on a device
    fn wait_for_interrupt(&mut self);
}
