pub type Pid = usize;
pub type TerminalId = usize;

/// Capacities
pub const MAX_PROCESSES: usize = 6;
pub const MAX_OPEN_FILES: usize = 8;
pub const NUM_TERMINALS: usize = 3;
pub const COMMAND_LENGTH: usize = 128;

/// Descriptors bound at launch
pub const STDIN: usize = 0;
pub const STDOUT: usize = 1;
pub const FIRST_USER_FD: usize = 2;

/// Executables
pub const SHELL: &[u8] = b"shell";
pub const EXECUTABLE_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
pub const ENTRY_POINT_OFFSET: u32 = 24;

/// Exit status reported to the parent of a process killed by a fault
pub const CRASH_STATUS: u32 = 256;
