use core::fmt;

/// System Call Constants (system_calls.rs)

pub mod system_call {
    pub const VECTOR: u8 = 0x80;

    pub const HALT: u32 = 1;
    pub const EXECUTE: u32 = 2;
    pub const READ: u32 = 3;
    pub const WRITE: u32 = 4;
    pub const OPEN: u32 = 5;
    pub const CLOSE: u32 = 6;
    pub const GETARGS: u32 = 7;
    pub const VIDMAP: u32 = 8;

    /// Value handed back to user space on any failure
    pub const FAILURE: i32 = -1;
}

/// Processor exceptions, numbered by their vector.
/// Complete list can be found here: https://wiki.osdev.org/Exceptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    DivideByZero = 0,
    Debug = 1,
    NonMaskableInterrupt = 2,
    Breakpoint = 3,
    Overflow = 4,
    BoundRangeExceeded = 5,
    InvalidOpcode = 6,
    DeviceNotAvailable = 7,
    DoubleFault = 8,
    CoprocessorSegmentOverrun = 9,
    InvalidTss = 10,
    SegmentNotPresent = 11,
    StackSegmentFault = 12,
    GeneralProtectionFault = 13,
    PageFault = 14,
    X87FloatingPoint = 16,
    AlignmentCheck = 17,
    MachineCheck = 18,
    SimdFloatingPoint = 19,
    Virtualization = 20,
    // Any other vector below 32
    Reserved = 31,
}

impl Fault {
    pub fn from_vector(vector: u8) -> Fault {
        match vector {
            0 => Fault::DivideByZero,
            1 => Fault::Debug,
            2 => Fault::NonMaskableInterrupt,
            3 => Fault::Breakpoint,
            4 => Fault::Overflow,
            5 => Fault::BoundRangeExceeded,
            6 => Fault::InvalidOpcode,
            7 => Fault::DeviceNotAvailable,
            8 => Fault::DoubleFault,
            9 => Fault::CoprocessorSegmentOverrun,
            10 => Fault::InvalidTss,
            11 => Fault::SegmentNotPresent,
            12 => Fault::StackSegmentFault,
            13 => Fault::GeneralProtectionFault,
            14 => Fault::PageFault,
            16 => Fault::X87FloatingPoint,
            17 => Fault::AlignmentCheck,
            18 => Fault::MachineCheck,
            19 => Fault::SimdFloatingPoint,
            20 => Fault::Virtualization,
            _ => Fault::Reserved,
        }
    }

    /// Error code recorded for the process, never zero
    pub fn code(&self) -> u32 {
        *self as u32 + 1
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Fault::DivideByZero => "Divide By Zero",
            Fault::Debug => "Debug",
            Fault::NonMaskableInterrupt => "Non Maskable Interrupt",
            Fault::Breakpoint => "Breakpoint",
            Fault::Overflow => "Overflow",
            Fault::BoundRangeExceeded => "Bound Range Exceeded",
            Fault::InvalidOpcode => "Invalid Opcode",
            Fault::DeviceNotAvailable => "Device Not Available",
            Fault::DoubleFault => "Double Fault",
            Fault::CoprocessorSegmentOverrun => "Coprocessor Segment Overrun",
            Fault::InvalidTss => "Invalid TSS",
            Fault::SegmentNotPresent => "Segment Not Present",
            Fault::StackSegmentFault => "Stack Segment Fault",
            Fault::GeneralProtectionFault => "General Protection Fault",
            Fault::PageFault => "Page Fault",
            Fault::X87FloatingPoint => "x87 Floating Point",
            Fault::AlignmentCheck => "Alignment Check",
            Fault::MachineCheck => "Machine Check",
            Fault::SimdFloatingPoint => "SIMD Floating Point",
            Fault::Virtualization => "Virtualization",
            Fault::Reserved => "Reserved",
        };
        write!(f, "{}", name)
    }
}
