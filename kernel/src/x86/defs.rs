use bitflags::bitflags;

// ***************** Security *****************

/// Protection Ring
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrivilegeLevel {
    Ring0 = 0, // Kernel Level
    Ring3 = 3, // User Level
}

// *************** Segmentation ***************

/// GDT slots installed by the boot code
pub const KERNEL_CODE_SEGMENT: u16 = 2;
pub const KERNEL_DATA_SEGMENT: u16 = 3;
pub const USER_CODE_SEGMENT: u16 = 4;
pub const USER_DATA_SEGMENT: u16 = 5;

pub const fn selector(index: u16, privilege: PrivilegeLevel) -> u16 {
    (index << 3) | privilege as u16
}

pub const KERNEL_DS: u16 = selector(KERNEL_DATA_SEGMENT, PrivilegeLevel::Ring0);
pub const USER_CS: u16 = selector(USER_CODE_SEGMENT, PrivilegeLevel::Ring3);
pub const USER_DS: u16 = selector(USER_DATA_SEGMENT, PrivilegeLevel::Ring3);

bitflags! {
    pub struct EFlags: u32 {
        const CARRY             = 1 << 0;
        const ZERO              = 1 << 6;
        const INTERRUPT_ENABLE  = 1 << 9;
        const DIRECTION         = 1 << 10;
    }
}

// *************** Task State ***************

#[repr(C)]
#[derive(Default, Clone, Copy, Debug)]
pub struct TaskStateSegment {
    // Segment Selectors and Previous Task Link Field
    link: u32,
    pub esp0: u32,
    pub ss0: u16,
    reserved_0: u16,
    esp1: u32,
    ss1: u16,
    reserved_1: u16,
    esp2: u32,
    ss2: u16,
    reserved_2: u16,

    // Registers
    cr3: u32,
    eip: u32,
    eflags: u32,
    eax: u32,
    ecx: u32,
    edx: u32,
    ebx: u32,
    esp: u32,
    ebp: u32,
    esi: u32,
    edi: u32,

    // Selectors
    pub es: u16,
    reserved_5: u16,
    pub cs: u16,
    reserved_6: u16,
    pub ss: u16,
    reserved_7: u16,
    pub ds: u16,
    reserved_8: u16,
    pub fs: u16,
    reserved_9: u16,
    pub gs: u16,
    reserved_10: u16,
    ldtr: u16,
    reserved_11: u16,
    reserved_12: u16,

    // I/O Mapping
    pub iopb: u16,
}

impl TaskStateSegment {
    pub const fn new() -> Self {
        TaskStateSegment {
            link: 0,
            esp0: 0,
            ss0: KERNEL_DS,
            reserved_0: 0,
            esp1: 0,
            ss1: 0,
            reserved_1: 0,
            esp2: 0,
            ss2: 0,
            reserved_2: 0,
            cr3: 0,
            eip: 0,
            eflags: 0,
            eax: 0,
            ecx: 0,
            edx: 0,
            ebx: 0,
            esp: 0,
            ebp: 0,
            esi: 0,
            edi: 0,
            es: 0,
            reserved_5: 0,
            cs: 0,
            reserved_6: 0,
            ss: 0,
            reserved_7: 0,
            ds: 0,
            reserved_8: 0,
            fs: 0,
            reserved_9: 0,
            gs: 0,
            reserved_10: 0,
            ldtr: 0,
            reserved_11: 0,
            reserved_12: 0,
            iopb: 0xFFFF,
        }
    }
}
