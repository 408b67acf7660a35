pub mod defs;
pub mod irqs;
pub mod system_calls;
