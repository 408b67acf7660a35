pub mod defs;
pub mod error;
pub mod vm;
