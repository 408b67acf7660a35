pub mod context;
pub mod defs;
pub mod error;
pub mod exec;
pub mod files;
pub mod halt;
pub mod process;
pub mod scheduler;
