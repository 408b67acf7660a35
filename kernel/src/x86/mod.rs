pub mod defs;

#[cfg(target_arch = "x86")]
pub mod context;
#[cfg(target_arch = "x86")]
pub mod helpers;
#[cfg(target_arch = "x86")]
pub mod paging;
#[cfg(target_arch = "x86")]
pub mod platform;
#[cfg(target_arch = "x86")]
pub mod timer;
