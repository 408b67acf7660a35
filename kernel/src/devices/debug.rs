use core::fmt;

/* ************ Macros ************ */

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::devices::debug::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

/// Attaches COM1 to the kernel log
#[cfg(target_arch = "x86")]
pub fn debug_init() -> Result<(), super::error::SerialError> {
    super::uart::COM1_PORT.init()?;
    super::console::CONSOLE.lock().attach();
    Ok(())
}

// Switches between printing methods
#[cfg(not(test))]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;

    let _ = super::console::CONSOLE.lock().write_fmt(args);
}

#[cfg(test)]
pub fn _print(args: fmt::Arguments) {
    std::print!("{}", args);
}

/// Copies terminal output to the debug console
#[cfg(feature = "serial-terminal")]
pub fn mirror(buffer: &[u8]) {
    for &byte in buffer {
        _print(format_args!("{}", byte as char));
    }
}
