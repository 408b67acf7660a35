use crate::{devices::defs::*, sync::cpu_cli::CliGuard};

use super::helpers::{inb, outb};

/// Programs PIT channel 0 to fire `hz` times per second
pub fn init_pit(hz: u32) {
    let divisor = PIT_FREQUENCY / hz;

    outb(PIT_COMMAND, PIT_SQUARE_WAVE);
    outb(PIT_CHANNEL_0, (divisor & 0xFF) as u8);
    outb(PIT_CHANNEL_0, (divisor >> 8) as u8);
}

/// Turns on the periodic RTC interrupt at its base rate. Virtual clocks divide it down.
pub fn init_rtc() {
    let _cli = CliGuard::new();

    outb(CMOS_ADDRESS, RTC_REGISTER_B);
    let previous = inb(CMOS_DATA);
    outb(CMOS_ADDRESS, RTC_REGISTER_B);
    outb(CMOS_DATA, previous | RTC_PERIODIC_INTERRUPT);

    outb(CMOS_ADDRESS, RTC_REGISTER_A);
    let previous = inb(CMOS_DATA);
    outb(CMOS_ADDRESS, RTC_REGISTER_A);
    outb(CMOS_DATA, (previous & 0xF0) | RTC_RATE_1024HZ);
}

/// Register C has to be read or the RTC stops interrupting
pub fn rtc_acknowledge() {
    outb(CMOS_ADDRESS, RTC_REGISTER_C);
    inb(CMOS_DATA);
}
