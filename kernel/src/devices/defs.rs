/// Serial
pub const COM1: u16 = 0x3F8;
pub const UART_DATA: u16 = 0;
pub const UART_INTERRUPT_ENABLE: u16 = 1;
pub const UART_FIFO_CONTROL: u16 = 2;
pub const UART_LINE_CONTROL: u16 = 3;
pub const UART_MODEM_CONTROL: u16 = 4;
pub const UART_LINE_STATUS: u16 = 5;
pub const UART_DIVISOR_LATCH: u8 = 0x80;
pub const UART_8N1: u8 = 0x03;
pub const UART_DATA_READY: u8 = 0x01;
pub const UART_TRANSMIT_EMPTY: u8 = 0x20;
pub const UART_BAUD_DIVISOR: u16 = (115_200u32 / 38_400) as u16; // 38400 baud
pub const UART_SEND_RETRIES: usize = 128;

/// VGA Text Mode
pub const SCREEN_WIDTH: usize = 80;
pub const SCREEN_HEIGHT: usize = 25;
pub const SCREEN_CELLS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;
pub const TEXT_ATTRIBUTE: u16 = 0x07;
pub const BLANK_CELL: u16 = (TEXT_ATTRIBUTE << 8) | b' ' as u16;

/// Line Discipline
pub const LINE_BUFFER_SIZE: usize = 128;
pub const BACKSPACE: u8 = 0x08;
pub const DELETE: u8 = 0x7F;

/// Real Time Clock
pub const RTC_BASE_FREQUENCY: u32 = 1024;
pub const RTC_DEFAULT_FREQUENCY: u32 = 2;
pub const RTC_MIN_FREQUENCY: u32 = 2;
pub const CMOS_ADDRESS: u16 = 0x70;
pub const CMOS_DATA: u16 = 0x71;
pub const RTC_REGISTER_A: u8 = 0x8A; // NMI disabled
pub const RTC_REGISTER_B: u8 = 0x8B;
pub const RTC_REGISTER_C: u8 = 0x8C;
pub const RTC_RATE_1024HZ: u8 = 0x06;
pub const RTC_PERIODIC_INTERRUPT: u8 = 0x40;

/// Programmable Interval Timer
pub const PIT_FREQUENCY: u32 = 1_193_182;
pub const PIT_COMMAND: u16 = 0x43;
pub const PIT_CHANNEL_0: u16 = 0x40;
pub const PIT_SQUARE_WAVE: u8 = 0x36; // Channel 0, lobyte/hibyte, mode 3
pub const SCHEDULER_HZ: u32 = 50;
