pub mod console;
pub mod debug;
pub mod defs;
pub mod error;
pub mod rtc;
pub mod terminal;
#[cfg(target_arch = "x86")]
pub mod uart;

use volatile::Volatile;

use crate::{
    memory::defs::VideoPage,
    scheduler::defs::{Pid, TerminalId, NUM_TERMINALS},
};

use self::{defs::*, error::DeviceError, rtc::VirtualRtc, terminal::Terminal};

/// Drivers reachable from the descriptor layer. Reads that have nothing to deliver yet report
/// `DeviceError::WouldBlock` instead of spinning.
pub trait Devices {
    fn terminal_read(&mut self, terminal: TerminalId, buffer: &mut [u8]) -> Result<usize, DeviceError>;
    fn terminal_write(&mut self, terminal: TerminalId, buffer: &[u8]) -> Result<usize, DeviceError>;

    fn rtc_open(&mut self, pid: Pid) -> Result<(), DeviceError>;
    fn rtc_read(&mut self, pid: Pid) -> Result<usize, DeviceError>;
    fn rtc_write(&mut self, pid: Pid, buffer: &[u8]) -> Result<usize, DeviceError>;
    fn rtc_close(&mut self, pid: Pid) -> Result<(), DeviceError>;

    /// Moves the live screen contents of `from` off screen and brings `to` on screen
    fn switch_screen(&mut self, from: TerminalId, to: TerminalId);
}

/// Text pages backing the terminals: the live buffer and one scratch page per terminal
pub trait ScreenMemory {
    fn page(&mut self, page: VideoPage) -> &mut [Volatile<u16>];

    fn copy_page(&mut self, from: VideoPage, to: VideoPage) {
        for index in 0..SCREEN_CELLS {
            let value = self.page(from)[index].read();
            self.page(to)[index].write(value);
        }
    }
}

/// Terminals and the virtual clock over a set of text pages
pub struct DeviceSet<S: ScreenMemory> {
    screens: S,
    terminals: [Terminal; NUM_TERMINALS],
    displayed: TerminalId,
    rtc: VirtualRtc,
}

impl<S: ScreenMemory> DeviceSet<S> {
    pub const fn new(screens: S) -> Self {
        DeviceSet {
            screens,
            terminals: [Terminal::new(), Terminal::new(), Terminal::new()],
            displayed: 0,
            rtc: VirtualRtc::new(),
        }
    }

    /// Blanks every page. Called once the text buffers are reachable.
    pub fn init(&mut self) {
        for terminal in 0..NUM_TERMINALS {
            let page = self.page_of(terminal);
            self.terminals[terminal].clear(self.screens.page(page));
            self.terminals[terminal].clear(self.screens.page(VideoPage::Scratch(terminal)));
        }
    }

    fn page_of(&self, terminal: TerminalId) -> VideoPage {
        if terminal == self.displayed {
            VideoPage::Live
        } else {
            VideoPage::Scratch(terminal)
        }
    }

    pub fn displayed(&self) -> TerminalId {
        self.displayed
    }

    /// Keyboard byte for the terminal on screen
    pub fn push_input(&mut self, byte: u8) {
        let terminal = self.displayed;
        self.terminals[terminal].push_input(self.screens.page(VideoPage::Live), byte);
    }

    pub fn rtc_tick(&mut self) {
        self.rtc.tick();
    }

    pub fn screens(&mut self) -> &mut S {
        &mut self.screens
    }
}

impl<S: ScreenMemory> Devices for DeviceSet<S> {
    fn terminal_read(&mut self, terminal: TerminalId, buffer: &mut [u8]) -> Result<usize, DeviceError> {
        self.terminals
            .get_mut(terminal)
            .ok_or(DeviceError::InvalidTerminal(terminal))?
            .take_line(buffer)
            .ok_or(DeviceError::WouldBlock)
    }

    fn terminal_write(&mut self, terminal: TerminalId, buffer: &[u8]) -> Result<usize, DeviceError> {
        if terminal >= NUM_TERMINALS {
            return Err(DeviceError::InvalidTerminal(terminal));
        }

        #[cfg(feature = "serial-terminal")]
        debug::mirror(buffer);

        let page = self.page_of(terminal);
        Ok(self.terminals[terminal].write(self.screens.page(page), buffer))
    }

    fn rtc_open(&mut self, pid: Pid) -> Result<(), DeviceError> {
        self.rtc.open(pid)
    }

    fn rtc_read(&mut self, pid: Pid) -> Result<usize, DeviceError> {
        self.rtc.read(pid)
    }

    fn rtc_write(&mut self, pid: Pid, buffer: &[u8]) -> Result<usize, DeviceError> {
        self.rtc.write(pid, buffer)
    }

    fn rtc_close(&mut self, pid: Pid) -> Result<(), DeviceError> {
        self.rtc.close(pid)
    }

    fn switch_screen(&mut self, from: TerminalId, to: TerminalId) {
        self.screens.copy_page(VideoPage::Live, VideoPage::Scratch(from));
        self.screens.copy_page(VideoPage::Scratch(to), VideoPage::Live);
        self.displayed = to;
    }
}
