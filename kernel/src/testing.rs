/// Fakes for the hardware seams, shared by the unit tests
use std::collections::VecDeque;

use volatile::Volatile;

use crate::{
    devices::{
        defs::{BLANK_CELL, SCREEN_CELLS},
        error::DeviceError,
        Devices, ScreenMemory,
    },
    filesystem::{
        defs::{BLOCK_SIZE, BOOT_HEADER_SIZE, DIRECTORY_ENTRY_SIZE, FILE_TYPE_OFFSET, INODE_OFFSET},
        fs::ReadOnlyFs,
        FileType,
    },
    memory::{
        defs::*,
        vm::{user_range, KernelStack, PageTables, TaskState},
    },
    scheduler::{
        context::{ContextSwitch, SavedContext, UserEntry},
        defs::{Pid, TerminalId, EXECUTABLE_MAGIC, MAX_PROCESSES, NUM_TERMINALS},
        scheduler::Scheduler,
    },
};

pub type TestKernel = Scheduler<ReadOnlyFs<'static>, FakeDevices, FakeHardware>;

pub const SHELL_ENTRY: u32 = 0x0804_8094;
pub const COUNTER_ENTRY: u32 = 0x0804_8120;
pub const USER_BUFFER: u32 = PROGRAM_IMAGE + 0x8000;

/// Memory kept per slot: enough for the images and user buffers the tests touch
const FAKE_WINDOW_SIZE: usize = PROGRAM_IMAGE_OFFSET + 0x10000;

pub struct FakeHardware {
    pub directory: [PageEntry; NUMBER_PAGE_ENTRIES],
    pub video_entry: PageEntry,
    pub flushes: usize,
    pub kernel_stack: Option<KernelStack>,
    frames: Vec<Vec<u8>>,
}

impl FakeHardware {
    pub fn new() -> Self {
        FakeHardware {
            directory: [PageEntry::NOT_PRESENT; NUMBER_PAGE_ENTRIES],
            video_entry: PageEntry::NOT_PRESENT,
            flushes: 0,
            kernel_stack: None,
            frames: vec![vec![0; FAKE_WINDOW_SIZE]; MAX_PROCESSES],
        }
    }

    fn mapped_slot(&self) -> usize {
        let entry = self.directory[PROGRAM_DIRECTORY_INDEX];
        assert!(entry.is_present(), "program window is not mapped");
        (entry.address() - PROGRAM_FRAME_BASE) as usize / LARGE_PAGE_SIZE
    }

    pub fn frame(&self, pid: Pid) -> &[u8] {
        &self.frames[pid]
    }

    pub fn video_present(&self) -> bool {
        self.directory[VIDEO_DIRECTORY_INDEX].is_present()
    }

    pub fn write_user(&mut self, address: u32, bytes: &[u8]) {
        let range = user_range(address, bytes.len() as u32).unwrap();
        let slot = self.mapped_slot();
        self.frames[slot][range].copy_from_slice(bytes);
    }

    pub fn read_user(&self, address: u32, length: u32) -> Vec<u8> {
        let range = user_range(address, length).unwrap();
        self.frames[self.mapped_slot()][range].to_vec()
    }
}

impl PageTables for FakeHardware {
    fn set_directory_entry(&mut self, index: usize, entry: PageEntry) {
        self.directory[index] = entry;
    }

    fn set_video_entry(&mut self, entry: PageEntry) {
        self.video_entry = entry;
    }

    fn video_table(&self) -> u32 {
        0x0010_0000
    }

    fn flush_tlb(&mut self) {
        self.flushes += 1;
    }

    fn program_window(&mut self) -> &mut [u8] {
        let slot = self.mapped_slot();
        &mut self.frames[slot]
    }
}

impl TaskState for FakeHardware {
    fn set_kernel_stack(&mut self, stack: KernelStack) {
        self.kernel_stack = Some(stack);
    }
}

/// Scripted drivers recording every call
#[derive(Default)]
pub struct FakeDevices {
    pub output: [Vec<u8>; NUM_TERMINALS],
    pub input: [VecDeque<Vec<u8>>; NUM_TERMINALS],
    pub switches: Vec<(TerminalId, TerminalId)>,
    pub rtc_opened: Vec<Pid>,
    pub rtc_closed: Vec<Pid>,
    pub rtc_rates: Vec<(Pid, u32)>,
    pub rtc_close_error: Option<DeviceError>,
}

impl Devices for FakeDevices {
    fn terminal_read(&mut self, terminal: TerminalId, buffer: &mut [u8]) -> Result<usize, DeviceError> {
        let line = self.input[terminal]
            .pop_front()
            .ok_or(DeviceError::WouldBlock)?;
        let length = line.len().min(buffer.len());
        buffer[..length].copy_from_slice(&line[..length]);
        Ok(length)
    }

    fn terminal_write(&mut self, terminal: TerminalId, buffer: &[u8]) -> Result<usize, DeviceError> {
        self.output[terminal].extend_from_slice(buffer);
        Ok(buffer.len())
    }

    fn rtc_open(&mut self, pid: Pid) -> Result<(), DeviceError> {
        self.rtc_opened.push(pid);
        Ok(())
    }

    fn rtc_read(&mut self, _pid: Pid) -> Result<usize, DeviceError> {
        Ok(0)
    }

    fn rtc_write(&mut self, pid: Pid, buffer: &[u8]) -> Result<usize, DeviceError> {
        let raw: [u8; 4] = buffer
            .try_into()
            .map_err(|_| DeviceError::InvalidLength(buffer.len()))?;
        self.rtc_rates.push((pid, u32::from_le_bytes(raw)));
        Ok(4)
    }

    fn rtc_close(&mut self, pid: Pid) -> Result<(), DeviceError> {
        self.rtc_closed.push(pid);
        match self.rtc_close_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn switch_screen(&mut self, from: TerminalId, to: TerminalId) {
        self.switches.push((from, to));
    }
}

/// Text pages held in ordinary memory
pub struct VecScreens {
    live: Vec<Volatile<u16>>,
    scratch: Vec<Vec<Volatile<u16>>>,
}

impl VecScreens {
    pub fn new() -> Self {
        VecScreens {
            live: vec![Volatile::new(BLANK_CELL); SCREEN_CELLS],
            scratch: vec![vec![Volatile::new(BLANK_CELL); SCREEN_CELLS]; NUM_TERMINALS],
        }
    }
}

impl ScreenMemory for VecScreens {
    fn page(&mut self, page: VideoPage) -> &mut [Volatile<u16>] {
        match page {
            VideoPage::Live => &mut self.live,
            VideoPage::Scratch(terminal) => &mut self.scratch[terminal],
        }
    }
}

/// Context primitive that only records what it was asked to do
#[derive(Default)]
pub struct FakeContext<'a> {
    pub entered: Vec<UserEntry>,
    pub switched: Vec<SavedContext>,
    pub resumed: Vec<(SavedContext, u32)>,
    pub waits: usize,
    // Status the entered process "returns" with
    pub exit_status: u32,
    pub on_wait: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> ContextSwitch for FakeContext<'a> {
    unsafe fn enter_user(&mut self, save: *mut SavedContext, entry: UserEntry) -> u32 {
        if !save.is_null() {
            *save = SavedContext {
                esp: 0x7F_0000 + self.entered.len() as u32,
                ebp: 0x7F_1000,
            };
        }
        self.entered.push(entry);
        self.exit_status
    }

    unsafe fn switch(&mut self, save: *mut SavedContext, next: SavedContext) {
        *save = SavedContext {
            esp: 0x7E_0000 + self.switched.len() as u32,
            ebp: 0x7E_1000,
        };
        self.switched.push(next);
    }

    unsafe fn resume(&mut self, next: SavedContext, status: u32) {
        self.resumed.push((next, status));
    }

    fn wait_for_interrupt(&mut self) {
        self.waits += 1;
        if let Some(on_wait) = self.on_wait.as_mut() {
            on_wait();
        }
    }
}

/// Builds filesystem images in the boot module format
#[derive(Default)]
pub struct ImageBuilder {
    entries: Vec<(String, u32, Vec<u8>)>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder::default()
    }

    pub fn entry(mut self, name: &str, file_type: u32, data: &[u8]) -> Self {
        self.entries.push((name.to_string(), file_type, data.to_vec()));
        self
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, FileType::Regular as u32, data)
    }

    pub fn directory(self, name: &str) -> Self {
        self.entry(name, FileType::Directory as u32, &[])
    }

    pub fn rtc(self, name: &str) -> Self {
        self.entry(name, FileType::Rtc as u32, &[])
    }

    /// Same layout as `mkfs`: only regular files own an inode, every other entry points at
    /// inode 0
    pub fn build(&self) -> Vec<u8> {
        let is_regular = |file_type: u32| file_type == FileType::Regular as u32;
        let inode_count = self
            .entries
            .iter()
            .filter(|(_, file_type, _)| is_regular(*file_type))
            .count();
        let data_count: usize = self
            .entries
            .iter()
            .filter(|(_, file_type, _)| is_regular(*file_type))
            .map(|(_, _, data)| (data.len() + BLOCK_SIZE - 1) / BLOCK_SIZE)
            .sum();
        let mut image = vec![0u8; (1 + inode_count + data_count) * BLOCK_SIZE];
        let put = |image: &mut Vec<u8>, offset: usize, value: u32| {
            image[offset..offset + 4].copy_from_slice(&value.to_le_bytes())
        };

        put(&mut image, 0, self.entries.len() as u32);
        put(&mut image, 4, inode_count as u32);
        put(&mut image, 8, data_count as u32);

        let mut next_inode = 0;
        let mut next_block = 0;
        for (index, (name, file_type, data)) in self.entries.iter().enumerate() {
            let dentry = BOOT_HEADER_SIZE + index * DIRECTORY_ENTRY_SIZE;
            image[dentry..dentry + name.len()].copy_from_slice(name.as_bytes());
            put(&mut image, dentry + FILE_TYPE_OFFSET, *file_type);
            if !is_regular(*file_type) {
                continue;
            }

            put(&mut image, dentry + INODE_OFFSET, next_inode as u32);
            let inode_base = (1 + next_inode) * BLOCK_SIZE;
            put(&mut image, inode_base, data.len() as u32);
            for (position, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
                put(&mut image, inode_base + 4 + position * 4, next_block as u32);
                let start = (1 + inode_count + next_block) * BLOCK_SIZE;
                image[start..start + chunk.len()].copy_from_slice(chunk);
                next_block += 1;
            }
            next_inode += 1;
        }

        image
    }
}

/// Flat executable with the entry point in its header
pub fn executable(entry: u32, body: usize) -> Vec<u8> {
    let mut image = vec![0u8; 28 + body];
    image[..4].copy_from_slice(&EXECUTABLE_MAGIC);
    image[24..28].copy_from_slice(&entry.to_le_bytes());
    for (index, byte) in image[28..].iter_mut().enumerate() {
        *byte = index as u8;
    }
    image
}

pub fn kernel() -> TestKernel {
    let image = ImageBuilder::new()
        .directory(".")
        .file("shell", &executable(SHELL_ENTRY, 300))
        .file("counter", &executable(COUNTER_ENTRY, 5000))
        .file("frame0.txt", b"fish")
        .rtc("rtc")
        .entry("weird", 7, b"?")
        .build();
    let image: &'static [u8] = Box::leak(image.into_boxed_slice());

    Scheduler::new(
        ReadOnlyFs::mount(image).unwrap(),
        FakeDevices::default(),
        FakeHardware::new(),
    )
}
