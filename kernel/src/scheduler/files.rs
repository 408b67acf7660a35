use crate::{
    devices::Devices,
    filesystem::{
        defs::FILE_NAME_LENGTH,
        fops::{FileContext, FileDescriptor, FileOps},
        FileSystem,
    },
    memory::{
        defs::VIDEO_WINDOW,
        vm::{self, Hardware},
    },
    sync::cpu_cli::CliGuard,
};

use super::{
    defs::*,
    error::{FileError, ProcessError},
    process::ProcessTable,
    scheduler::Scheduler,
};

fn read_descriptor<F: FileSystem, D: Devices>(
    processes: &mut ProcessTable,
    fs: &F,
    devices: &mut D,
    current: Option<Pid>,
    fd: u32,
    buffer: &mut [u8],
) -> Result<usize, FileError> {
    let pid = current.ok_or(FileError::NoCurrentProcess)?;
    let pcb = processes.get_mut(pid).ok_or(FileError::NoCurrentProcess)?;
    let mut io = FileContext {
        fs,
        devices,
        pid,
        terminal: pcb.terminal,
    };

    let descriptor = pcb.files.get_mut(fd)?;
    let ops = descriptor.ops;
    ops.read(descriptor, &mut io, buffer)
}

fn write_descriptor<F: FileSystem, D: Devices>(
    processes: &ProcessTable,
    fs: &F,
    devices: &mut D,
    current: Option<Pid>,
    fd: u32,
    buffer: &[u8],
) -> Result<usize, FileError> {
    let pid = current.ok_or(FileError::NoCurrentProcess)?;
    let pcb = processes.get(pid).ok_or(FileError::NoCurrentProcess)?;
    let mut io = FileContext {
        fs,
        devices,
        pid,
        terminal: pcb.terminal,
    };

    pcb.files.get(fd)?.ops.write(&mut io, buffer)
}

impl<F: FileSystem, D: Devices, H: Hardware> Scheduler<F, D, H> {
    pub fn read(&mut self, fd: u32, buffer: &mut [u8]) -> Result<usize, FileError> {
        let _cli = CliGuard::new();
        read_descriptor(
            &mut self.processes,
            &self.fs,
            &mut self.devices,
            self.current,
            fd,
            buffer,
        )
    }

    /// `read` into a buffer in the current program window
    pub fn read_user(&mut self, fd: u32, address: u32, length: u32) -> Result<usize, FileError> {
        let _cli = CliGuard::new();
        let buffer = vm::user_slice(self.hardware.program_window(), address, length)?;
        read_descriptor(
            &mut self.processes,
            &self.fs,
            &mut self.devices,
            self.current,
            fd,
            buffer,
        )
    }

    pub fn write(&mut self, fd: u32, buffer: &[u8]) -> Result<usize, FileError> {
        let _cli = CliGuard::new();
        write_descriptor(
            &self.processes,
            &self.fs,
            &mut self.devices,
            self.current,
            fd,
            buffer,
        )
    }

    /// `write` from a buffer in the current program window
    pub fn write_user(&mut self, fd: u32, address: u32, length: u32) -> Result<usize, FileError> {
        let _cli = CliGuard::new();
        let buffer = vm::user_slice(self.hardware.program_window(), address, length)?;
        write_descriptor(
            &self.processes,
            &self.fs,
            &mut self.devices,
            self.current,
            fd,
            buffer,
        )
    }

    /// Binds `name` to the first free descriptor of the current process
    pub fn open(&mut self, name: &[u8]) -> Result<u32, FileError> {
        let _cli = CliGuard::new();

        let pid = self.current.ok_or(FileError::NoCurrentProcess)?;
        let pcb = self
            .processes
            .get_mut(pid)
            .ok_or(FileError::NoCurrentProcess)?;

        let fd = pcb.files.free_slot()?;
        let entry = self
            .fs
            .resolve(name)
            .map_err(|_| FileError::FileNotFound)?;
        let ops = FileOps::for_type(entry.file_type)?;

        let mut io = FileContext {
            fs: &self.fs,
            devices: &mut self.devices,
            pid,
            terminal: pcb.terminal,
        };
        ops.open(&mut io)?;

        pcb.files.install(fd, FileDescriptor::open(ops, &entry));
        Ok(fd as u32)
    }

    pub fn open_user(&mut self, address: u32) -> Result<u32, FileError> {
        let mut name = [0u8; FILE_NAME_LENGTH + 1];
        let name = vm::user_string(self.hardware.program_window(), address, &mut name)?;
        self.open(name)
    }

    pub fn close(&mut self, fd: u32) -> Result<(), FileError> {
        let _cli = CliGuard::new();

        if (fd as usize) < FIRST_USER_FD {
            return Err(FileError::InvalidDescriptor(fd));
        }

        let pid = self.current.ok_or(FileError::NoCurrentProcess)?;
        let pcb = self
            .processes
            .get_mut(pid)
            .ok_or(FileError::NoCurrentProcess)?;
        let mut io = FileContext {
            fs: &self.fs,
            devices: &mut self.devices,
            pid,
            terminal: pcb.terminal,
        };

        let descriptor = pcb.files.get_mut(fd)?;
        let ops = descriptor.ops;
        ops.close(descriptor, &mut io)
    }

    /// Copies the argument string of the current process into `buffer`, zero-filled and
    /// truncated to its length
    pub fn getargs(&mut self, buffer: &mut [u8]) -> Result<usize, ProcessError> {
        let _cli = CliGuard::new();

        buffer.fill(0);
        let pid = self.current.ok_or(ProcessError::NoCurrentProcess)?;
        let pcb = self
            .processes
            .get(pid)
            .ok_or(ProcessError::NoCurrentProcess)?;
        if pcb.arguments.is_empty() {
            return Err(ProcessError::NoArguments);
        }

        let arguments = pcb.arguments.as_bytes();
        let length = arguments.len().min(buffer.len());
        buffer[..length].copy_from_slice(&arguments[..length]);
        Ok(length)
    }

    pub fn getargs_user(&mut self, address: u32, length: u32) -> Result<usize, ProcessError> {
        let _cli = CliGuard::new();

        let pid = self.current.ok_or(ProcessError::NoCurrentProcess)?;
        let mut arguments = [0u8; COMMAND_LENGTH];
        let count = match self.processes.get(pid) {
            Some(pcb) => {
                let bytes = pcb.arguments.as_bytes();
                arguments[..bytes.len()].copy_from_slice(bytes);
                bytes.len()
            }
            None => return Err(ProcessError::NoCurrentProcess),
        };

        let buffer = vm::user_slice(self.hardware.program_window(), address, length)?;
        buffer.fill(0);
        if count == 0 {
            return Err(ProcessError::NoArguments);
        }

        let copied = count.min(buffer.len());
        buffer[..copied].copy_from_slice(&arguments[..copied]);
        Ok(copied)
    }

    /// Maps the video window for the current process and stores its address at `screen_start`
    pub fn vidmap(&mut self, screen_start: u32) -> Result<u32, ProcessError> {
        let _cli = CliGuard::new();

        let pid = self.current.ok_or(ProcessError::NoCurrentProcess)?;
        let slot = vm::user_slice(self.hardware.program_window(), screen_start, 4)?;
        slot.copy_from_slice(&VIDEO_WINDOW.to_le_bytes());

        let pcb = self
            .processes
            .get_mut(pid)
            .ok_or(ProcessError::NoCurrentProcess)?;
        pcb.video_mapped = true;
        vm::map_video(&mut self.hardware, pcb.terminal, self.displayed);

        Ok(VIDEO_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        devices::error::DeviceError,
        memory::defs::VIDEO_DIRECTORY_INDEX,
        testing::{kernel, TestKernel, USER_BUFFER},
    };

    fn booted() -> TestKernel {
        let mut kernel = kernel();
        kernel.boot().unwrap();
        kernel
    }

    #[test]
    fn console_descriptors_are_one_way() {
        let mut kernel = booted();
        let mut buffer = [0u8; 8];

        assert_eq!(kernel.read(1, &mut buffer), Err(FileError::BadCall));
        assert_eq!(kernel.write(0, b"nope"), Err(FileError::BadCall));
        assert_eq!(kernel.close(0), Err(FileError::InvalidDescriptor(0)));
        assert_eq!(kernel.close(1), Err(FileError::InvalidDescriptor(1)));

        let files = kernel.process(0).unwrap().files;
        assert_eq!(files.get(0).unwrap().ops, FileOps::Stdin);
        assert_eq!(files.get(1).unwrap().ops, FileOps::Stdout);
        assert_eq!(files.user_descriptors().count(), 0);
    }

    #[test]
    fn console_reaches_own_terminal() {
        let mut kernel = booted();
        kernel.switch_terminal(1).unwrap();

        assert_eq!(kernel.write(1, b"hi"), Ok(2));
        assert_eq!(kernel.devices.output[0], b"hi");

        let mut buffer = [0u8; 8];
        assert_eq!(kernel.read(0, &mut buffer), Err(FileError::WouldBlock));
        kernel.devices.input[0].push_back(b"ls\n".to_vec());
        assert_eq!(kernel.read(0, &mut buffer), Ok(3));
    }

    #[test]
    fn regular_files_read_sequentially() {
        let mut kernel = booted();
        let fd = kernel.open(b"frame0.txt").unwrap();
        assert_eq!(fd, 2);

        let mut buffer = [0u8; 3];
        assert_eq!(kernel.read(fd, &mut buffer), Ok(3));
        assert_eq!(&buffer, b"fis");
        assert_eq!(kernel.read(fd, &mut buffer), Ok(1));
        assert_eq!(buffer[0], b'h');
        assert_eq!(kernel.read(fd, &mut buffer), Ok(0));
        assert_eq!(kernel.write(fd, b"x"), Err(FileError::BadCall));

        kernel.close(fd).unwrap();
        assert_eq!(kernel.read(fd, &mut buffer), Err(FileError::InvalidDescriptor(fd)));
        assert_eq!(kernel.close(fd), Err(FileError::InvalidDescriptor(fd)));
    }

    #[test]
    fn directory_reads_one_name_per_call() {
        let mut kernel = booted();
        let fd = kernel.open(b".").unwrap();
        let mut buffer = [0u8; 32];
        let mut names = Vec::new();

        loop {
            let read = kernel.read(fd, &mut buffer).unwrap();
            if read == 0 {
                break;
            }
            names.push(buffer[..read].to_vec());
        }

        assert_eq!(names[0], b".");
        assert!(names.contains(&b"shell".to_vec()));
        assert_eq!(names.len(), kernel.fs.directory_count() as usize);
    }

    #[test]
    fn open_fails_without_side_effects() {
        let mut kernel = booted();

        assert_eq!(kernel.open(b"missing"), Err(FileError::FileNotFound));
        assert_eq!(kernel.open(b"weird"), Err(FileError::UnsupportedFileType(7)));
        assert_eq!(kernel.process(0).unwrap().files.user_descriptors().count(), 0);

        for _ in FIRST_USER_FD..MAX_OPEN_FILES {
            kernel.open(b"frame0.txt").unwrap();
        }
        assert_eq!(kernel.open(b"frame0.txt"), Err(FileError::TooManyOpenFiles));
    }

    #[test]
    fn rtc_descriptor_reaches_virtual_clock() {
        let mut kernel = booted();
        let fd = kernel.open(b"rtc").unwrap();
        assert_eq!(kernel.devices.rtc_opened, vec![0]);

        assert_eq!(kernel.write(fd, &32u32.to_le_bytes()), Ok(4));
        assert_eq!(kernel.devices.rtc_rates, vec![(0, 32)]);

        let mut buffer = [0u8; 4];
        assert_eq!(kernel.read(fd, &mut buffer), Ok(0));
        assert_eq!(
            kernel.write(fd, &[1]),
            Err(FileError::Device(DeviceError::InvalidLength(1)))
        );
    }

    #[test]
    fn failed_device_close_still_frees_descriptor() {
        let mut kernel = booted();
        let first = kernel.open(b"rtc").unwrap();
        let second = kernel.open(b"rtc").unwrap();
        assert_eq!(kernel.close(first), Ok(()));

        kernel.devices.rtc_close_error = Some(DeviceError::NotOpen);
        assert_eq!(
            kernel.close(second),
            Err(FileError::Device(DeviceError::NotOpen))
        );
        assert_eq!(kernel.close(second), Err(FileError::InvalidDescriptor(second)));
        assert_eq!(kernel.devices.rtc_closed, vec![0, 0]);
        assert_eq!(kernel.open(b"frame0.txt"), Ok(first));
    }

    #[test]
    fn user_buffers_are_bounds_checked() {
        let mut kernel = booted();
        kernel.hardware.write_user(USER_BUFFER, b"hello");

        assert_eq!(kernel.write_user(1, USER_BUFFER, 5), Ok(5));
        assert_eq!(kernel.devices.output[0], b"hello");
        assert!(matches!(
            kernel.write_user(1, 0x1000, 5),
            Err(FileError::BadAddress(_))
        ));

        kernel.hardware.write_user(USER_BUFFER, b"frame0.txt\0");
        assert_eq!(kernel.open_user(USER_BUFFER), Ok(2));
        assert_eq!(kernel.read_user(2, USER_BUFFER + 64, 4), Ok(4));
        assert_eq!(kernel.hardware.read_user(USER_BUFFER + 64, 4), b"fish");
    }

    #[test]
    fn getargs_zero_fills_and_truncates() {
        let mut kernel = booted();
        let mut buffer = [0xFFu8; 8];
        assert_eq!(kernel.getargs(&mut buffer), Err(ProcessError::NoArguments));
        assert_eq!(buffer, [0; 8]);

        kernel.execute(b"counter  frame0.txt  fast").unwrap();
        let mut buffer = [0xFFu8; 32];
        assert_eq!(kernel.getargs(&mut buffer), Ok(15));
        assert_eq!(&buffer[..16], b"frame0.txt fast\0");

        let mut short = [0u8; 5];
        assert_eq!(kernel.getargs(&mut short), Ok(5));
        assert_eq!(&short, b"frame");

        assert_eq!(kernel.getargs_user(USER_BUFFER, 32), Ok(15));
        assert_eq!(kernel.hardware.read_user(USER_BUFFER, 16), b"frame0.txt fast\0");
    }

    #[test]
    fn vidmap_validates_target_and_maps_window() {
        let mut kernel = booted();

        assert!(matches!(
            kernel.vidmap(0x0040_0000),
            Err(ProcessError::BadAddress(_))
        ));
        assert!(!kernel.process(0).unwrap().video_mapped);
        assert!(!kernel.hardware().directory[VIDEO_DIRECTORY_INDEX].is_present());

        assert_eq!(kernel.vidmap(USER_BUFFER), Ok(VIDEO_WINDOW));
        assert_eq!(
            kernel.hardware.read_user(USER_BUFFER, 4),
            VIDEO_WINDOW.to_le_bytes()
        );
        assert!(kernel.process(0).unwrap().video_mapped);
        assert_eq!(kernel.hardware().video_entry.address(), 0xB8000);
    }
}
