/// Virtualized real time clock. The chip runs at a fixed 1024 Hz and every process that opened
/// the device gets its own divided-down tick, so programs asking for different rates never
/// disturb each other. A process may hold several descriptors on the clock; they share its
/// channel, which stays open until the last one is closed.
use crate::scheduler::defs::{Pid, MAX_PROCESSES};

use super::{defs::*, error::DeviceError};

#[derive(Clone, Copy, Debug)]
struct RtcChannel {
    opens: u32,
    frequency: u32,
    countdown: u32,
    fired: bool,
}

impl RtcChannel {
    const CLOSED: RtcChannel = RtcChannel {
        opens: 0,
        frequency: RTC_DEFAULT_FREQUENCY,
        countdown: RTC_BASE_FREQUENCY / RTC_DEFAULT_FREQUENCY,
        fired: false,
    };

    fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
        self.countdown = RTC_BASE_FREQUENCY / frequency;
        self.fired = false;
    }
}

pub struct VirtualRtc {
    channels: [RtcChannel; MAX_PROCESSES],
}

impl VirtualRtc {
    pub const fn new() -> Self {
        VirtualRtc {
            channels: [RtcChannel::CLOSED; MAX_PROCESSES],
        }
    }

    fn channel(&mut self, pid: Pid) -> Result<&mut RtcChannel, DeviceError> {
        match self.channels.get_mut(pid) {
            Some(channel) if channel.opens > 0 => Ok(channel),
            _ => Err(DeviceError::NotOpen),
        }
    }

    pub fn open(&mut self, pid: Pid) -> Result<(), DeviceError> {
        let channel = self.channels.get_mut(pid).ok_or(DeviceError::NotOpen)?;
        channel.opens += 1;
        channel.set_frequency(RTC_DEFAULT_FREQUENCY);
        Ok(())
    }

    /// Called on every interrupt of the physical clock
    pub fn tick(&mut self) {
        for channel in self.channels.iter_mut().filter(|channel| channel.opens > 0) {
            channel.countdown -= 1;
            if channel.countdown == 0 {
                channel.countdown = RTC_BASE_FREQUENCY / channel.frequency;
                channel.fired = true;
            }
        }
    }

    /// Consumes the pending virtual tick of `pid`
    pub fn read(&mut self, pid: Pid) -> Result<usize, DeviceError> {
        let channel = self.channel(pid)?;
        if !channel.fired {
            return Err(DeviceError::WouldBlock);
        }

        channel.fired = false;
        Ok(0)
    }

    /// Takes a 4 byte little-endian frequency, a power of two between 2 and 1024 Hz
    pub fn write(&mut self, pid: Pid, buffer: &[u8]) -> Result<usize, DeviceError> {
        let channel = self.channel(pid)?;
        let raw: [u8; 4] = buffer
            .try_into()
            .map_err(|_| DeviceError::InvalidLength(buffer.len()))?;

        let frequency = u32::from_le_bytes(raw);
        if !frequency.is_power_of_two()
            || !(RTC_MIN_FREQUENCY..=RTC_BASE_FREQUENCY).contains(&frequency)
        {
            return Err(DeviceError::InvalidFrequency(frequency));
        }

        channel.set_frequency(frequency);
        Ok(buffer.len())
    }

    pub fn close(&mut self, pid: Pid) -> Result<(), DeviceError> {
        let channel = self.channel(pid)?;
        channel.opens -= 1;
        if channel.opens == 0 {
            *channel = RtcChannel::CLOSED;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_fires_twice_per_second() {
        let mut rtc = VirtualRtc::new();
        rtc.open(0).unwrap();

        for _ in 0..511 {
            rtc.tick();
        }
        assert_eq!(rtc.read(0), Err(DeviceError::WouldBlock));

        rtc.tick();
        assert_eq!(rtc.read(0), Ok(0));
        assert_eq!(rtc.read(0), Err(DeviceError::WouldBlock));
    }

    #[test]
    fn processes_keep_independent_rates() {
        let mut rtc = VirtualRtc::new();
        rtc.open(1).unwrap();
        rtc.open(2).unwrap();
        rtc.write(1, &512u32.to_le_bytes()).unwrap();

        rtc.tick();
        rtc.tick();
        assert_eq!(rtc.read(1), Ok(0));
        assert_eq!(rtc.read(2), Err(DeviceError::WouldBlock));
    }

    #[test]
    fn rejects_bad_frequencies() {
        let mut rtc = VirtualRtc::new();
        rtc.open(0).unwrap();

        assert_eq!(
            rtc.write(0, &3u32.to_le_bytes()),
            Err(DeviceError::InvalidFrequency(3))
        );
        assert_eq!(
            rtc.write(0, &2048u32.to_le_bytes()),
            Err(DeviceError::InvalidFrequency(2048))
        );
        assert_eq!(rtc.write(0, &[2, 0]), Err(DeviceError::InvalidLength(2)));
        assert_eq!(rtc.write(0, &1024u32.to_le_bytes()), Ok(4));
    }

    #[test]
    fn closed_channels_refuse_io() {
        let mut rtc = VirtualRtc::new();
        assert_eq!(rtc.read(3), Err(DeviceError::NotOpen));

        rtc.open(3).unwrap();
        rtc.close(3).unwrap();
        assert_eq!(rtc.read(3), Err(DeviceError::NotOpen));
        assert_eq!(rtc.close(3), Err(DeviceError::NotOpen));
    }

    #[test]
    fn channel_outlives_all_but_last_close() {
        let mut rtc = VirtualRtc::new();
        rtc.open(2).unwrap();
        rtc.open(2).unwrap();
        rtc.close(2).unwrap();

        assert_eq!(rtc.write(2, &1024u32.to_le_bytes()), Ok(4));
        rtc.tick();
        assert_eq!(rtc.read(2), Ok(0));

        rtc.close(2).unwrap();
        assert_eq!(rtc.read(2), Err(DeviceError::NotOpen));
        assert_eq!(rtc.close(2), Err(DeviceError::NotOpen));
    }
}
