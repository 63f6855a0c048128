// Pololu Maestro serial protocol (compact form)
//
// Command format: [command byte, channel?, payload...]. 16-bit values are
// split into two 7-bit bytes, low first. Targets, speeds and positions are
// in quarter-microseconds of servo pulse width (so 6000 = 1.5 ms = center
// for a standard servo).

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{self, SerialPort};
use tracing::debug;

/// Default serial configuration for the Maestro TTL port
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Command bytes (compact protocol)
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Command {
    SetTarget = 0x84,
    SetSpeed = 0x87,
    SetAcceleration = 0x89,
    GetPosition = 0x90,
    GetErrors = 0xA1,
    GoHome = 0xA2,
}

/// Error types for Maestro communication
#[derive(Debug, thiserror::Error)]
pub enum MaestroError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timeout waiting for controller response")]
    Timeout,

    #[error("controller reported error bits 0x{bits:04X}")]
    Controller { bits: u16 },
}

pub type Result<T> = std::result::Result<T, MaestroError>;

/// Maestro servo controller bus over a serial port
pub struct MaestroBus {
    port: Box<dyn SerialPort>,
}

impl MaestroBus {
    /// Open a connection to the controller
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Split a value into two 7-bit bytes, low first
    fn split7(value: u16) -> [u8; 2] {
        [(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
    }

    /// Build a channel command carrying one 14-bit value
    fn build_channel_packet(command: Command, channel: u8, value: u16) -> [u8; 4] {
        let [lo, hi] = Self::split7(value);
        [command as u8, channel, lo, hi]
    }

    fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.port.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                MaestroError::Timeout
            } else {
                MaestroError::Io(e)
            }
        })?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Command a channel to a pulse width in quarter-microseconds
    pub fn set_target(&mut self, channel: u8, target_qus: u16) -> Result<()> {
        debug!("set target: channel={}, target={}qus", channel, target_qus);
        self.send(&Self::build_channel_packet(Command::SetTarget, channel, target_qus))
    }

    /// Limit a channel's speed, in (quarter-µs)/(10 ms). 0 = unlimited.
    pub fn set_speed(&mut self, channel: u8, speed: u16) -> Result<()> {
        self.send(&Self::build_channel_packet(Command::SetSpeed, channel, speed))
    }

    /// Limit a channel's acceleration, 0-255. 0 = unlimited.
    pub fn set_acceleration(&mut self, channel: u8, accel: u8) -> Result<()> {
        self.send(&Self::build_channel_packet(
            Command::SetAcceleration,
            channel,
            u16::from(accel),
        ))
    }

    /// Read back a channel's current pulse width in quarter-microseconds
    pub fn get_position(&mut self, channel: u8) -> Result<u16> {
        self.send(&[Command::GetPosition as u8, channel])?;
        self.read_u16_le()
    }

    /// Read and clear the controller's error register
    pub fn get_errors(&mut self) -> Result<u16> {
        self.send(&[Command::GetErrors as u8])?;
        self.read_u16_le()
    }

    /// Read the error register and fail if any error bit is set
    pub fn check_errors(&mut self) -> Result<()> {
        match self.get_errors()? {
            0 => Ok(()),
            bits => Err(MaestroError::Controller { bits }),
        }
    }

    /// Send all channels to their configured home positions
    pub fn go_home(&mut self) -> Result<()> {
        self.send(&[Command::GoHome as u8])
    }
}
