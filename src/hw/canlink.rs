// Serial protocol for the USB -> CAN bridge
//
// The bridge forwards framed commands to CAN speed controllers and the gyro.
// Frame format: [0xAA, 0x55, Opcode, ID_hi, ID_lo, Length, Params..., Checksum]
// Command frames get no response; read frames are answered with the same
// framing and the requested value as params.

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use super::{HeadingSensor, MotorController, NeutralMode};

/// Default serial configuration for the bridge
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Frame header bytes
const HEADER: [u8; 2] = [0xAA, 0x55];

/// Percent output is carried as a signed scaled integer: 1.0 -> 10000
const OUTPUT_SCALE: f64 = 10_000.0;

/// Bridge opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    SetOutput = 0x01,
    SetNeutral = 0x02,
    Follow = 0x03,
    ReadPosition = 0x04,
    SetPosition = 0x05,
    ReadHeading = 0x06,
}

/// Error types for bridge communication
#[derive(Debug, thiserror::Error)]
pub enum CanLinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from device {id}: {reason}")]
    InvalidResponse { id: u16, reason: String },

    #[error("Checksum mismatch for device {id}")]
    ChecksumMismatch { id: u16 },

    #[error("Timeout waiting for response from device {id}")]
    Timeout { id: u16 },
}

pub type Result<T> = std::result::Result<T, CanLinkError>;

/// Serial connection to the CAN bridge
pub struct CanLink {
    port: Box<dyn SerialPort>,
}

impl CanLink {
    /// Open a new connection to the bridge
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Calculate checksum for a frame (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a frame with header and checksum
    fn build_frame(opcode: Opcode, id: u16, params: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(7 + params.len());

        frame.extend_from_slice(&HEADER);
        frame.push(opcode as u8);
        frame.extend_from_slice(&id.to_be_bytes());
        frame.push(params.len() as u8);
        frame.extend_from_slice(params);

        // Checksum over opcode, id, length, params
        let checksum_data = &frame[2..];
        frame.push(Self::checksum(checksum_data));

        frame
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a response frame and return its params
    fn read_response(&mut self, expected_opcode: Opcode, expected_id: u16) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.port.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                CanLinkError::Timeout { id: expected_id }
            } else {
                CanLinkError::Io(e)
            }
        })?;

        if header != HEADER {
            return Err(CanLinkError::InvalidResponse {
                id: expected_id,
                reason: format!("Invalid header: {:02X?}", header),
            });
        }

        let mut meta = [0u8; 4];
        self.port.read_exact(&mut meta)?;
        let opcode = meta[0];
        let id = u16::from_be_bytes([meta[1], meta[2]]);
        let length = meta[3] as usize;

        if opcode != expected_opcode as u8 {
            return Err(CanLinkError::InvalidResponse {
                id: expected_id,
                reason: format!(
                    "Opcode mismatch: expected 0x{:02X}, got 0x{:02X}",
                    expected_opcode as u8, opcode
                ),
            });
        }
        if id != expected_id {
            return Err(CanLinkError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }

        // Params + trailing checksum
        let mut remaining = vec![0u8; length + 1];
        self.port.read_exact(&mut remaining)?;

        let mut checksum_data = meta.to_vec();
        checksum_data.extend_from_slice(&remaining[..length]);
        if Self::checksum(&checksum_data) != remaining[length] {
            return Err(CanLinkError::ChecksumMismatch { id });
        }

        remaining.truncate(length);
        Ok(remaining)
    }

    /// Command percent output in [-1, 1]
    pub fn set_output(&mut self, id: u16, percent: f64) -> Result<()> {
        let raw = encode_output(percent);
        debug!("Device {}: output {:.3} (raw {})", id, percent, raw);
        let frame = Self::build_frame(Opcode::SetOutput, id, &raw.to_be_bytes());
        self.send_frame(&frame)
    }

    /// Select brake or coast behavior at zero output
    pub fn set_neutral(&mut self, id: u16, mode: NeutralMode) -> Result<()> {
        let value = match mode {
            NeutralMode::Coast => 0u8,
            NeutralMode::Brake => 1u8,
        };
        debug!("Device {}: neutral mode {:?}", id, mode);
        let frame = Self::build_frame(Opcode::SetNeutral, id, &[value]);
        self.send_frame(&frame)
    }

    /// Hardware-link a controller to mirror the given primary
    pub fn follow(&mut self, id: u16, primary_id: u16) -> Result<()> {
        debug!("Device {}: following {}", id, primary_id);
        let frame = Self::build_frame(Opcode::Follow, id, &primary_id.to_be_bytes());
        self.send_frame(&frame)
    }

    /// Read the feedback sensor position, in ticks
    pub fn position(&mut self, id: u16) -> Result<i32> {
        let frame = Self::build_frame(Opcode::ReadPosition, id, &[]);
        self.send_frame(&frame)?;

        let params = self.read_response(Opcode::ReadPosition, id)?;
        if params.len() < 4 {
            return Err(CanLinkError::InvalidResponse {
                id,
                reason: format!("Expected 4 bytes, got {}", params.len()),
            });
        }
        Ok(i32::from_be_bytes([params[0], params[1], params[2], params[3]]))
    }

    /// Overwrite the feedback sensor position
    pub fn set_position(&mut self, id: u16, ticks: i32) -> Result<()> {
        let frame = Self::build_frame(Opcode::SetPosition, id, &ticks.to_be_bytes());
        self.send_frame(&frame)
    }

    /// Read the gyro heading in centidegrees [0, 36000)
    pub fn heading_centidegrees(&mut self, id: u16) -> Result<u16> {
        let frame = Self::build_frame(Opcode::ReadHeading, id, &[]);
        self.send_frame(&frame)?;

        let params = self.read_response(Opcode::ReadHeading, id)?;
        if params.len() < 2 {
            return Err(CanLinkError::InvalidResponse {
                id,
                reason: format!("Expected 2 bytes, got {}", params.len()),
            });
        }
        Ok(u16::from_be_bytes([params[0], params[1]]))
    }
}

/// Scale and clamp percent output to the wire representation
fn encode_output(percent: f64) -> i16 {
    let scaled = (percent * OUTPUT_SCALE).round();
    scaled.clamp(-OUTPUT_SCALE, OUTPUT_SCALE) as i16
}

/// A speed controller reached through a shared [`CanLink`].
///
/// Satisfies the infallible [`MotorController`] contract by logging transport
/// faults and serving the last good sensor value when a read fails.
pub struct CanMotorController {
    link: Arc<Mutex<CanLink>>,
    id: u16,
    last_position: i32,
}

impl CanMotorController {
    pub fn new(link: Arc<Mutex<CanLink>>, id: u16) -> Self {
        Self {
            link,
            id,
            last_position: 0,
        }
    }

    fn with_link<T>(&self, op: impl FnOnce(&mut CanLink) -> Result<T>) -> Option<T> {
        let Ok(mut link) = self.link.lock() else {
            warn!("Device {}: bridge lock poisoned", self.id);
            return None;
        };
        match op(&mut link) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Device {}: {}", self.id, e);
                None
            }
        }
    }
}

impl MotorController for CanMotorController {
    fn id(&self) -> u16 {
        self.id
    }

    fn set_output(&mut self, percent: f64) {
        let id = self.id;
        self.with_link(|link| link.set_output(id, percent));
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) {
        let id = self.id;
        self.with_link(|link| link.set_neutral(id, mode));
    }

    fn follow(&mut self, primary_id: u16) {
        let id = self.id;
        self.with_link(|link| link.follow(id, primary_id));
    }

    fn sensor_position(&mut self) -> i32 {
        let id = self.id;
        if let Some(position) = self.with_link(|link| link.position(id)) {
            self.last_position = position;
        }
        self.last_position
    }

    fn set_sensor_position(&mut self, ticks: i32) {
        let id = self.id;
        if self.with_link(|link| link.set_position(id, ticks)).is_some() {
            self.last_position = ticks;
        }
    }
}

/// The CAN gyro, read through the shared bridge
pub struct CanHeadingSensor {
    link: Arc<Mutex<CanLink>>,
    id: u16,
    last_heading: f64,
}

impl CanHeadingSensor {
    pub fn new(link: Arc<Mutex<CanLink>>, id: u16) -> Self {
        Self {
            link,
            id,
            last_heading: 0.0,
        }
    }
}

impl HeadingSensor for CanHeadingSensor {
    fn heading_degrees(&mut self) -> f64 {
        let Ok(mut link) = self.link.lock() else {
            warn!("Gyro {}: bridge lock poisoned", self.id);
            return self.last_heading;
        };
        match link.heading_centidegrees(self.id) {
            Ok(raw) => {
                self.last_heading = f64::from(raw) / 100.0;
            }
            Err(e) => warn!("Gyro {}: {}", self.id, e),
        }
        self.last_heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        // Opcode=SetNeutral, ID=3, Length=1, Param=1
        let data = [0x02u8, 0, 3, 1, 1];
        let checksum = CanLink::checksum(&data);
        // ~(2+0+3+1+1) = ~7 = 248
        assert_eq!(checksum, 248);
    }

    #[test]
    fn test_build_frame() {
        let frame = CanLink::build_frame(Opcode::ReadPosition, 1, &[]);
        // Header (2) + Opcode (1) + ID (2) + Length (1) + Checksum (1) = 7 bytes
        assert_eq!(frame.len(), 7);
        assert_eq!(frame[0], 0xAA);
        assert_eq!(frame[1], 0x55);
        assert_eq!(frame[2], Opcode::ReadPosition as u8);
        assert_eq!(frame[3..5], [0, 1]); // ID, big-endian
        assert_eq!(frame[5], 0); // no params
        assert_eq!(frame[6], CanLink::checksum(&frame[2..6]));
    }

    #[test]
    fn test_output_encoding() {
        assert_eq!(encode_output(0.0), 0);
        assert_eq!(encode_output(1.0), 10_000);
        assert_eq!(encode_output(-1.0), -10_000);
        assert_eq!(encode_output(0.5), 5_000);
        // Out-of-range commands are clamped, not wrapped
        assert_eq!(encode_output(3.0), 10_000);
        assert_eq!(encode_output(-3.0), -10_000);
    }
}
