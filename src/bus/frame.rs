//! In-memory representation of a raw CAN frame as exchanged with the
//! transport driver.
use embedded_can::{ExtendedId, Id, StandardId};

/// Raw wire-shape frame: identifier, payload length, and an eight-byte
/// payload buffer. Ephemeral, produced and consumed at the encode/decode
/// boundary only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawCanFrame {
    /// CAN identifier, 11 bits for standard frames, 29 for extended.
    pub id: u32,
    /// Whether `id` is a 29-bit extended identifier.
    pub extended: bool,
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: u8,
    /// Payload buffer. Unused trailing bytes stay zero.
    pub data: [u8; 8],
}

impl RawCanFrame {
    /// Standard-frame constructor; `data` beyond eight bytes yields `None`.
    pub fn standard(id: u32, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut frame = Self {
            id,
            extended: false,
            len: data.len() as u8,
            data: [0; 8],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(8)]
    }

    /// The whole payload buffer viewed as one little-endian word.
    pub fn data_u64(&self) -> u64 {
        u64::from_le_bytes(self.data)
    }
}

impl Default for RawCanFrame {
    fn default() -> Self {
        Self {
            id: 0,
            extended: false,
            len: 0,
            data: [0; 8],
        }
    }
}

impl embedded_can::Frame for RawCanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let (id, extended) = match id.into() {
            Id::Standard(standard) => (standard.as_raw() as u32, false),
            Id::Extended(extended) => (extended.as_raw(), true),
        };
        let mut frame = Self {
            id,
            extended,
            len: data.len() as u8,
            data: [0; 8],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    // Remote frames carry no telemetry payload; unsupported here.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        if self.extended {
            Id::Extended(ExtendedId::new(self.id).unwrap_or(ExtendedId::MAX))
        } else {
            Id::Standard(StandardId::new(self.id as u16).unwrap_or(StandardId::MAX))
        }
    }

    fn dlc(&self) -> usize {
        self.len as usize
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
