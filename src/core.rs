//! Defines the "data contract" between the configuration builder (the scribe)
//! and the bus runtime (the interpreter).
//!
//! The builder produces descriptors from the configuration text. The `bus`
//! module consumes those descriptors to lay out signal storage and to encode
//! or decode wire payloads.
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use embassy_time::Duration;

use crate::bus::Message;

/// Byte order of a signal's raw container within the wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endianness {
    Little,
    Big,
}

/// CAN frame identifier format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameType {
    /// 11-bit identifier, at most `0x7FF`.
    Standard,
    /// 29-bit identifier.
    Extended,
}

/// Supported bus bit rates, handed to the driver at installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Mbps1,
}

/// Invoked by the bus when a registered message is received and its storage
/// region has been updated with the fresh payload.
pub type ReceiveCallback = Box<dyn FnMut(&Message)>;

/// Static layout of one signal within a message payload.
///
/// Pure specification: immutable once the runtime [`crate::bus::Signal`] has
/// been created from it. `start_bit` is relative to the owning message's
/// payload, not absolute in the storage arena.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDescriptor {
    /// Signal identifier used in diagnostics and name lookups.
    pub name: String,
    /// First bit of the signal within the message payload.
    pub start_bit: u8,
    /// Width in bits (1 to 64).
    pub length: u8,
    /// Whether the raw field is sign-extended on decode.
    pub is_signed: bool,
    /// Byte order of the raw container on the wire.
    pub endianness: Endianness,
    /// Physical value = raw * factor + offset.
    pub factor: f64,
    pub offset: f64,
    /// Advisory physical range. Not enforced by the codec.
    pub minimum: f64,
    pub maximum: f64,
}

impl Default for SignalDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_bit: 0,
            length: 0,
            is_signed: false,
            endianness: Endianness::Little,
            factor: 1.0,
            offset: 0.0,
            minimum: 0.0,
            maximum: 0.0,
        }
    }
}

/// Static layout of one CAN message: identifier, payload length, and the
/// ordered signals packed into its payload.
pub struct MessageDescriptor {
    /// Message identifier used in diagnostics.
    pub name: String,
    /// CAN identifier. Standard frames must stay at or below `0x7FF`.
    pub id: u32,
    /// Payload length in bytes (0 to 8).
    pub length: u8,
    pub frame_type: FrameType,
    /// Ordered signal layouts, each relative to this payload.
    pub signals: Vec<SignalDescriptor>,
    /// Callback registered with the bus when the message is added.
    pub on_receive: Option<ReceiveCallback>,
}

impl MessageDescriptor {
    /// Descriptor with no signals and no callback; fields are filled in by
    /// the caller or the configuration builder.
    pub fn new(name: String, id: u32, length: u8) -> Self {
        Self {
            name,
            id,
            length,
            frame_type: FrameType::Standard,
            signals: Vec::new(),
            on_receive: None,
        }
    }
}

/// Global tunables parsed from the head of the configuration text.
/// Defaults apply for every option the text leaves unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryOptions {
    /// Period of the SD snapshot logger, in milliseconds.
    pub log_period_ms: u16,
    /// Period of the wireless telemetry uplink, in milliseconds.
    pub wireless_period_ms: u16,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            log_period_ms: 50,
            wireless_period_ms: 100,
        }
    }
}

impl TelemetryOptions {
    /// Logger period as a scheduler-ready duration.
    pub fn log_period(&self) -> Duration {
        Duration::from_millis(self.log_period_ms as u64)
    }

    /// Wireless uplink period as a scheduler-ready duration.
    pub fn wireless_period(&self) -> Duration {
        Duration::from_millis(self.wireless_period_ms as u64)
    }
}
