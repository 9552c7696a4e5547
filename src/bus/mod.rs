//! CAN database runtime.
//!
//! The bus owns the shared storage arena plus the message registry built from
//! descriptors, hands out stable message records, and translates between raw
//! wire frames and typed, scaled signal values. Schema building is a one-way
//! state machine: `BUILDING` accepts [`CanBus::add_message`], then
//! [`CanBus::initialize`] installs the driver, sizes the arena, and freezes
//! the schema for the lifetime of the bus.
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::core::{BaudRate, Endianness, FrameType, MessageDescriptor, ReceiveCallback};
use crate::error::{BitBufferError, BusError, InitError, SendError};
use crate::infra::bit_buffer::{BitBuffer, BitBufferHandle};

pub mod driver;
pub mod frame;

use driver::CanDriver;
use frame::RawCanFrame;

/// Hard cap on frames drained per [`CanBus::update`] call, so a backed-up
/// receive queue cannot starve other periodic work. Dropped frames under
/// sustained overload are acceptable; the driver queue bounds the loss.
pub const MAX_FRAMES_PER_UPDATE: usize = 32;

/// The storage arena behind one coarse lock. Signal regions can be touched
/// concurrently by the receive path and application threads; copies are tiny
/// (at most eight bytes per message), so contention stays cheap.
type SharedArena = Arc<Mutex<CriticalSectionRawMutex, RefCell<BitBuffer>>>;

//==================================================================================SIGNAL
/// Runtime record of one bit-packed signal. Created once when its owning
/// message is added, never mutated afterwards; the signal's *value* lives in
/// the bus's shared arena, addressed via `handle`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    /// Absolute region in the arena (message offset + declared start bit).
    handle: BitBufferHandle,
    is_signed: bool,
    endianness: Endianness,
    factor: f64,
    offset: f64,
}

impl Signal {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> BitBufferHandle {
        self.handle
    }

    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

//==================================================================================MESSAGE
/// Runtime record of one CAN message: static layout plus a handle on the
/// shared arena region where its payload is stored.
///
/// Messages live in a node-stable map owned by the bus; instead of a
/// back-reference to the bus, each record carries its own clone of the arena
/// handle, so signal access never dangles however the registry grows.
pub struct Message {
    name: String,
    id: u32,
    length: u8,
    frame_type: FrameType,
    /// Whole-message byte region, always byte-aligned in the arena.
    handle: BitBufferHandle,
    signals: Vec<Signal>,
    arena: SharedArena,
}

// Manual impl: the arena lock is opaque, so only the static layout is
// formatted.
impl core::fmt::Debug for Message {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Message")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("length", &self.length)
            .field("frame_type", &self.frame_type)
            .field("handle", &self.handle)
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}

impl Message {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Payload length in bytes.
    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn handle(&self) -> BitBufferHandle {
        self.handle
    }

    /// Signals in declaration order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Look a signal up by its configured name.
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    /// Decode a signal's current physical value from the arena.
    ///
    /// The raw bit pattern is zero-extended, byte-swapped back for big-endian
    /// signals, sign-extended when declared signed, then scaled through
    /// `raw * factor + offset`.
    pub fn value<T: SignalValue>(&self, signal: &Signal) -> Result<T, BitBufferError> {
        let raw = self.arena.lock(|cell| cell.borrow().read_raw(signal.handle))?;
        Ok(T::from_f64(decode_raw(signal, raw)))
    }

    /// Encode a physical value and store its raw bit pattern in the arena.
    ///
    /// `raw = round((value - offset) / factor)`, truncated to the signal's
    /// declared width; big-endian signals get their container bytes reversed
    /// before the bit write so the arena always holds the wire layout.
    pub fn set_value<T: SignalValue>(&self, signal: &Signal, value: T) -> Result<(), BitBufferError> {
        let raw = encode_raw(signal, value.into_f64());
        self.arena
            .lock(|cell| cell.borrow_mut().write_raw(signal.handle, raw))
    }

    /// Shorthand for [`Self::value`] by signal name.
    pub fn value_of<T: SignalValue>(&self, name: &str) -> Option<T> {
        let signal = self.signal(name)?;
        self.value(signal).ok()
    }
}

//==================================================================================SIGNAL_CODEC
/// Numeric types that can cross the typed get/set boundary of the codec.
pub trait SignalValue: Copy {
    fn into_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_signal_value {
    ($($t:ty),*) => {$(
        impl SignalValue for $t {
            #[inline]
            fn into_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }
        }
    )*};
}

impl_signal_value!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

fn width_mask(size: usize) -> u64 {
    if size >= 64 {
        u64::MAX
    } else {
        (1u64 << size) - 1
    }
}

/// Reverse the raw container's bytes over its occupied span. Defined over
/// whole container bytes; widths that are not byte multiples keep their bit
/// packing within each byte.
fn swap_container_bytes(raw: u64, size: usize) -> u64 {
    let span = size.div_ceil(8);
    let mut bytes = raw.to_le_bytes();
    bytes[..span].reverse();
    u64::from_le_bytes(bytes)
}

fn encode_raw(signal: &Signal, value: f64) -> u64 {
    let scaled = (value - signal.offset) / signal.factor;
    // Round half away from zero; `f64::round` is not available in core.
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i64
    } else {
        (scaled - 0.5) as i64
    };
    let raw = (rounded as u64) & width_mask(signal.handle.size);
    match signal.endianness {
        Endianness::Little => raw,
        Endianness::Big => swap_container_bytes(raw, signal.handle.size),
    }
}

fn decode_raw(signal: &Signal, raw: u64) -> f64 {
    let raw = match signal.endianness {
        Endianness::Little => raw,
        Endianness::Big => swap_container_bytes(raw, signal.handle.size),
    };
    let value = if signal.is_signed {
        // Shift left then arithmetic-shift right to propagate the sign bit;
        // a plain zero-extended extraction would misread negative values.
        let shift = 64 - signal.handle.size as u32;
        (((raw << shift) as i64) >> shift) as f64
    } else {
        raw as f64
    };
    value * signal.factor + signal.offset
}

//==================================================================================CAN_BUS
/// Management runtime for CAN messages, abstracting over the DBC (provided by
/// adding messages), the transport driver, and the compact shared storage of
/// every live signal value.
pub struct CanBus<'d, D: CanDriver> {
    driver: &'d mut D,
    baud_rate: BaudRate,
    messages: BTreeMap<u32, Message>,
    callbacks: BTreeMap<u32, ReceiveCallback>,
    arena: SharedArena,
    next_bit_offset: usize,
    initialized: bool,
}

impl<'d, D: CanDriver> CanBus<'d, D> {
    /// Bus in the `BUILDING` state with an empty placeholder arena. The
    /// driver is referenced, never owned; its lifecycle belongs to the
    /// embedding application.
    pub fn new(driver: &'d mut D, baud_rate: BaudRate) -> Self {
        Self {
            driver,
            baud_rate,
            messages: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            arena: Arc::new(Mutex::new(RefCell::new(BitBuffer::empty()))),
            next_bit_offset: 0,
            initialized: false,
        }
    }

    /// Register a message and lay out its storage.
    ///
    /// The message region starts at the next byte boundary of the arena; each
    /// signal gets a sub-region at `message_offset + start_bit`. A callback
    /// carried by the descriptor is registered under the message id. The
    /// returned reference stays valid for the lifetime of the bus.
    pub fn add_message(&mut self, mut descriptor: MessageDescriptor) -> Result<&Message, BusError> {
        if self.initialized {
            #[cfg(feature = "defmt")]
            defmt::error!("Cannot add messages after initialization");
            return Err(BusError::SchemaFrozen);
        }
        if self.messages.contains_key(&descriptor.id) {
            return Err(BusError::DuplicateMessage { id: descriptor.id });
        }
        if descriptor.length > 8 {
            return Err(BusError::MessageTooLong {
                id: descriptor.id,
                length: descriptor.length,
            });
        }
        if descriptor.frame_type == FrameType::Standard && descriptor.id > 0x7FF {
            return Err(BusError::IdOutOfRange { id: descriptor.id });
        }

        // Message regions always start on a byte boundary.
        self.next_bit_offset = self.next_bit_offset.next_multiple_of(8);
        let handle = BitBufferHandle::new(descriptor.length as usize * 8, self.next_bit_offset);
        self.next_bit_offset += handle.size;

        let mut signals = Vec::with_capacity(descriptor.signals.len());
        for signal in descriptor.signals.drain(..) {
            signals.push(Signal {
                name: signal.name,
                // Declared positions are relative to the message payload.
                handle: BitBufferHandle::new(
                    signal.length as usize,
                    handle.offset + signal.start_bit as usize,
                ),
                is_signed: signal.is_signed,
                endianness: signal.endianness,
                factor: signal.factor,
                offset: signal.offset,
            });
        }

        if let Some(callback) = descriptor.on_receive.take() {
            self.callbacks.insert(descriptor.id, callback);
        }

        let id = descriptor.id;
        self.messages.insert(
            id,
            Message {
                name: descriptor.name,
                id,
                length: descriptor.length,
                frame_type: descriptor.frame_type,
                handle,
                signals,
                arena: self.arena.clone(),
            },
        );
        Ok(&self.messages[&id])
    }

    /// One-way `BUILDING -> INITIALIZED` transition: installs the driver at
    /// the configured baud rate and sizes the arena to exactly the allocated
    /// bit count. A second call is rejected without side effects.
    pub fn initialize(&mut self) -> Result<(), InitError<D::Error>> {
        if self.initialized {
            #[cfg(feature = "defmt")]
            defmt::error!("Bus is already initialized");
            return Err(InitError::AlreadyInitialized);
        }
        self.driver.install(self.baud_rate).map_err(InitError::Driver)?;
        let total_bits = self.next_bit_offset;
        self.arena
            .lock(|cell| *cell.borrow_mut() = BitBuffer::new(total_bits));
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Look a message up by CAN id.
    pub fn message(&self, id: u32) -> Option<&Message> {
        self.messages.get(&id)
    }

    /// Registered messages in ascending id order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Inspect the transport (handy for test doubles and diagnostics).
    pub fn driver(&self) -> &D {
        self.driver
    }

    /// Snapshot a message's byte region out of the arena and forward it to
    /// the driver. No per-signal re-encoding happens here: signal values
    /// already live correctly packed in the buffer.
    pub fn send(&mut self, id: u32) -> Result<(), SendError<D::Error>> {
        let message = self
            .messages
            .get(&id)
            .ok_or(SendError::UnknownMessage { id })?;

        let mut data = [0u8; 8];
        if message.handle.size > 0 {
            self.arena.lock(|cell| {
                cell.borrow()
                    .read_bytes(message.handle, &mut data[..message.length as usize])
            })?;
        }

        let raw = RawCanFrame {
            id: message.id,
            extended: message.frame_type == FrameType::Extended,
            len: message.length,
            data,
        };
        self.driver.send(&raw).map_err(SendError::Driver)
    }

    /// Receive path: drain the driver's pending frames (bounded per call),
    /// write each known message's payload into its arena region, and
    /// dispatch the registered callback with the updated message. Unknown
    /// ids are ignored. Returns the number of frames consumed.
    pub fn update(&mut self) -> usize {
        let mut drained = 0;
        while drained < MAX_FRAMES_PER_UPDATE {
            let Some(raw) = self.driver.receive() else {
                return drained;
            };
            drained += 1;

            let Some(message) = self.messages.get(&raw.id) else {
                #[cfg(feature = "defmt")]
                defmt::trace!("Ignoring unknown CAN id {:#x}", raw.id);
                continue;
            };
            if message.handle.size > 0 {
                let written = self.arena.lock(|cell| {
                    cell.borrow_mut()
                        .write_bytes(message.handle, &raw.data[..message.length as usize])
                });
                if written.is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Dropping frame {:#x}: arena not sized yet", raw.id);
                    continue;
                }
            }
            if let Some(callback) = self.callbacks.get_mut(&raw.id) {
                callback(message);
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "Receive drain cap of {} frames reached, queue may be backing up",
            MAX_FRAMES_PER_UPDATE
        );
        drained
    }

    /// Register a receive callback for a message id; the last registration
    /// wins.
    pub fn register_callback(&mut self, id: u32, callback: ReceiveCallback) {
        self.callbacks.insert(id, callback);
    }

    /// Coarse structural sanity check, usable before or after
    /// initialization: message regions byte-aligned and pairwise disjoint,
    /// every signal handle inside its message's byte region, and (once
    /// sized) every region inside the arena.
    pub fn validate_messages(&self) -> bool {
        let mut regions: Vec<(usize, usize)> = self
            .messages
            .values()
            .map(|message| (message.handle.offset, message.handle.end()))
            .collect();
        regions.sort_unstable();
        if regions.windows(2).any(|pair| pair[1].0 < pair[0].1) {
            return false;
        }

        let arena_bits = self.arena.lock(|cell| cell.borrow().bit_size());
        for message in self.messages.values() {
            if message.handle.offset % 8 != 0 {
                return false;
            }
            if self.initialized && message.handle.end() > arena_bits {
                return false;
            }
            for signal in &message.signals {
                if signal.handle.offset < message.handle.offset
                    || signal.handle.end() > message.handle.end()
                {
                    return false;
                }
            }
        }
        true
    }

    /// Run `f` over the raw backing bytes of the arena, under the lock.
    /// This is the hook the external SD snapshot logger consumes.
    pub fn raw_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.arena.lock(|cell| f(cell.borrow().as_bytes()))
    }
}

impl<D: CanDriver> Drop for CanBus<'_, D> {
    fn drop(&mut self) {
        if self.initialized {
            self.driver.uninstall();
        }
    }
}
