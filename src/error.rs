//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (storage bounds, bus state
//! machine, driver installation and transmission, configuration compilation).
use alloc::string::String;
use thiserror_no_std::Error;

//==================================================================================BIT_BUFFER
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised by bit-granular arena access.
pub enum BitBufferError {
    /// The handle reaches past the end of the arena.
    #[error("Out of bounds -> {asked} bits at offset {offset}, buffer holds {available}")]
    OutOfBounds {
        offset: usize,
        asked: usize,
        available: usize,
    },
    /// Read through a zero-sized handle yields no value.
    #[error("Zero-sized handle")]
    EmptyHandle,
    /// Raw container access wider than the 64-bit transfer type.
    #[error("Cannot transfer more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: usize },
    /// The caller's byte buffer cannot hold the handle's bit span.
    #[error("Byte buffer too small: need {need} bytes, got {got}")]
    BufferTooSmall { need: usize, got: usize },
}

//==================================================================================BUS
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building the message schema on the bus.
pub enum BusError {
    /// `add_message` after `initialize()`: the schema is frozen.
    #[error("Schema is frozen: cannot add messages after initialization")]
    SchemaFrozen,
    /// A message with this identifier is already registered.
    #[error("Duplicate message id {id:#x}")]
    DuplicateMessage { id: u32 },
    /// Classic CAN payloads carry at most eight bytes.
    #[error("Message {id:#x} payload of {length} bytes exceeds 8")]
    MessageTooLong { id: u32, length: u8 },
    /// A standard-frame identifier must stay at or below `0x7FF`.
    #[error("Message id {id:#x} out of standard-frame range")]
    IdOutOfRange { id: u32 },
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised by the one-way `BUILDING -> INITIALIZED` transition.
pub enum InitError<E: core::fmt::Debug> {
    /// `initialize()` called twice.
    #[error("Bus is already initialized")]
    AlreadyInitialized,
    /// The transport refused installation.
    #[error("CAN driver install error: {0:?}")]
    Driver(E),
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised when snapshotting and transmitting a message.
pub enum SendError<E: core::fmt::Debug> {
    /// No message registered under this identifier.
    #[error("No message registered for id {id:#x}")]
    UnknownMessage { id: u32 },
    /// The message region could not be read from the arena.
    #[error("Storage error: {0}")]
    Storage(#[from] BitBufferError),
    /// The transport refused or failed the transmission.
    #[error("CAN driver send error: {0:?}")]
    Driver(E),
}

//==================================================================================BUILDER
#[derive(Error, Debug, Clone, PartialEq)]
/// First failure encountered while compiling the configuration text.
/// The build aborts immediately; messages already registered stay on the bus.
pub enum BuildError {
    /// The underlying word reader refused to start.
    #[error("Failed to start tokenizer")]
    TokenizerStart,
    /// A global option line is not `!! <name> <int>`.
    #[error("Malformed global option: expected '!! <name> <int>'")]
    MalformedOption,
    /// The option name is not in the lookup table.
    #[error("Unknown option: {name}")]
    UnknownOption { name: String },
    /// `>` must be followed by a board identifier.
    #[error("Expected board name after '>'")]
    ExpectedBoardName,
    /// Only options, boards, and end of input are valid at the top level.
    /// This also covers a signal or message line with no enclosing context.
    #[error("Unexpected token at top level; expected '>' or end of input")]
    UnexpectedTopLevel,
    /// A configuration must define at least one board.
    #[error("No board defined")]
    NoBoardDefined,
    /// A board must define at least one message.
    #[error("Board {board} has no messages")]
    BoardWithoutMessages { board: String },
    /// `>>` must be followed by a message identifier.
    #[error("Expected message name after '>>'")]
    ExpectedMessageName,
    /// The message header is missing its hex CAN id.
    #[error("Message {message}: expected hex id (0x...)")]
    ExpectedMessageId { message: String },
    /// The message header is missing its integer byte length.
    #[error("Message {message}: expected integer byte length")]
    ExpectedMessageLength { message: String },
    /// Standard-frame CAN ids are 11 bits.
    #[error("Message {message}: id {id:#x} out of range 0x000-0x7FF")]
    MessageIdOutOfRange { message: String, id: u64 },
    /// Each CAN id may be defined once per build.
    #[error("Message {message}: duplicate id {id:#x}")]
    DuplicateMessageId { message: String, id: u32 },
    /// A message must define at least one signal.
    #[error("Message {message} has no signals")]
    MessageWithoutSignals { message: String },
    /// `>>>` must be followed by a signal identifier.
    #[error("Expected signal name after '>>>'")]
    ExpectedSignalName,
    /// The signal line is missing its type hint identifier.
    #[error("Signal {signal}: expected type identifier")]
    ExpectedSignalType { signal: String },
    /// The signal line is missing its integer start bit.
    #[error("Signal {signal}: expected integer start bit")]
    ExpectedSignalStartBit { signal: String },
    /// The signal line is missing its integer bit length.
    #[error("Signal {signal}: expected integer bit length")]
    ExpectedSignalLength { signal: String },
    /// Signal widths must fit the 64-bit raw container.
    #[error("Signal {signal}: bit length {length} outside 1-64")]
    InvalidSignalLength { signal: String, length: i64 },
    /// The signal line is missing its numeric factor.
    #[error("Signal {signal}: expected numeric factor")]
    ExpectedSignalFactor { signal: String },
    /// The signal line is missing its numeric offset.
    #[error("Signal {signal}: expected numeric offset")]
    ExpectedSignalOffset { signal: String },
    /// The signal reaches past the message payload.
    #[error("Signal {signal} overruns message {message}: bits {start}..{end} exceed {capacity}")]
    SignalOverrun {
        message: String,
        signal: String,
        start: usize,
        end: usize,
        capacity: usize,
    },
    /// Two signals of the same message claim the same bits.
    #[error("Signal {signal} overlaps signal {other} in message {message}")]
    SignalOverlap {
        message: String,
        signal: String,
        other: String,
    },
    /// An enum entry line is not `>>>> <name> <int>`.
    #[error("Malformed enum entry: expected '>>>> <name> <int>'")]
    MalformedEnumEntry,
    /// The bus rejected a validated message (frozen schema, duplicate id...).
    #[error("Bus rejected message {message}: {source}")]
    Bus { message: String, source: BusError },
}
