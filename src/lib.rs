//! `can-telem` library: a CAN-bus signal database (DBC-like) runtime for
//! embedded telemetry in a `no_std` environment. The crate exposes the
//! bit-level storage arena, the bus runtime (messages, signals, typed codec,
//! driver boundary), and the text-configuration compiler (tokenizer and
//! recursive-descent builder).
#![no_std]

extern crate alloc;

//==================================================================================
/// Core data types shared by the configuration builder and the bus runtime.
pub mod core;
/// Domain and low-level errors (storage bounds, bus state machine,
/// configuration compilation, and related issues).
pub mod error;
/// Low-level infrastructure: the bit-addressable storage arena.
pub mod infra;
/// CAN database runtime: message and signal records, the signal value codec,
/// the transport driver boundary, and the raw wire frame.
pub mod bus;
/// Text-configuration compiler: word readers, tokenizer, identifier pool,
/// and the telemetry builder.
pub mod builder;
//==================================================================================
