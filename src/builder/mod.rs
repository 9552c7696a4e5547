//! Recursive-descent compiler for the telemetry configuration language.
//!
//! Consumes the token stream and produces the global options plus a populated
//! bus, validating message ids, bit-fit, duplicates, and signal overlap as it
//! goes. Compilation is fail-fast: the first violation aborts the build with
//! a descriptive error naming the offending board, message, or signal, so
//! the config file can be fixed without reading source. Messages validated
//! before the failure stay registered on the bus; callers must treat a
//! failed build as leaving the bus in a partial state and must not proceed
//! to initialization.
//!
//! Grammar (informal EBNF):
//!
//! ```text
//! config   := option* board+
//! option   := "!!" IDENT INT
//! board    := ">" IDENT message+
//! message  := ">>" IDENT HEXINT INT signal+
//! signal   := ">>>" IDENT IDENT INT INT NUMBER NUMBER
//!             [ "signed"|"unsigned" ] [ "big"|"little" ] enum_entry*
//! enum_entry := ">>>>" IDENT INT
//! ```
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::bus::driver::CanDriver;
use crate::bus::CanBus;
use crate::core::{Endianness, FrameType, MessageDescriptor, SignalDescriptor, TelemetryOptions};
use crate::error::BuildError;

pub mod reader;
pub mod tokenizer;

use reader::WordReader;
use tokenizer::{Token, Tokenizer};

/// Describes one global option: its name and how to apply its value.
struct OptionDescriptor {
    name: &'static str,
    apply: fn(&mut TelemetryOptions, i64),
}

fn set_log_period(options: &mut TelemetryOptions, value: i64) {
    options.log_period_ms = value as u16;
}

fn set_wireless_period(options: &mut TelemetryOptions, value: i64) {
    options.wireless_period_ms = value as u16;
}

const OPTION_TABLE: [OptionDescriptor; 2] = [
    OptionDescriptor {
        name: "logPeriodMs",
        apply: set_log_period,
    },
    OptionDescriptor {
        name: "wirelessPeriodMs",
        apply: set_wireless_period,
    },
];

/// Compiles a configuration source into `(TelemetryOptions, populated bus)`.
pub struct TelemetryBuilder<R: WordReader> {
    tokenizer: Tokenizer<R>,
}

impl<R: WordReader> TelemetryBuilder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            tokenizer: Tokenizer::new(reader),
        }
    }

    /// Parse the entire configuration stream, registering every validated
    /// message on `bus` and returning the global options.
    ///
    /// The tokenizer is started before parsing and ended exactly once, on
    /// the success path and every error path alike.
    pub fn build<D: CanDriver>(
        mut self,
        bus: &mut CanBus<'_, D>,
    ) -> Result<TelemetryOptions, BuildError> {
        if !self.tokenizer.start() {
            return Err(BuildError::TokenizerStart);
        }
        let result = self.parse(bus);
        self.tokenizer.end();
        result
    }

    fn parse<D: CanDriver>(
        &mut self,
        bus: &mut CanBus<'_, D>,
    ) -> Result<TelemetryOptions, BuildError> {
        let mut options = TelemetryOptions::default();

        // Phase 1: global options.
        while matches!(self.tokenizer.peek(), Some(Token::OptionPrefix)) {
            self.parse_option(&mut options)?;
        }

        // Phase 2: boards.
        let mut saw_board = false;
        loop {
            match self.tokenizer.peek() {
                None => break,
                Some(Token::BoardPrefix) => {
                    saw_board = true;
                    self.parse_board(bus)?;
                }
                Some(_) => return Err(BuildError::UnexpectedTopLevel),
            }
        }
        if !saw_board {
            return Err(BuildError::NoBoardDefined);
        }
        Ok(options)
    }

    /// Consume the next token if it is an identifier, resolving its text.
    fn ident(&mut self) -> Option<String> {
        match self.tokenizer.peek() {
            Some(Token::Ident(handle)) => {
                self.tokenizer.next();
                Some(self.tokenizer.pool().get(handle).to_string())
            }
            _ => None,
        }
    }

    /// Consume the next token if it is numeric (integer or float).
    fn number(&mut self) -> Option<f64> {
        match self.tokenizer.peek() {
            Some(Token::Int(value)) => {
                self.tokenizer.next();
                Some(value as f64)
            }
            Some(Token::Float(value)) => {
                self.tokenizer.next();
                Some(value)
            }
            _ => None,
        }
    }

    /// Consume the next token if it is exactly one of two literal words,
    /// reporting which one matched.
    fn eat_keyword(&mut self, first: &str, second: &str) -> Option<bool> {
        if let Some(Token::Ident(handle)) = self.tokenizer.peek() {
            let word = self.tokenizer.pool().get(handle);
            let matched = if word == first {
                Some(true)
            } else if word == second {
                Some(false)
            } else {
                None
            };
            if matched.is_some() {
                self.tokenizer.next();
            }
            return matched;
        }
        None
    }

    fn parse_option(&mut self, options: &mut TelemetryOptions) -> Result<(), BuildError> {
        self.tokenizer.next(); // consume '!!'

        let name = self.ident().ok_or(BuildError::MalformedOption)?;
        let value = match self.tokenizer.next() {
            Some(Token::Int(value)) => value,
            _ => return Err(BuildError::MalformedOption),
        };

        for option in &OPTION_TABLE {
            if option.name == name {
                (option.apply)(options, value);
                return Ok(());
            }
        }
        Err(BuildError::UnknownOption { name })
    }

    fn parse_board<D: CanDriver>(&mut self, bus: &mut CanBus<'_, D>) -> Result<(), BuildError> {
        self.tokenizer.next(); // consume '>'

        let board = self.ident().ok_or(BuildError::ExpectedBoardName)?;

        let mut has_message = false;
        while matches!(self.tokenizer.peek(), Some(Token::MessagePrefix)) {
            has_message = true;
            self.tokenizer.next(); // consume '>>'

            let descriptor = self.parse_message()?;
            if bus.message(descriptor.id).is_some() {
                return Err(BuildError::DuplicateMessageId {
                    message: descriptor.name,
                    id: descriptor.id,
                });
            }
            let name = descriptor.name.clone();
            bus.add_message(descriptor)
                .map_err(|source| BuildError::Bus { message: name, source })?;
        }

        if !has_message {
            return Err(BuildError::BoardWithoutMessages { board });
        }
        Ok(())
    }

    fn parse_message(&mut self) -> Result<MessageDescriptor, BuildError> {
        let name = self.ident().ok_or(BuildError::ExpectedMessageName)?;

        let id = match self.tokenizer.next() {
            Some(Token::HexInt(value)) => value,
            _ => return Err(BuildError::ExpectedMessageId { message: name }),
        };
        let length = match self.tokenizer.next() {
            Some(Token::Int(value)) if (0..=255).contains(&value) => value as u8,
            _ => return Err(BuildError::ExpectedMessageLength { message: name }),
        };
        if id > 0x7FF {
            return Err(BuildError::MessageIdOutOfRange { message: name, id });
        }

        let capacity = length as usize * 8;
        let mut signals: Vec<SignalDescriptor> = Vec::new();
        while matches!(self.tokenizer.peek(), Some(Token::SignalPrefix)) {
            self.tokenizer.next(); // consume '>>>'

            let signal = self.parse_signal()?;

            let start = signal.start_bit as usize;
            let end = start + signal.length as usize;
            if end > capacity {
                return Err(BuildError::SignalOverrun {
                    message: name,
                    signal: signal.name,
                    start,
                    end,
                    capacity,
                });
            }
            for other in &signals {
                let other_start = other.start_bit as usize;
                let other_end = other_start + other.length as usize;
                if start < other_end && other_start < end {
                    return Err(BuildError::SignalOverlap {
                        message: name,
                        signal: signal.name,
                        other: other.name.clone(),
                    });
                }
            }
            signals.push(signal);

            self.skip_enum_entries()?;
        }

        if signals.is_empty() {
            return Err(BuildError::MessageWithoutSignals { message: name });
        }
        Ok(MessageDescriptor {
            name,
            id: id as u32,
            length,
            frame_type: FrameType::Standard,
            signals,
            on_receive: None,
        })
    }

    fn parse_signal(&mut self) -> Result<SignalDescriptor, BuildError> {
        let name = self.ident().ok_or(BuildError::ExpectedSignalName)?;

        // Type hint is advisory: layout comes from the explicit bit length.
        let _type_hint = self
            .ident()
            .ok_or_else(|| BuildError::ExpectedSignalType { signal: name.clone() })?;

        let start_bit = match self.tokenizer.next() {
            Some(Token::Int(value)) if (0..=255).contains(&value) => value as u8,
            _ => return Err(BuildError::ExpectedSignalStartBit { signal: name }),
        };
        let length = match self.tokenizer.next() {
            Some(Token::Int(value)) => {
                if !(1..=64).contains(&value) {
                    return Err(BuildError::InvalidSignalLength {
                        signal: name,
                        length: value,
                    });
                }
                value as u8
            }
            _ => return Err(BuildError::ExpectedSignalLength { signal: name }),
        };
        let factor = self
            .number()
            .ok_or_else(|| BuildError::ExpectedSignalFactor { signal: name.clone() })?;
        let offset = self
            .number()
            .ok_or_else(|| BuildError::ExpectedSignalOffset { signal: name.clone() })?;

        // Optional trailing overrides, peeked and consumed only on match.
        let mut is_signed = false;
        if let Some(signed) = self.eat_keyword("signed", "unsigned") {
            is_signed = signed;
        }
        let mut endianness = Endianness::Little;
        if let Some(big) = self.eat_keyword("big", "little") {
            endianness = if big { Endianness::Big } else { Endianness::Little };
        }

        Ok(SignalDescriptor {
            name,
            start_bit,
            length,
            is_signed,
            endianness,
            factor,
            offset,
            minimum: 0.0,
            maximum: 0.0,
        })
    }

    /// Enum entries annotate the preceding signal for display tooling; the
    /// runtime layout ignores them beyond shape-checking.
    fn skip_enum_entries(&mut self) -> Result<(), BuildError> {
        while matches!(self.tokenizer.peek(), Some(Token::EnumPrefix)) {
            self.tokenizer.next(); // consume '>>>>'
            if self.ident().is_none() {
                return Err(BuildError::MalformedEnumEntry);
            }
            match self.tokenizer.next() {
                Some(Token::Int(_)) | Some(Token::HexInt(_)) => {}
                _ => return Err(BuildError::MalformedEnumEntry),
            }
        }
        Ok(())
    }
}
