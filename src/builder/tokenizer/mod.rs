//! Lexical analysis of the telemetry configuration language.
//!
//! Words arrive from a [`WordReader`] and leave as typed tokens, pulled
//! lazily one at a time; the sequence is finite and non-restartable, with end
//! of input signaled by `None`. Identifier text is interned into an
//! append-only pool whose handles stay valid for the tokenizer's lifetime.
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::builder::reader::WordReader;

/// Handle representing an interned identifier. Indices are never
/// invalidated once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdentHandle(pub usize);

/// Interns identifier strings to provide stable, pooled storage for the
/// duration of a parse.
#[derive(Debug, Default)]
pub struct IdentifierPool {
    pool: Vec<String>,
}

impl IdentifierPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a copy of `text` into the pool.
    pub fn intern(&mut self, text: &str) -> IdentHandle {
        self.pool.push(text.to_string());
        IdentHandle(self.pool.len() - 1)
    }

    /// Retrieve the text for a handle; an unknown handle yields the empty
    /// string rather than a panic.
    pub fn get(&self, handle: IdentHandle) -> &str {
        self.pool.get(handle.0).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

/// A single lexical token of the configuration language.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// `!!` global option marker.
    OptionPrefix,
    /// `>` board (config scope) marker.
    BoardPrefix,
    /// `>>` message marker.
    MessagePrefix,
    /// `>>>` signal marker.
    SignalPrefix,
    /// `>>>>` enum-entry marker.
    EnumPrefix,
    /// Hexadecimal literal (`0x...`).
    HexInt(u64),
    /// Decimal integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Identifier, interned into the pool.
    Ident(IdentHandle),
}

// Prefix table, longest first.
const PREFIXES: [(&str, Token); 5] = [
    (">>>>", Token::EnumPrefix),
    (">>>", Token::SignalPrefix),
    ("!!", Token::OptionPrefix),
    (">>", Token::MessagePrefix),
    (">", Token::BoardPrefix),
];

/// Tokenizer: turns whitespace-delimited words into [`Token`] values.
pub struct Tokenizer<R: WordReader> {
    reader: R,
    pool: IdentifierPool,
    peeked: Option<Token>,
}

impl<R: WordReader> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pool: IdentifierPool::new(),
            peeked: None,
        }
    }

    /// Initialize the underlying reader. Must succeed before [`Self::next`].
    pub fn start(&mut self) -> bool {
        self.reader.start()
    }

    /// Release reader resources. Call exactly once, on success and error
    /// paths alike.
    pub fn end(&mut self) {
        self.reader.end();
    }

    /// The interned identifier texts produced so far.
    pub fn pool(&self) -> &IdentifierPool {
        &self.pool
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Option<Token> {
        if self.peeked.is_none() {
            self.peeked = self.lex();
        }
        self.peeked
    }

    /// Retrieve the next token, or `None` at end of input.
    pub fn next(&mut self) -> Option<Token> {
        match self.peeked.take() {
            Some(token) => Some(token),
            None => self.lex(),
        }
    }

    fn lex(&mut self) -> Option<Token> {
        loop {
            // The word is copied out so the reader can advance while we
            // classify it.
            let word = String::from(self.reader.peek_word()?);

            // Words starting with '#' comment out the rest of the line.
            if word.starts_with('#') {
                self.reader.eat_line();
                continue;
            }

            for (text, token) in PREFIXES {
                if word == text {
                    self.reader.move_word();
                    return Some(token);
                }
            }

            // Most specific numeric grammar first; a parse only counts when
            // it consumes the entire word.
            if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
                if let Ok(value) = u64::from_str_radix(hex, 16) {
                    self.reader.move_word();
                    return Some(Token::HexInt(value));
                }
            }
            if let Ok(value) = word.parse::<i64>() {
                self.reader.move_word();
                return Some(Token::Int(value));
            }
            if let Ok(value) = word.parse::<f64>() {
                self.reader.move_word();
                return Some(Token::Float(value));
            }

            // Fallback: identifier.
            let handle = self.pool.intern(&word);
            self.reader.move_word();
            return Some(Token::Ident(handle));
        }
    }
}
