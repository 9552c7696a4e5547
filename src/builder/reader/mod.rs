//! Word-granular input readers feeding the tokenizer.
//!
//! The tokenizer never materializes the whole token list, so it pulls the
//! configuration text one whitespace-delimited word at a time through this
//! contract. The in-memory reader ships with the crate; storage-backed
//! streaming readers (for devices that must not slurp the file) are external
//! collaborators implementing the same trait.

/// Abstract interface for streaming through a configuration source
/// word-by-word.
pub trait WordReader {
    /// Prepare for reading (open a file, rewind a buffer...).
    /// Returns `false` when the source is unavailable.
    fn start(&mut self) -> bool;

    /// The next whitespace-delimited word, without consuming it.
    /// `None` once the input is exhausted.
    fn peek_word(&mut self) -> Option<&str>;

    /// Advance the cursor past the next word.
    /// Returns `false` when the input ran out instead.
    fn move_word(&mut self) -> bool;

    /// Consume input through the next line terminator (comment handling).
    fn eat_line(&mut self);

    /// Finish and release the source.
    fn end(&mut self);
}

/// In-memory reader over a borrowed string, used for tests and native builds.
pub struct MemoryReader<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.content[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

impl WordReader for MemoryReader<'_> {
    fn start(&mut self) -> bool {
        self.pos = 0;
        true
    }

    fn peek_word(&mut self) -> Option<&str> {
        self.skip_whitespace();
        let rest = &self.content[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    fn move_word(&mut self) -> bool {
        self.skip_whitespace();
        let rest = &self.content[self.pos..];
        if rest.is_empty() {
            return false;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += end;
        true
    }

    fn eat_line(&mut self) {
        match self.content[self.pos..].find('\n') {
            Some(index) => self.pos += index + 1,
            None => self.pos = self.content.len(),
        }
    }

    fn end(&mut self) {
        self.pos = 0;
    }
}

//==================================================================================TEST_READER
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
