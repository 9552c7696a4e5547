//! Unit tests for the in-memory word reader.
use super::*;

#[test]
/// Peeking never advances; moving consumes exactly one word.
fn test_peek_then_move() {
    let mut reader = MemoryReader::new("  alpha\tbeta\n gamma");
    assert!(reader.start());
    assert_eq!(reader.peek_word(), Some("alpha"));
    assert_eq!(reader.peek_word(), Some("alpha"));
    assert!(reader.move_word());
    assert_eq!(reader.peek_word(), Some("beta"));
    assert!(reader.move_word());
    assert_eq!(reader.peek_word(), Some("gamma"));
    assert!(reader.move_word());
    assert_eq!(reader.peek_word(), None);
    assert!(!reader.move_word());
}

#[test]
/// `eat_line` discards the rest of the current line only.
fn test_eat_line() {
    let mut reader = MemoryReader::new("# a comment line\nnext words");
    assert!(reader.start());
    assert_eq!(reader.peek_word(), Some("#"));
    reader.eat_line();
    assert_eq!(reader.peek_word(), Some("next"));
}

#[test]
/// `eat_line` on the final line exhausts the input.
fn test_eat_last_line() {
    let mut reader = MemoryReader::new("# trailing comment without newline");
    assert!(reader.start());
    reader.eat_line();
    assert_eq!(reader.peek_word(), None);
}

#[test]
/// Empty and whitespace-only input yields no words.
fn test_empty_input() {
    let mut reader = MemoryReader::new("   \n\t  ");
    assert!(reader.start());
    assert_eq!(reader.peek_word(), None);
    assert!(!reader.move_word());
}
