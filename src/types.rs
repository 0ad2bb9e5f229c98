//! This module defines the core data structures, constants and error types shared by the
//! Turing machine simulator, the binarizer, the tag-system compiler and the canonical rewriter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Rule;

/// The default blank symbol used on a Turing machine tape.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// Number of blank cells a tape holds right after a reset. The head starts in the middle.
pub const TAPE_PADDING: usize = 100;
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// Bit symbols of a binarized machine. `BINARY_BLANK` doubles as its blank.
pub const BINARY_BLANK: char = '0';
pub const BINARY_ONE: char = '1';

/// Halting marker of compiled two-tag systems.
pub const HALTING_MARKER: &str = "#";
/// Halting marker of text-defined tag systems (`a3 -> *`).
pub const TEXT_HALTING_MARKER: &str = "*";
/// Empty right-hand side of a text-defined tag production (`X -> _`).
pub const EMPTY_PRODUCTION: &str = "_";
/// Filler symbol interleaved with state symbols in a compiled tag word.
pub const SEPARATOR: &str = "x";
/// Label given to transition targets that land in an accept state.
pub const HALT_LABEL: &str = "HALT";
/// Label of the synthetic state that enters the real start state.
pub const INIT_LABEL: &str = "INIT";

/// A state of a Turing machine.
pub type State = String;

/// Represents the possible directions a Turing machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Parses the single-letter form used by definition files.
    pub fn parse(input: &str) -> Result<Self, ConstructionError> {
        match input {
            "L" | "<" => Ok(Direction::Left),
            "R" | ">" => Ok(Direction::Right),
            other => Err(ConstructionError::UnsupportedDirection(other.to_string())),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

/// Represents the outcome of a single execution step of any engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The engine performed a step and can continue.
    Continue,
    /// The engine reached a terminal configuration.
    Halt,
}

/// Terminal outcome of a Turing machine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The machine entered an accept state.
    Accept,
    /// No transition was defined for the current state and symbol.
    Reject,
}

/// Errors raised while building a transition table, a rule set or a pattern.
///
/// These are always reported before execution starts; a table that was built
/// successfully is trusted by the engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// Two transitions share the same `(state, symbol)` key.
    #[error("Duplicate transition for state {state} reading {symbol:?}")]
    DuplicateTransition { state: State, symbol: char },
    /// Two production rules share the same left-hand symbol.
    #[error("Duplicate production for symbol {0}")]
    DuplicateProduction(String),
    /// A transition of a machine handed to the tag compiler writes a non-binary symbol.
    #[error("Transition from state {state} writes non-binary symbol {symbol:?}")]
    NonBinaryWrite { state: State, symbol: char },
    /// A direction other than `L` or `R`.
    #[error("Unsupported direction: {0}")]
    UnsupportedDirection(String),
    /// Two generated sub-states ended up with the same name.
    #[error("State name {0} is generated twice")]
    StateCollision(State),
    /// A state that was not declared in the state list.
    #[error("Undefined state: {0}")]
    UndefinedState(State),
    /// A symbol that is not part of the declared alphabet.
    #[error("Undefined symbol: {0:?}")]
    UndefinedSymbol(String),
    /// The blank symbol is not part of the tape alphabet.
    #[error("Blank symbol {0:?} is not in the tape alphabet")]
    MissingBlank(char),
    /// The tag compiler only accepts two-symbol machines.
    #[error("Machine has {0} tape symbols, expected exactly 2")]
    NotBinary(usize),
    /// The binarizer needs at least two tape symbols.
    #[error("Machine has {0} tape symbols, expected at least 2")]
    TooFewSymbols(usize),
    /// A production string that is not of the form `lhs -> rhs`.
    #[error("Malformed production: {0}")]
    MalformedProduction(String),
    /// A template references a variable its pattern never binds.
    #[error("Variable {0} is not bound by the pattern")]
    UnboundVariable(String),
    /// The cell left of the head must be blank to host the synthetic start state.
    #[error("Tape cannot be encoded: the cell left of the head is not blank")]
    UnencodableTape,
    /// The encoded word would need more repetitions than the engine can hold.
    #[error("Tape has {bits} significant bits, at most {max} can be encoded")]
    TapeTooLong { bits: usize, max: usize },
    /// A required section of a definition file is absent.
    #[error("Missing '{0}' section")]
    MissingSection(String),
}

/// Errors raised while decoding a tag word or a binarized tape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Word is empty")]
    Empty,
    #[error("Word has odd length {0}")]
    OddLength(usize),
    #[error("Expected separator at position {0}")]
    MissingSeparator(usize),
    #[error("Word ends before the right tape block")]
    Truncated,
    #[error("Unexpected symbol {symbol} at position {position}")]
    UnexpectedSymbol { position: usize, symbol: String },
    #[error("Bit block {0} does not map to any symbol")]
    UnknownBlock(String),
}

/// Represents the errors surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A table, rule set or pattern could not be built.
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),
    /// A compiled tag system has no production for a symbol it reached.
    #[error("No production defined for symbol {0}")]
    UndefinedProduction(String),
    /// A word or tape did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Indicates an error during the parsing of a machine definition or a production.
    #[error("Parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left = Direction::Left;
        let right = Direction::Right;

        let left_json = serde_json::to_string(&left).unwrap();
        let right_json = serde_json::to_string(&right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left_deserialized: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, left_deserialized);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("L"), Ok(Direction::Left));
        assert_eq!(Direction::parse(">"), Ok(Direction::Right));
        assert_eq!(
            Direction::parse("S"),
            Err(ConstructionError::UnsupportedDirection("S".to_string()))
        );
    }

    #[test]
    fn test_error_display() {
        let error: Error = ConstructionError::DuplicateProduction("A_q0_0".to_string()).into();

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Construction error"));
        assert!(error_msg.contains("A_q0_0"));
    }
}
