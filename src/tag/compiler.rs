//! Cocke–Minsky compilation of a binary Turing machine into a two-tag system.
//!
//! A configuration with label `q` is the word `A_q x (a_q x)^m B_q x (b_q x)^n`, where `m`
//! is the tape left of the head read as a binary number with its least significant bit next
//! to the head, `n` is the tape right of the head in the same way, and the last character of
//! `q` is the scanned bit. Every transition becomes 16 (moving right) or 18 (moving left)
//! productions that rewrite one such word into the next.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use super::system::{TagSystem, TagWord};
use super::templates::{self, Template};
use crate::analyzer::analyze;
use crate::machine::{MachineDefinition, TransitionTable};
use crate::types::{
    ConstructionError, DecodeError, Direction, Error, HALTING_MARKER, HALT_LABEL, INIT_LABEL,
    SEPARATOR,
};

/// Largest number of significant bits on either side of the head that can be encoded.
pub const MAX_ENCODED_BITS: usize = 24;

/// Where a compiled transition leads once the next scanned bit is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Target {
    /// The composite state `{state}_{bit}`.
    State(String),
    /// An accept state was entered; the bit is the one under the head.
    Halt(bool),
}

impl Target {
    pub fn label(&self) -> String {
        match self {
            Target::State(label) => label.clone(),
            Target::Halt(bit) => format!("{HALT_LABEL}_{}", u8::from(*bit)),
        }
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Target::Halt(_))
    }
}

/// A machine transition restated over composite labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTransition {
    pub source: String,
    pub write: bool,
    pub direction: Direction,
    /// Targets for a next scanned bit of 0 and 1.
    pub targets: [Target; 2],
}

impl TagTransition {
    /// The productions simulating this transition.
    fn productions(&self) -> impl Iterator<Item = (String, Vec<String>)> + '_ {
        let moves = match self.direction {
            Direction::Right => templates::RIGHT,
            Direction::Left => templates::LEFT,
        };

        moves
            .iter()
            .chain(templates::DISPATCH)
            .map(move |template| self.instantiate(template))
    }

    fn instantiate(&self, template: &Template) -> (String, Vec<String>) {
        let rhs = template.rhs[usize::from(self.write)]
            .split_whitespace()
            .map(|token| self.expand(token))
            .collect();

        (self.expand(template.lhs), rhs)
    }

    fn expand(&self, token: &str) -> String {
        if let Some(tag) = token.strip_suffix('$') {
            return format!("{tag}_{}", self.source);
        }

        match token.split_once('!') {
            Some((tag, bit)) => {
                let target = &self.targets[usize::from(bit == "1")];
                if tag == "A" && target.is_halt() {
                    HALTING_MARKER.to_string()
                } else {
                    format!("{tag}_{}", target.label())
                }
            }
            None => token.to_string(),
        }
    }
}

/// A tag system produced by [`TagCompiler::compile`], together with the symbol mapping
/// needed to move tapes in and out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledTagSystem {
    system: TagSystem,
    transitions: Vec<TagTransition>,
    blank: char,
    mark: char,
}

impl CompiledTagSystem {
    pub fn system(&self) -> &TagSystem {
        &self.system
    }

    pub fn transitions(&self) -> &[TagTransition] {
        &self.transitions
    }

    /// The machine symbol standing for bit 0.
    pub fn blank(&self) -> char {
        self.blank
    }

    /// The machine symbol standing for bit 1.
    pub fn mark(&self) -> char {
        self.mark
    }

    /// Encodes a tape whose first symbol is under the head, with blanks to its left.
    pub fn encode_tape(&self, tape: &str) -> Result<TagWord, ConstructionError> {
        let bits = tape
            .chars()
            .map(|symbol| match symbol {
                s if s == self.mark => Ok(true),
                s if s == self.blank => Ok(false),
                s => Err(ConstructionError::UndefinedSymbol(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        encode_configuration(&[], &bits)
    }

    /// Renders a decoded tape with the machine's own symbols, trimming blanks.
    pub fn render(&self, tape: &DecodedTape) -> String {
        tape.bits()
            .into_iter()
            .map(|bit| if bit == '1' { self.mark } else { self.blank })
            .collect::<String>()
            .trim_matches(self.blank)
            .to_string()
    }
}

/// Compiles binary Turing machines into two-tag systems.
pub struct TagCompiler;

impl TagCompiler {
    /// Compiles a machine over exactly two tape symbols.
    ///
    /// The blank stands for bit 0 and the other symbol for bit 1.
    pub fn compile(definition: &MachineDefinition) -> Result<CompiledTagSystem, Error> {
        let mut symbols = definition.tape_symbols.clone();
        symbols.sort_unstable();
        symbols.dedup();
        if symbols.len() != 2 {
            return Err(ConstructionError::NotBinary(symbols.len()).into());
        }

        let blank = definition.blank;
        let mark = match symbols.iter().find(|&&s| s != blank) {
            Some(&mark) if symbols.contains(&blank) => mark,
            _ => return Err(ConstructionError::MissingBlank(blank).into()),
        };

        if let Some(t) = definition
            .transitions
            .iter()
            .find(|t| t.write != blank && t.write != mark)
        {
            return Err(ConstructionError::NonBinaryWrite {
                state: t.state.clone(),
                symbol: t.write,
            }
            .into());
        }

        analyze(definition)?;
        TransitionTable::new(&definition.transitions)?;

        if let Some(state) = definition
            .states
            .iter()
            .find(|s| s.as_str() == HALT_LABEL && !definition.is_accepting(s))
        {
            return Err(ConstructionError::StateCollision(state.clone()).into());
        }

        let target = |state: &str, bit: bool| {
            if definition.is_accepting(state) {
                Target::Halt(bit)
            } else {
                Target::State(composite(state, bit))
            }
        };

        let mut transitions: Vec<TagTransition> = definition
            .transitions
            .iter()
            .filter(|t| !definition.is_accepting(&t.state))
            .map(|t| TagTransition {
                source: composite(&t.state, t.read == mark),
                write: t.write == mark,
                direction: t.direction,
                targets: [target(&t.next_state, false), target(&t.next_state, true)],
            })
            .collect();

        // Writes a blank left of the real head, then scans into the start state.
        transitions.push(TagTransition {
            source: INIT_LABEL.to_string(),
            write: false,
            direction: Direction::Right,
            targets: [
                target(&definition.start_state, false),
                target(&definition.start_state, true),
            ],
        });

        let mut system = TagSystem::new(HALTING_MARKER);
        for transition in &transitions {
            for (lhs, rhs) in transition.productions() {
                system.insert(lhs, rhs)?;
            }
        }

        info!(
            machine = %definition.name,
            transitions = transitions.len(),
            productions = system.len(),
            "compiled tag system"
        );

        Ok(CompiledTagSystem {
            system,
            transitions,
            blank,
            mark,
        })
    }
}

fn composite(state: &str, bit: bool) -> String {
    format!("{state}_{}", u8::from(bit))
}

/// Encodes a configuration of the synthetic start state.
///
/// `left` holds the cells left of the head and `right` the head cell and everything after
/// it, both in tape order. The cell immediately left of the head is where the start state is
/// entered from, so it must be blank.
pub fn encode_configuration(left: &[bool], right: &[bool]) -> Result<TagWord, ConstructionError> {
    let outer = match left.split_last() {
        Some((true, _)) => return Err(ConstructionError::UnencodableTape),
        Some((false, rest)) => rest,
        None => &[],
    };

    let m = binary_value(outer.iter().copied())?;
    let n = binary_value(right.iter().rev().copied())?;
    debug!(m, n, "encoding configuration");

    let symbol = |tag: &str| format!("{tag}_{INIT_LABEL}");
    let mut word = Vec::with_capacity(4 + 2 * (m + n));
    let mut push = |symbol: String, times: usize| {
        for _ in 0..times {
            word.push(symbol.clone());
            word.push(SEPARATOR.to_string());
        }
    };

    push(symbol("A"), 1);
    push(symbol("a"), m);
    push(symbol("B"), 1);
    push(symbol("b"), n);

    Ok(TagWord::new(word))
}

/// Reads bits most significant first.
fn binary_value(bits: impl Iterator<Item = bool>) -> Result<usize, ConstructionError> {
    let bits: Vec<bool> = bits.skip_while(|&bit| !bit).collect();
    if bits.len() > MAX_ENCODED_BITS {
        return Err(ConstructionError::TapeTooLong {
            bits: bits.len(),
            max: MAX_ENCODED_BITS,
        });
    }

    Ok(bits
        .into_iter()
        .fold(0, |value, bit| (value << 1) | usize::from(bit)))
}

/// A tape recovered from a tag word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTape {
    /// Label of the configuration, `HALT_r` once the machine accepted.
    pub label: String,
    /// Whether the word starts with the halting marker.
    pub halted: bool,
    /// Bits left of the head, without leading zeros.
    pub left: String,
    /// The scanned bit.
    pub head: char,
    /// Bits right of the head, without trailing zeros.
    pub right: String,
}

impl DecodedTape {
    /// All bits in tape order.
    pub fn bits(&self) -> Vec<char> {
        self.left
            .chars()
            .chain(std::iter::once(self.head))
            .chain(self.right.chars())
            .collect()
    }

    /// Position of the head within [`DecodedTape::bits`].
    pub fn head_index(&self) -> usize {
        self.left.len()
    }
}

impl fmt::Display for DecodedTape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]{}", self.left, self.head, self.right)
    }
}

/// Decodes a word of the form `A_q x (a_q x)^m B_q x (b_q x)^n`, with `#` allowed in place
/// of `A_q` once halted.
pub fn decode_word(word: &TagWord) -> Result<DecodedTape, DecodeError> {
    let symbols = word.symbols();
    if symbols.is_empty() {
        return Err(DecodeError::Empty);
    }
    if symbols.len() % 2 != 0 {
        return Err(DecodeError::OddLength(symbols.len()));
    }

    let halted = symbols[0] == HALTING_MARKER;
    if !halted && strip_tag(&symbols[0], "A").is_none() {
        return Err(unexpected(symbols, 0));
    }
    expect_separator(symbols, 1)?;

    let mut position = 2;
    let mut m: usize = 0;
    while position < symbols.len() && strip_tag(&symbols[position], "a").is_some() {
        expect_separator(symbols, position + 1)?;
        m += 1;
        position += 2;
    }

    let Some(b) = symbols.get(position) else {
        return Err(DecodeError::Truncated);
    };
    let label = strip_tag(b, "B").ok_or_else(|| unexpected(symbols, position))?;
    let head = match label.chars().last() {
        Some(bit @ ('0' | '1')) => bit,
        _ => return Err(unexpected(symbols, position)),
    };
    expect_separator(symbols, position + 1)?;
    position += 2;

    let mut n: usize = 0;
    while position < symbols.len() {
        if strip_tag(&symbols[position], "b").is_none() {
            return Err(unexpected(symbols, position));
        }
        expect_separator(symbols, position + 1)?;
        n += 1;
        position += 2;
    }

    Ok(DecodedTape {
        label: label.to_string(),
        halted,
        left: if m == 0 { String::new() } else { format!("{m:b}") },
        head,
        right: if n == 0 {
            String::new()
        } else {
            format!("{n:b}").chars().rev().collect()
        },
    })
}

/// `A_q0_1` with tag `A` gives `q0_1`.
fn strip_tag<'a>(symbol: &'a str, tag: &str) -> Option<&'a str> {
    symbol.strip_prefix(tag)?.strip_prefix('_')
}

fn expect_separator(symbols: &[String], position: usize) -> Result<(), DecodeError> {
    match symbols.get(position) {
        Some(symbol) if symbol == SEPARATOR => Ok(()),
        _ => Err(DecodeError::MissingSeparator(position)),
    }
}

fn unexpected(symbols: &[String], position: usize) -> DecodeError {
    DecodeError::UnexpectedSymbol {
        position,
        symbol: symbols[position].clone(),
    }
}
