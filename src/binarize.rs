//! Rewrites an arbitrary-alphabet Turing machine into an equivalent machine over `{0, 1}`.
//!
//! Every tape symbol becomes a fixed-width block of `bit_depth` bits, with the blank mapped
//! to the all-zero block so that the blank padding of a binarized tape decodes to blanks.
//! Every original state expands into a read tree that decodes one block, and every original
//! transition into a chain of bit-level states that rewrites the block and moves the head to
//! the neighbouring block.

use std::collections::HashSet;
use tracing::debug;

use crate::analyzer::analyze;
use crate::machine::{MachineDefinition, TransitionRule};
use crate::types::{
    ConstructionError, DecodeError, Direction, Error, State, BINARY_BLANK, BINARY_ONE,
};

/// Bidirectional mapping between tape symbols and fixed-width bit blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarizationMap {
    symbols: Vec<char>,
    bit_depth: usize,
}

impl BinarizationMap {
    /// Indexes `tape_symbols` with `blank` fixed at index 0; the other symbols keep their order.
    pub fn new(tape_symbols: &[char], blank: char) -> Result<Self, ConstructionError> {
        if !tape_symbols.contains(&blank) {
            return Err(ConstructionError::MissingBlank(blank));
        }

        let mut symbols = vec![blank];
        for &symbol in tape_symbols {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        if symbols.len() < 2 {
            return Err(ConstructionError::TooFewSymbols(symbols.len()));
        }

        let bit_depth = (usize::BITS - (symbols.len() - 1).leading_zeros()) as usize;
        Ok(Self { symbols, bit_depth })
    }

    /// Width of one block, `ceil(log2(|alphabet|))`.
    pub fn bit_depth(&self) -> usize {
        self.bit_depth
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn blank(&self) -> char {
        self.symbols[0]
    }

    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.symbols.iter().position(|&s| s == symbol)
    }

    /// The block of `symbol`, most significant bit first.
    pub fn encode_symbol(&self, symbol: char) -> Option<Vec<char>> {
        self.index_of(symbol).map(|index| self.code(index))
    }

    fn code(&self, index: usize) -> Vec<char> {
        (0..self.bit_depth)
            .rev()
            .map(|bit| {
                if (index >> bit) & 1 == 1 {
                    BINARY_ONE
                } else {
                    BINARY_BLANK
                }
            })
            .collect()
    }

    /// Maps one block back to its symbol.
    pub fn decode_block(&self, block: &[char]) -> Result<char, DecodeError> {
        let unknown = || DecodeError::UnknownBlock(block.iter().collect());

        let mut index = 0usize;
        for &bit in block {
            index = match bit {
                BINARY_BLANK => index << 1,
                BINARY_ONE => index << 1 | 1,
                _ => return Err(unknown()),
            };
        }

        self.symbols.get(index).copied().ok_or_else(unknown)
    }

    /// Re-encodes a tape symbol by symbol.
    pub fn encode_tape(&self, input: &[char]) -> Result<Vec<char>, ConstructionError> {
        let mut bits = Vec::with_capacity(input.len() * self.bit_depth);
        for &symbol in input {
            let block = self
                .encode_symbol(symbol)
                .ok_or_else(|| ConstructionError::UndefinedSymbol(symbol.to_string()))?;
            bits.extend(block);
        }
        Ok(bits)
    }

    /// Converts a head position on the original tape into one on the binarized tape.
    pub fn scale_head(&self, head: usize) -> usize {
        head * self.bit_depth
    }

    /// Decodes a binarized tape whose head sits at `head`.
    ///
    /// The bits are padded with zeros on the left until the head is block-aligned and on
    /// the right up to a whole block, then grouped into blocks.
    pub fn decode_tape(&self, bits: &[char], head: usize) -> Result<Vec<char>, DecodeError> {
        let left_pad = (self.bit_depth - head % self.bit_depth) % self.bit_depth;
        let mut padded = vec![BINARY_BLANK; left_pad];
        padded.extend_from_slice(bits);

        let right_pad = (self.bit_depth - padded.len() % self.bit_depth) % self.bit_depth;
        padded.extend(std::iter::repeat(BINARY_BLANK).take(right_pad));

        padded
            .chunks(self.bit_depth)
            .map(|block| self.decode_block(block))
            .collect()
    }

    /// Like [`BinarizationMap::decode_tape`], rendered with the blank padding trimmed.
    pub fn decode_tape_string(&self, bits: &[char], head: usize) -> Result<String, DecodeError> {
        let symbols: String = self.decode_tape(bits, head)?.into_iter().collect();
        Ok(symbols.trim_matches(self.blank()).to_string())
    }
}

/// A machine over `{0, 1}` produced by the [`Binarizer`], with the map used to build it.
#[derive(Debug, Clone, PartialEq)]
pub struct BinarizedMachine {
    pub definition: MachineDefinition,
    pub map: BinarizationMap,
}

/// Result of binarizing a machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Binarization {
    /// The machine already had two tape symbols and was left untouched.
    Identity(MachineDefinition),
    /// The machine was rewritten over `{0, 1}`.
    Binarized(BinarizedMachine),
}

impl Binarization {
    /// The machine to execute, binarized or not.
    pub fn definition(&self) -> &MachineDefinition {
        match self {
            Binarization::Identity(definition) => definition,
            Binarization::Binarized(machine) => &machine.definition,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Binarization::Identity(_))
    }
}

/// Builds binarized machines.
pub struct Binarizer;

impl Binarizer {
    /// Binarizes `definition`.
    ///
    /// Two-symbol machines come back as [`Binarization::Identity`].
    pub fn binarize(definition: &MachineDefinition) -> Result<Binarization, Error> {
        analyze(definition)?;

        let map = BinarizationMap::new(&definition.tape_symbols, definition.blank)?;
        if map.symbols().len() == 2 {
            return Ok(Binarization::Identity(definition.clone()));
        }

        let mut builder = Builder::new(&map);

        for state in &definition.states {
            if !definition.is_accepting(state) {
                builder.read_tree(state)?;
            }
        }

        for transition in &definition.transitions {
            if !definition.is_accepting(&transition.state) {
                builder.transition_chain(transition)?;
            }
        }

        let accept_states: Vec<State> = definition
            .accept_states
            .iter()
            .map(|state| entry_state(state))
            .collect();
        for state in &accept_states {
            builder.declare(state)?;
        }

        let initial_tape = map.encode_tape(&definition.initial_tape_symbols())?;

        let binarized = MachineDefinition {
            name: format!("{} (binarized)", definition.name),
            states: builder.states,
            input_symbols: vec![BINARY_BLANK, BINARY_ONE],
            tape_symbols: vec![BINARY_BLANK, BINARY_ONE],
            blank: BINARY_BLANK,
            start_state: entry_state(&definition.start_state),
            accept_states,
            initial_tape: initial_tape.into_iter().collect(),
            transitions: builder.transitions,
        };

        debug!(
            machine = %definition.name,
            bit_depth = map.bit_depth(),
            states = binarized.states.len(),
            transitions = binarized.transitions.len(),
            "binarized machine"
        );

        Ok(Binarization::Binarized(BinarizedMachine {
            definition: binarized,
            map,
        }))
    }
}

/// The sub-state at which a binarized machine enters `state`, before reading any bit.
pub fn entry_state(state: &str) -> State {
    tree_node(state, 0)
}

/// Read-tree nodes are heap indexed: node `i` has children `2i + 1` (bit 0) and `2i + 2` (bit 1).
fn tree_node(state: &str, index: usize) -> State {
    format!("{state}_{index}")
}

struct Builder<'a> {
    map: &'a BinarizationMap,
    states: Vec<State>,
    seen: HashSet<State>,
    transitions: Vec<TransitionRule>,
}

impl<'a> Builder<'a> {
    fn new(map: &'a BinarizationMap) -> Self {
        Self {
            map,
            states: Vec::new(),
            seen: HashSet::new(),
            transitions: Vec::new(),
        }
    }

    fn declare(&mut self, state: &str) -> Result<(), ConstructionError> {
        if !self.seen.insert(state.to_string()) {
            return Err(ConstructionError::StateCollision(state.to_string()));
        }
        self.states.push(state.to_string());
        Ok(())
    }

    /// Adds `from --bit/write--> to` for both bits. `write: None` keeps the bit that was read.
    fn both_bits(&mut self, from: &str, to: &str, write: Option<char>, direction: Direction) {
        for bit in [BINARY_BLANK, BINARY_ONE] {
            self.transitions.push(TransitionRule::new(
                from,
                bit,
                to,
                write.unwrap_or(bit),
                direction,
            ));
        }
    }

    /// Decision tree of depth `bit_depth` that reads one block moving right and ends in the
    /// leaf identifying the symbol. Leaves are declared here and get their transitions from
    /// [`Builder::transition_chain`].
    fn read_tree(&mut self, state: &str) -> Result<(), ConstructionError> {
        let nodes = (1usize << (self.map.bit_depth() + 1)) - 1;
        let internal = (1usize << self.map.bit_depth()) - 1;

        for index in 0..nodes {
            self.declare(&tree_node(state, index))?;
        }

        for index in 0..internal {
            let from = tree_node(state, index);
            for (bit, child) in [(BINARY_BLANK, 2 * index + 1), (BINARY_ONE, 2 * index + 2)] {
                self.transitions.push(TransitionRule::new(
                    &from,
                    bit,
                    &tree_node(state, child),
                    bit,
                    Direction::Right,
                ));
            }
        }

        Ok(())
    }

    /// Expands `(s, a) -> (s', b, d)` starting at the leaf of `a` in the read tree of `s`,
    /// with the head just past the block:
    ///
    /// * back: `bit_depth` left moves to the block start,
    /// * write: `bit_depth` right moves writing the code of `b`,
    /// * return: `bit_depth` left moves to the block start,
    /// * move: `bit_depth` moves in direction `d`, the last one entering `s'`.
    fn transition_chain(&mut self, transition: &TransitionRule) -> Result<(), ConstructionError> {
        let depth = self.map.bit_depth();
        let read = self
            .map
            .index_of(transition.read)
            .ok_or_else(|| ConstructionError::UndefinedSymbol(transition.read.to_string()))?;
        let code = self
            .map
            .encode_symbol(transition.write)
            .ok_or_else(|| ConstructionError::UndefinedSymbol(transition.write.to_string()))?;

        let source = &transition.state;
        let leaf = tree_node(source, (1 << depth) - 1 + read);
        let chain_state = |phase: &str, j: usize| format!("{source}_{read}_{phase}{j}");

        let mut chain = vec![leaf];
        chain.extend((1..depth).map(|j| chain_state("back", j)));
        chain.extend((0..depth).map(|j| chain_state("write", j)));
        chain.extend((0..depth).map(|j| chain_state("ret", j)));
        chain.extend((0..depth).map(|j| chain_state("move", j)));
        for state in &chain[1..] {
            self.declare(state)?;
        }
        chain.push(entry_state(&transition.next_state));

        for (j, pair) in chain.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            match j / depth {
                0 => self.both_bits(from, to, None, Direction::Left),
                1 => self.both_bits(from, to, Some(code[j - depth]), Direction::Right),
                2 => self.both_bits(from, to, None, Direction::Left),
                _ => self.both_bits(from, to, None, transition.direction),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::programs::ProgramManager;
    use crate::runner::Runner;
    use crate::types::Outcome;

    fn binarized(name: &str) -> (MachineDefinition, BinarizedMachine) {
        let definition = ProgramManager::get_program_by_name(name).unwrap();
        match Binarizer::binarize(&definition).unwrap() {
            Binarization::Binarized(machine) => (definition, machine),
            Binarization::Identity(_) => panic!("expected a binarized machine"),
        }
    }

    #[test]
    fn test_map_orders_blank_first() {
        let map = BinarizationMap::new(&['0', '1', '_'], '_').unwrap();

        assert_eq!(map.symbols(), &['_', '0', '1']);
        assert_eq!(map.bit_depth(), 2);
        assert_eq!(map.encode_symbol('_'), Some(vec!['0', '0']));
        assert_eq!(map.encode_symbol('0'), Some(vec!['0', '1']));
        assert_eq!(map.encode_symbol('1'), Some(vec!['1', '0']));
    }

    #[test]
    fn test_bit_depth() {
        let symbols = ['_', 'a', 'b', 'c', 'd'];
        let depths: Vec<usize> = (2..=5)
            .map(|n| BinarizationMap::new(&symbols[..n], '_').unwrap().bit_depth())
            .collect();

        assert_eq!(depths, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_decode_tape_aligns_on_head() {
        let map = BinarizationMap::new(&['0', '1', '_'], '_').unwrap();
        let bits: Vec<char> = "11001".chars().collect();

        // Head on the fourth bit: one bit of left padding realigns the blocks.
        assert_eq!(map.decode_tape(&bits, 3), Ok(vec!['0', '1', '0']));
        assert_eq!(map.decode_tape_string(&bits, 3), Ok("010".to_string()));
    }

    #[test]
    fn test_decode_unknown_block() {
        let map = BinarizationMap::new(&['0', '1', '_'], '_').unwrap();

        assert_eq!(
            map.decode_tape(&['1', '1'], 0),
            Err(DecodeError::UnknownBlock("11".to_string()))
        );
    }

    #[test]
    fn test_two_symbols_is_identity() {
        let mut definition = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        definition.tape_symbols = vec!['1', '_'];
        definition.input_symbols = vec!['1'];
        definition.initial_tape = "11".to_string();
        definition.transitions.retain(|t| t.read != '0' && t.write != '0');

        let binarization = Binarizer::binarize(&definition).unwrap();
        assert!(binarization.is_identity());
        assert_eq!(binarization.definition(), &definition);
    }

    #[test]
    fn test_table_sizes() {
        let (_, machine) = binarized("Toggle Bits");

        // One read tree of 2^3 - 2 transitions, three chains of 8 * 2 transitions.
        assert_eq!(machine.definition.transitions.len(), 54);
        assert_eq!(machine.definition.start_state, "q0_0");
        assert_eq!(machine.definition.accept_states, vec!["q1_0".to_string()]);

        let (_, machine) = binarized("Binary Addition");
        assert_eq!(machine.definition.transitions.len(), 308);
    }

    #[test]
    fn test_initial_tape_encoding() {
        let (_, machine) = binarized("Binary Addition");

        assert_eq!(machine.definition.initial_tape, "1010011000100110");
        assert_eq!(machine.map.scale_head(3), 6);
    }

    #[test]
    fn test_round_trip_matches_original() {
        let cases = [
            ("Binary Addition", "1101_101"),
            ("Binary Addition", "11_1"),
            ("Toggle Bits", "110010110"),
            ("Palindrome", "abaaba"),
            ("Palindrome", "abab"),
            ("Palindrome", ""),
        ];

        for (name, input) in cases {
            let (definition, machine) = binarized(name);

            let mut original = TuringMachine::new(definition).unwrap();
            let expected = original.run(input).unwrap();

            let bits: String = machine
                .map
                .encode_tape(&input.chars().collect::<Vec<_>>())
                .unwrap()
                .into_iter()
                .collect();
            let mut binary = TuringMachine::new(machine.definition.clone()).unwrap();
            let outcome = binary.run(bits.as_str()).unwrap();

            assert_eq!(outcome, expected, "{name} on {input:?}");
            assert_eq!(
                machine
                    .map
                    .decode_tape_string(&binary.tape().cells(), binary.tape().head())
                    .unwrap(),
                original.tape().render(),
                "{name} on {input:?}"
            );
        }
    }

    #[test]
    fn test_binarized_steps_scale_with_depth() {
        let (definition, machine) = binarized("Binary Addition");

        let mut original = TuringMachine::new(definition).unwrap();
        original.run("1101_101").unwrap();
        let mut binary = TuringMachine::new(machine.definition.clone()).unwrap();
        assert_eq!(binary.run_initial(), Ok(Outcome::Accept));

        // Each original step costs five passes of `bit_depth` bit-level steps.
        assert_eq!(binary.step_count(), original.step_count() * 10);
    }
}
