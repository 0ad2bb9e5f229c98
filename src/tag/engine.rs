use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::debug;

use super::system::{TagSystem, TagWord};
use crate::runner::{Runner, Stepper};
use crate::types::{Error, Step};

/// The word after a given number of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordTrace {
    pub step: usize,
    pub word: TagWord,
}

impl fmt::Display for WordTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {}", self.step, self.word)
    }
}

/// Runs a two-tag system: read the first symbol, delete two, append its production.
///
/// Symbols are interned to integers when the engine is built, so a step costs two pops and
/// an append regardless of how long the symbol names are. The engine halts when fewer than
/// two symbols remain or the halting marker reaches the front.
pub struct TwoTagEngine {
    names: Vec<String>,
    ids: HashMap<String, u32>,
    productions: Vec<Option<Vec<u32>>>,
    halting_marker: u32,
    word: VecDeque<u32>,
    step_count: usize,
    peak_len: usize,
}

impl TwoTagEngine {
    pub fn new(system: &TagSystem) -> Self {
        let mut engine = Self {
            names: Vec::new(),
            ids: HashMap::new(),
            productions: Vec::new(),
            halting_marker: 0,
            word: VecDeque::new(),
            step_count: 0,
            peak_len: 0,
        };

        engine.halting_marker = engine.intern(system.halting_marker());
        for production in system.productions() {
            let lhs = engine.intern(&production.lhs);
            let rhs = production.rhs.iter().map(|s| engine.intern(s)).collect();
            engine.productions[lhs as usize] = Some(rhs);
        }

        engine
    }

    fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(&id) = self.ids.get(symbol) {
            return id;
        }

        let id = self.names.len() as u32;
        self.names.push(symbol.to_string());
        self.ids.insert(symbol.to_string(), id);
        self.productions.push(None);
        id
    }

    /// The current word.
    pub fn word(&self) -> TagWord {
        self.word
            .iter()
            .map(|&id| self.names[id as usize].as_str())
            .collect()
    }

    pub fn word_len(&self) -> usize {
        self.word.len()
    }

    /// Longest word seen since the last load.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        self.word.len() < 2 || self.word.front() == Some(&self.halting_marker)
    }
}

impl Stepper for TwoTagEngine {
    type Trace = WordTrace;

    fn step(&mut self) -> Result<Step, Error> {
        if self.is_halted() {
            debug!(steps = self.step_count, len = self.word.len(), "tag system halted");
            return Ok(Step::Halt);
        }

        let first = self.word[0] as usize;
        let Some(rhs) = &self.productions[first] else {
            return Err(Error::UndefinedProduction(self.names[first].clone()));
        };

        self.word.drain(..2);
        self.word.extend(rhs.iter().copied());
        self.step_count += 1;
        self.peak_len = self.peak_len.max(self.word.len());

        Ok(Step::Continue)
    }

    fn trace(&self) -> WordTrace {
        WordTrace {
            step: self.step_count,
            word: self.word(),
        }
    }
}

impl Runner for TwoTagEngine {
    type Input = TagWord;
    type Output = TagWord;

    fn load(&mut self, input: &TagWord) -> Result<(), Error> {
        let word: VecDeque<u32> = input.symbols().iter().map(|s| self.intern(s)).collect();

        self.peak_len = word.len();
        self.word = word;
        self.step_count = 0;
        Ok(())
    }

    fn output(&self) -> TagWord {
        self.word()
    }
}
