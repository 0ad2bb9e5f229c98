//! This module defines the normalized machine definition, the validated transition table
//! and the `TuringMachine` that executes it over a growable [`Tape`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

use crate::analyzer::analyze;
use crate::runner::{Runner, Stepper};
use crate::tape::Tape;
use crate::types::{ConstructionError, Direction, Error, Outcome, State, Step};

/// Number of cells shown on each side of the head in a trace record.
const TRACE_RADIUS: usize = 8;

/// A Turing machine definition as supplied by a definition file or built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDefinition {
    /// A human readable name.
    pub name: String,
    /// All states of the machine.
    pub states: Vec<State>,
    /// Symbols allowed in the initial tape.
    pub input_symbols: Vec<char>,
    /// All symbols that may appear on the tape, including the blank.
    pub tape_symbols: Vec<char>,
    /// The blank symbol.
    pub blank: char,
    /// The state the machine starts in.
    pub start_state: State,
    /// States at which the machine accepts.
    pub accept_states: Vec<State>,
    /// Initial tape content, written starting at the head.
    pub initial_tape: String,
    /// Transition rules, one per `(state, read)` key.
    pub transitions: Vec<TransitionRule>,
}

impl MachineDefinition {
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.iter().any(|s| s == state)
    }

    pub fn initial_tape_symbols(&self) -> Vec<char> {
        self.initial_tape.chars().collect()
    }

    /// Returns a copy of this definition with a different initial tape.
    pub fn with_input(&self, input: &str) -> Self {
        Self {
            initial_tape: input.to_string(),
            ..self.clone()
        }
    }
}

/// One row of a transition table: `(state, read) -> (next_state, write, direction)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub state: State,
    pub read: char,
    pub next_state: State,
    pub write: char,
    pub direction: Direction,
}

impl TransitionRule {
    pub fn new(state: &str, read: char, next_state: &str, write: char, direction: Direction) -> Self {
        Self {
            state: state.to_string(),
            read,
            next_state: next_state.to_string(),
            write,
            direction,
        }
    }
}

impl fmt::Display for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.state,
            self.read,
            self.next_state,
            self.write,
            self.direction.as_char()
        )
    }
}

/// The right-hand side of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub next_state: State,
    pub write: char,
    pub direction: Direction,
}

/// A `(state, symbol) -> action` map whose keys were checked for uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    rules: HashMap<State, HashMap<char, Action>>,
    len: usize,
}

impl TransitionTable {
    /// Builds the table, failing on the first duplicated key.
    pub fn new(rules: &[TransitionRule]) -> Result<Self, ConstructionError> {
        let mut table = Self::default();
        for rule in rules {
            table.insert(rule)?;
        }
        Ok(table)
    }

    fn insert(&mut self, rule: &TransitionRule) -> Result<(), ConstructionError> {
        let row = self.rules.entry(rule.state.clone()).or_default();
        if row.contains_key(&rule.read) {
            return Err(ConstructionError::DuplicateTransition {
                state: rule.state.clone(),
                symbol: rule.read,
            });
        }

        row.insert(
            rule.read,
            Action {
                next_state: rule.next_state.clone(),
                write: rule.write,
                direction: rule.direction,
            },
        );
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, state: &str, symbol: char) -> Option<&Action> {
        self.rules.get(state).and_then(|row| row.get(&symbol))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One observation of a running machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineTrace {
    pub step: usize,
    pub state: State,
    pub head: usize,
    pub window: String,
}

impl fmt::Display for MachineTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {:<12} {}", self.step, self.state, self.window)
    }
}

/// A deterministic single-tape Turing machine.
///
/// The transition table is validated when the machine is built, so lookups during
/// execution either hit a rule or mean the input is rejected.
pub struct TuringMachine {
    definition: MachineDefinition,
    table: TransitionTable,
    accept_states: HashSet<State>,
    state: State,
    tape: Tape,
    step_count: usize,
    outcome: Option<Outcome>,
}

impl TuringMachine {
    /// Validates `definition` and creates a machine loaded with its initial tape.
    pub fn new(definition: MachineDefinition) -> Result<Self, Error> {
        analyze(&definition)?;
        let table = TransitionTable::new(&definition.transitions)?;

        let mut tape = Tape::new(definition.blank);
        tape.reset(&definition.initial_tape_symbols());

        Ok(Self {
            accept_states: definition.accept_states.iter().cloned().collect(),
            state: definition.start_state.clone(),
            table,
            tape,
            step_count: 0,
            outcome: None,
            definition,
        })
    }

    /// Runs the definition's own initial tape.
    pub fn run_initial(&mut self) -> Result<Outcome, Error> {
        let input = self.definition.initial_tape.clone();
        self.run(input.as_str())
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The terminal outcome, once the machine has halted.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_accepting(&self) -> bool {
        self.accept_states.contains(&self.state)
    }

    pub fn definition(&self) -> &MachineDefinition {
        &self.definition
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    fn halt(&mut self, outcome: Outcome) -> Step {
        debug!(
            machine = %self.definition.name,
            state = %self.state,
            steps = self.step_count,
            ?outcome,
            "machine halted"
        );
        self.outcome = Some(outcome);
        Step::Halt
    }
}

impl Stepper for TuringMachine {
    type Trace = MachineTrace;

    fn step(&mut self) -> Result<Step, Error> {
        if self.outcome.is_some() {
            return Ok(Step::Halt);
        }

        if self.is_accepting() {
            return Ok(self.halt(Outcome::Accept));
        }

        let symbol = self.tape.read();
        let action = match self.table.get(&self.state, symbol) {
            Some(action) => action.clone(),
            None => return Ok(self.halt(Outcome::Reject)),
        };

        trace!(state = %self.state, %symbol, next = %action.next_state, "transition");

        self.tape.write(action.write);
        self.tape.shift(action.direction);
        self.state = action.next_state;
        self.step_count += 1;

        Ok(Step::Continue)
    }

    fn trace(&self) -> MachineTrace {
        MachineTrace {
            step: self.step_count,
            state: self.state.clone(),
            head: self.tape.head(),
            window: self.tape.window(TRACE_RADIUS),
        }
    }
}

impl Runner for TuringMachine {
    type Input = str;
    type Output = Outcome;

    /// Resets the tape with `input` and puts the machine in its start state.
    fn load(&mut self, input: &str) -> Result<(), Error> {
        let symbols: Vec<char> = input.chars().collect();
        if let Some(unknown) = symbols
            .iter()
            .find(|s| !self.definition.tape_symbols.contains(s))
        {
            return Err(ConstructionError::UndefinedSymbol(unknown.to_string()).into());
        }

        self.tape.reset(&symbols);
        self.state = self.definition.start_state.clone();
        self.step_count = 0;
        self.outcome = None;

        debug!(machine = %self.definition.name, %input, "machine loaded");
        Ok(())
    }

    /// `Accept` when the current state is an accept state, `Reject` otherwise.
    fn output(&self) -> Outcome {
        if self.is_accepting() {
            Outcome::Accept
        } else {
            Outcome::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::ProgramManager;

    fn toggle_definition() -> MachineDefinition {
        MachineDefinition {
            name: "Toggle".to_string(),
            states: vec!["q0".to_string(), "q1".to_string()],
            input_symbols: vec!['0', '1'],
            tape_symbols: vec!['0', '1', '_'],
            blank: '_',
            start_state: "q0".to_string(),
            accept_states: vec!["q1".to_string()],
            initial_tape: "10".to_string(),
            transitions: vec![
                TransitionRule::new("q0", '0', "q0", '1', Direction::Right),
                TransitionRule::new("q0", '1', "q0", '0', Direction::Right),
                TransitionRule::new("q0", '_', "q1", '_', Direction::Left),
            ],
        }
    }

    #[test]
    fn test_machine_creation() {
        let machine = TuringMachine::new(toggle_definition()).unwrap();

        assert_eq!(machine.state(), "q0");
        assert_eq!(machine.tape().render(), "10");
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.table().len(), 3);
    }

    #[test]
    fn test_single_step() {
        let mut machine = TuringMachine::new(toggle_definition()).unwrap();

        assert_eq!(machine.step(), Ok(Step::Continue));
        assert_eq!(machine.state(), "q0");
        assert_eq!(machine.tape().render(), "00");
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_run_accepts() {
        let mut machine = TuringMachine::new(toggle_definition()).unwrap();

        assert_eq!(machine.run("110010110"), Ok(Outcome::Accept));
        assert_eq!(machine.tape().render(), "001101001");
        assert_eq!(machine.step_count(), 10);
        assert_eq!(machine.outcome(), Some(Outcome::Accept));
    }

    #[test]
    fn test_run_resets_between_calls() {
        let mut machine = TuringMachine::new(toggle_definition()).unwrap();

        machine.run("111").unwrap();
        machine.run("0").unwrap();

        assert_eq!(machine.tape().render(), "1");
        assert_eq!(machine.step_count(), 2);
    }

    #[test]
    fn test_reject_leaves_tape_untouched() {
        let mut definition = toggle_definition();
        definition.transitions = vec![TransitionRule::new("q0", '0', "q1", '1', Direction::Right)];
        let mut machine = TuringMachine::new(definition).unwrap();

        assert_eq!(machine.run("1"), Ok(Outcome::Reject));
        assert_eq!(machine.outcome(), Some(Outcome::Reject));
        assert_eq!(machine.state(), "q0");
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.tape().render(), "1");
    }

    #[test]
    fn test_duplicate_transition_is_construction_error() {
        let mut definition = toggle_definition();
        definition
            .transitions
            .push(TransitionRule::new("q0", '0', "q1", '0', Direction::Left));

        let error = TuringMachine::new(definition).err().unwrap();
        assert_eq!(
            error,
            Error::Construction(ConstructionError::DuplicateTransition {
                state: "q0".to_string(),
                symbol: '0',
            })
        );
    }

    #[test]
    fn test_input_outside_alphabet() {
        let mut machine = TuringMachine::new(toggle_definition()).unwrap();

        let result = machine.run("12");
        assert_eq!(
            result,
            Err(Error::Construction(ConstructionError::UndefinedSymbol(
                "2".to_string()
            )))
        );
    }

    #[test]
    fn test_traces_are_deterministic() {
        let mut machine = TuringMachine::new(toggle_definition()).unwrap();

        let mut first = Vec::new();
        machine
            .run_traced("1001", &mut |t: &MachineTrace| first.push(t.clone()))
            .unwrap();
        let mut second = Vec::new();
        machine
            .run_traced("1001", &mut |t: &MachineTrace| second.push(t.clone()))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
        assert_eq!(first[0].state, "q0");
        assert_eq!(first.last().unwrap().state, "q1");
    }

    #[test]
    fn test_binary_addition() {
        let definition = ProgramManager::get_program_by_name("Binary Addition").unwrap();
        let mut machine = TuringMachine::new(definition).unwrap();

        assert_eq!(machine.run("1101_101"), Ok(Outcome::Accept));
        assert_eq!(machine.state(), "H");
        assert_eq!(machine.tape().render(), "10010");
        assert_eq!(machine.step_count(), 79);
    }

    #[test]
    fn test_palindrome() {
        let definition = ProgramManager::get_program_by_name("Palindrome").unwrap();
        let mut machine = TuringMachine::new(definition).unwrap();

        assert_eq!(machine.run("abaaba"), Ok(Outcome::Accept));
        assert_eq!(machine.run("abab"), Ok(Outcome::Reject));
        assert_eq!(machine.run(""), Ok(Outcome::Accept));
    }
}
