//! This module provides functions for validating machine definitions before anything is built
//! from them. This includes checks for a declared blank, declared states and symbols, and a
//! warning for states that cannot be reached from the start state.

use std::collections::{HashSet, VecDeque};
use tracing::warn;

use crate::machine::MachineDefinition;
use crate::types::ConstructionError;

/// Validates a [`MachineDefinition`], returning the first problem found.
///
/// Duplicate transition keys are reported by [`crate::machine::TransitionTable::new`];
/// this function covers everything else that would make the definition inconsistent.
pub fn analyze(definition: &MachineDefinition) -> Result<(), ConstructionError> {
    let errors = [
        check_blank,
        check_tape_symbols,
        check_states,
        check_transition_symbols,
    ]
    .iter()
    .filter_map(|f| f(definition).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.into_iter().next() {
        return Err(first_error);
    }

    let unreachable = unreachable_states(definition);
    if !unreachable.is_empty() {
        warn!(machine = %definition.name, ?unreachable, "unreachable states");
    }

    Ok(())
}

/// Checks that the blank symbol belongs to the tape alphabet.
fn check_blank(definition: &MachineDefinition) -> Result<(), ConstructionError> {
    if !definition.tape_symbols.contains(&definition.blank) {
        return Err(ConstructionError::MissingBlank(definition.blank));
    }

    Ok(())
}

/// Checks that input symbols and the initial tape only use tape symbols.
fn check_tape_symbols(definition: &MachineDefinition) -> Result<(), ConstructionError> {
    definition
        .input_symbols
        .iter()
        .copied()
        .chain(definition.initial_tape.chars())
        .find(|symbol| !definition.tape_symbols.contains(symbol))
        .map_or(Ok(()), |symbol| {
            Err(ConstructionError::UndefinedSymbol(symbol.to_string()))
        })
}

/// Checks that the start state, the accept states and all states named by transitions
/// are declared.
fn check_states(definition: &MachineDefinition) -> Result<(), ConstructionError> {
    let declared: HashSet<&str> = definition.states.iter().map(String::as_str).collect();

    std::iter::once(&definition.start_state)
        .chain(definition.accept_states.iter())
        .chain(
            definition
                .transitions
                .iter()
                .flat_map(|t| [&t.state, &t.next_state]),
        )
        .find(|state| !declared.contains(state.as_str()))
        .map_or(Ok(()), |state| {
            Err(ConstructionError::UndefinedState(state.clone()))
        })
}

/// Checks that every transition reads and writes tape symbols.
fn check_transition_symbols(definition: &MachineDefinition) -> Result<(), ConstructionError> {
    definition
        .transitions
        .iter()
        .flat_map(|t| [t.read, t.write])
        .find(|symbol| !definition.tape_symbols.contains(symbol))
        .map_or(Ok(()), |symbol| {
            Err(ConstructionError::UndefinedSymbol(symbol.to_string()))
        })
}

/// Returns the declared states that no chain of transitions reaches from the start state,
/// in declaration order.
pub fn unreachable_states(definition: &MachineDefinition) -> Vec<String> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();

    reachable.insert(definition.start_state.as_str());
    queue.push_back(definition.start_state.as_str());

    while let Some(state) = queue.pop_front() {
        for transition in definition.transitions.iter().filter(|t| t.state == state) {
            if reachable.insert(transition.next_state.as_str()) {
                queue.push_back(transition.next_state.as_str());
            }
        }
    }

    definition
        .states
        .iter()
        .filter(|state| !reachable.contains(state.as_str()))
        .cloned()
        .collect()
}
