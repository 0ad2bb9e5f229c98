use crate::machine::MachineDefinition;
use crate::types::Error;

use std::sync::RwLock;
use tracing::warn;

// Embedded catalogue of worked machines
const PROGRAM_TEXTS: [&str; 3] = [
    include_str!("../machines/binary_addition.tm"),
    include_str!("../machines/toggle_bits.tm"),
    include_str!("../machines/palindrome.tm"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<MachineDefinition>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded machines into the registry, once.
    pub fn load() -> Result<(), Error> {
        if PROGRAMS.read().map(|p| !p.is_empty()).unwrap_or(false) {
            return Ok(());
        }

        let mut programs = Vec::new();
        for text in PROGRAM_TEXTS {
            match crate::parser::parse(text) {
                Ok(definition) => programs.push(definition),
                Err(e) => warn!(error = %e, "failed to parse embedded machine"),
            }
        }

        let mut guard = PROGRAMS
            .write()
            .map_err(|_| Error::FileError("Failed to acquire write lock".to_string()))?;
        *guard = programs;

        Ok(())
    }

    pub fn get_program_count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    pub fn get_program_by_index(index: usize) -> Result<MachineDefinition, Error> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| Error::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| Error::FileError(format!("Program index {} out of range", index)))
    }

    pub fn get_program_by_name(name: &str) -> Result<MachineDefinition, Error> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| Error::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| Error::FileError(format!("Program '{}' not found", name)))
    }

    /// Summaries of every embedded machine, in catalogue order.
    pub fn list_programs() -> Vec<ProgramInfo> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .enumerate()
                    .map(|(index, program)| ProgramInfo::new(index, program))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_tape: String,
    pub state_count: usize,
    pub symbol_count: usize,
    pub transition_count: usize,
}

impl ProgramInfo {
    fn new(index: usize, program: &MachineDefinition) -> Self {
        Self {
            index,
            name: program.name.clone(),
            initial_tape: program.initial_tape.clone(),
            state_count: program.states.len(),
            symbol_count: program.tape_symbols.len(),
            transition_count: program.transitions.len(),
        }
    }
}
