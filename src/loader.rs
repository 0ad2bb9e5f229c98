//! This module provides the `ProgramLoader` struct, responsible for loading machine
//! definitions from files, directories and strings.

use crate::machine::MachineDefinition;
use crate::parser::parse;
use crate::types::{Error, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of machine definition files.
pub const DEFINITION_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading machine definitions.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single definition from the specified file path.
    ///
    /// Files larger than [`MAX_PROGRAM_SIZE`] are refused before they are read.
    pub fn load_program(path: &Path) -> Result<MachineDefinition, Error> {
        let metadata = fs::metadata(path).map_err(|e| {
            Error::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        if metadata.len() > MAX_PROGRAM_SIZE as u64 {
            return Err(Error::FileError(format!(
                "File {} is larger than {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Loads a single definition from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<MachineDefinition, Error> {
        parse(content)
    }

    /// Loads every `.tm` file of `directory`, sorted by path.
    ///
    /// Directories and files with other extensions are skipped. Each element carries either
    /// the loaded definition or the error for that file.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, MachineDefinition), Error>> {
        if !directory.exists() {
            return vec![Err(Error::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(Error::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(Error::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }
        paths.sort();

        results.extend(paths.into_iter().filter_map(|path| {
            if path.is_dir()
                || path
                    .extension()
                    .is_none_or(|ext| ext != DEFINITION_EXTENSION)
            {
                return None;
            }

            match Self::load_program(&path) {
                Ok(definition) => Some(Ok((path, definition))),
                Err(e) => Some(Err(Error::FileError(format!(
                    "Failed to load program from {}: {}",
                    path.display(),
                    e
                )))),
            }
        }));

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "#name: Test Program\n#states: s h\n#symbols: a b _\n#initial_state: s\n#accept_states: h\n#initial_tape: a\n#transition_table\ns a h b R\n";

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.tm");
        write_file(&file_path, VALID);

        let definition = ProgramLoader::load_program(&file_path).unwrap();

        assert_eq!(definition.name, "Test Program");
        assert_eq!(definition.initial_tape, "a");
        assert_eq!(definition.transitions.len(), 1);
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");
        write_file(&file_path, "This is not a valid program");

        assert!(matches!(
            ProgramLoader::load_program(&file_path),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            ProgramLoader::load_program(&dir.path().join("missing.tm")),
            Err(Error::FileError(_))
        ));
    }

    #[test]
    fn test_load_oversized_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("big.tm");
        let padding = "// padding\n".repeat(MAX_PROGRAM_SIZE / 10);
        write_file(&file_path, &format!("{padding}{VALID}"));

        let error = ProgramLoader::load_program(&file_path).unwrap_err();
        assert!(error.to_string().contains("larger than"));
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("valid.tm"), VALID);
        write_file(&dir.path().join("invalid.tm"), "This is not a valid program");
        write_file(&dir.path().join("ignored.txt"), "This file should be ignored");

        let results = ProgramLoader::load_programs(dir.path());

        // Sorted by path: invalid.tm, then valid.tm.
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().1.name, "Test Program");
    }

    #[test]
    fn test_load_bundled_machines() {
        let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("machines");
        let names: Vec<String> = ProgramLoader::load_programs(&directory)
            .into_iter()
            .map(|result| result.unwrap().1.name)
            .collect();

        assert_eq!(names, vec!["Binary Addition", "Palindrome", "Toggle Bits"]);
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("nowhere"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
