//! This crate provides Turing machines and the models they can be translated into.
//! It includes a Turing machine simulator, a binarizer that rewrites any machine over
//! `{0, 1}`, a Cocke–Minsky compiler from binary machines to two-tag systems, a two-tag
//! engine, and a Post canonical system rewriter.

pub mod analyzer;
pub mod binarize;
pub mod canonical;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod pipeline;
pub mod programs;
pub mod runner;
pub mod tag;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
pub use analyzer::analyze;
pub use binarize::{Binarization, BinarizationMap, BinarizedMachine, Binarizer};
pub use canonical::{CanonicalRule, CanonicalSystem, RewriteTrace};
pub use loader::ProgramLoader;
pub use machine::{MachineDefinition, MachineTrace, TransitionRule, TuringMachine};
pub use parser::parse;
pub use pipeline::{PipelineRun, TagPipeline};
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use runner::{Runner, Stepper};
pub use tag::{CompiledTagSystem, DecodedTape, TagCompiler, TagSystem, TagWord, TwoTagEngine};
pub use tape::Tape;
pub use types::{
    ConstructionError, DecodeError, Direction, Error, Outcome, Step, MAX_PROGRAM_SIZE,
};
