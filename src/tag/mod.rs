//! Two-tag systems: the rule set, the engine that runs it, and the Cocke–Minsky compiler
//! that turns a binary Turing machine into one.

pub mod compiler;
pub mod engine;
pub mod system;
mod templates;

pub use compiler::{CompiledTagSystem, DecodedTape, TagCompiler, TagTransition, Target};
pub use engine::{TwoTagEngine, WordTrace};
pub use system::{Production, TagSystem, TagWord};
