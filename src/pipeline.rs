//! Runs a Turing machine through its two-tag image: binarize, compile, encode the input,
//! run the tag system and decode the final word back into the machine's own alphabet.

use serde::Serialize;
use tracing::info;

use crate::binarize::{Binarization, Binarizer};
use crate::machine::MachineDefinition;
use crate::runner::{Runner, Stepper};
use crate::tag::compiler::{decode_word, CompiledTagSystem, DecodedTape, TagCompiler};
use crate::tag::{TagWord, TwoTagEngine, WordTrace};
use crate::types::{Error, Outcome, Step};

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub outcome: Outcome,
    /// Final tape over the original alphabet, blanks trimmed.
    pub tape: String,
    /// Final tape over bits, as read off the tag word.
    pub decoded: DecodedTape,
    /// Tag-system steps taken.
    pub steps: usize,
    /// Longest tag word seen.
    pub peak_len: usize,
}

/// A machine compiled all the way down to a two-tag system.
pub struct TagPipeline {
    binarization: Binarization,
    compiled: CompiledTagSystem,
}

impl TagPipeline {
    pub fn new(definition: &MachineDefinition) -> Result<Self, Error> {
        let binarization = Binarizer::binarize(definition)?;
        let compiled = TagCompiler::compile(binarization.definition())?;

        Ok(Self {
            binarization,
            compiled,
        })
    }

    pub fn binarization(&self) -> &Binarization {
        &self.binarization
    }

    pub fn compiled(&self) -> &CompiledTagSystem {
        &self.compiled
    }

    /// The initial tag word for `input`, written from the head rightwards.
    pub fn encode(&self, input: &str) -> Result<TagWord, Error> {
        let bits = match &self.binarization {
            Binarization::Identity(_) => input.to_string(),
            Binarization::Binarized(machine) => {
                let symbols: Vec<char> = input.chars().collect();
                machine.map.encode_tape(&symbols)?.into_iter().collect()
            }
        };

        Ok(self.compiled.encode_tape(&bits)?)
    }

    /// Decodes a configuration word into bits and into the original alphabet.
    pub fn decode(&self, word: &TagWord) -> Result<(DecodedTape, String), Error> {
        let decoded = decode_word(word)?;
        let tape = match &self.binarization {
            Binarization::Identity(_) => self.compiled.render(&decoded),
            Binarization::Binarized(machine) => machine
                .map
                .decode_tape_string(&decoded.bits(), decoded.head_index())?,
        };

        Ok((decoded, tape))
    }

    /// Runs `input` through the tag system, giving up after `max_steps` steps.
    pub fn run(&self, input: &str, max_steps: usize) -> Result<Option<PipelineRun>, Error> {
        self.run_traced(input, max_steps, None)
    }

    /// Like [`TagPipeline::run`], handing every word to `sink`.
    ///
    /// A configuration whose state has no transition has no production for its leading
    /// `A` symbol; the engine stops there and the run is reported as a reject.
    pub fn run_traced(
        &self,
        input: &str,
        max_steps: usize,
        mut sink: Option<&mut dyn FnMut(&WordTrace)>,
    ) -> Result<Option<PipelineRun>, Error> {
        let mut engine = TwoTagEngine::new(self.compiled.system());
        engine.load(&self.encode(input)?)?;
        if let Some(sink) = sink.as_deref_mut() {
            sink(&engine.trace());
        }

        loop {
            match engine.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Halt) => break,
                Err(Error::UndefinedProduction(symbol)) if symbol.starts_with("A_") => break,
                Err(e) => return Err(e),
            }

            if engine.step_count() > max_steps {
                return Ok(None);
            }
            if let Some(sink) = sink.as_deref_mut() {
                sink(&engine.trace());
            }
        }

        let (decoded, tape) = self.decode(&engine.output())?;
        let outcome = if decoded.halted {
            Outcome::Accept
        } else {
            Outcome::Reject
        };

        info!(
            steps = engine.step_count(),
            peak_len = engine.peak_len(),
            ?outcome,
            "tag pipeline finished"
        );

        Ok(Some(PipelineRun {
            outcome,
            tape,
            decoded,
            steps: engine.step_count(),
            peak_len: engine.peak_len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::programs::ProgramManager;

    const BUDGET: usize = 1_000_000;

    #[test]
    fn test_toggle_rule_count() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();

        assert!(!pipeline.binarization().is_identity());
        assert_eq!(pipeline.compiled().system().len(), 936);
    }

    #[test]
    fn test_toggle_through_tags() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();

        for (input, steps, tape) in [("1", 204, "0"), ("10", 725, "01"), ("101", 2496, "010")] {
            let run = pipeline.run(input, BUDGET).unwrap().unwrap();

            assert_eq!(run.outcome, Outcome::Accept, "input {input:?}");
            assert_eq!(run.steps, steps, "input {input:?}");
            assert_eq!(run.tape, tape, "input {input:?}");
        }
    }

    #[test]
    fn test_addition_through_tags() {
        let addition = ProgramManager::get_program_by_name("Binary Addition").unwrap();
        let pipeline = TagPipeline::new(&addition).unwrap();
        assert_eq!(pipeline.compiled().system().len(), 5280);

        for (input, steps, tape) in [("1_1", 31493, "10"), ("10_1", 44211, "11")] {
            let run = pipeline.run(input, BUDGET).unwrap().unwrap();

            assert_eq!(run.outcome, Outcome::Accept, "input {input:?}");
            assert_eq!(run.steps, steps, "input {input:?}");
            assert_eq!(run.tape, tape, "input {input:?}");
        }
    }

    #[test]
    fn test_palindrome_accepts_through_tags() {
        let palindrome = ProgramManager::get_program_by_name("Palindrome").unwrap();
        let pipeline = TagPipeline::new(&palindrome).unwrap();
        assert_eq!(pipeline.compiled().system().len(), 4992);

        for (input, steps) in [("", 66), ("aba", 1937)] {
            let run = pipeline.run(input, BUDGET).unwrap().unwrap();

            assert_eq!(run.outcome, Outcome::Accept, "input {input:?}");
            assert_eq!(run.steps, steps, "input {input:?}");
            assert_eq!(run.tape, "", "input {input:?}");
        }
    }

    #[test]
    fn test_matches_direct_simulation() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();
        let mut machine = TuringMachine::new(toggle).unwrap();

        for input in ["0", "11", "0110"] {
            let outcome = machine.run(input).unwrap();
            let run = pipeline.run(input, BUDGET).unwrap().unwrap();

            assert_eq!(run.outcome, outcome, "input {input:?}");
            assert_eq!(run.tape, machine.tape().render(), "input {input:?}");
        }
    }

    #[test]
    fn test_reject_through_tags() {
        let palindrome = ProgramManager::get_program_by_name("Palindrome").unwrap();
        let pipeline = TagPipeline::new(&palindrome).unwrap();

        let run = pipeline.run("ab", BUDGET).unwrap().unwrap();

        assert_eq!(run.outcome, Outcome::Reject);
        assert_eq!(run.steps, 397);
        assert_eq!(run.tape, "b");
        assert_eq!(run.decoded.label, "q2_5_0");
    }

    #[test]
    fn test_step_budget() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();

        assert_eq!(pipeline.run("1", 100), Ok(None));
    }

    #[test]
    fn test_trace_starts_with_encoded_input() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();
        let mut words = Vec::new();

        let run = pipeline
            .run_traced("1", BUDGET, Some(&mut |t: &WordTrace| words.push(t.clone())))
            .unwrap()
            .unwrap();

        assert_eq!(words.len(), run.steps + 1);
        assert_eq!(words[0].word, pipeline.encode("1").unwrap());
        assert_eq!(words[run.steps].word.symbols()[0], "#");
    }

    #[test]
    fn test_input_outside_alphabet() {
        let toggle = ProgramManager::get_program_by_name("Toggle Bits").unwrap();
        let pipeline = TagPipeline::new(&toggle).unwrap();

        assert!(matches!(pipeline.run("12", BUDGET), Err(Error::Construction(_))));
    }
}
