//! A Post canonical system rewriter.
//!
//! Each production pairs a pattern with a template, both written over the system's alphabet
//! with `($k)` placeholders, e.g. `($1)P($2) -> ($1)11P($2)($1)`. A pattern matches a whole
//! word, each variable capturing the longest run of symbols that still lets the rest of the
//! pattern match. [`CanonicalSystem::forward`] applies every production once, in order, feeding
//! each one the previous output.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::parser::{parse_production, parse_template, tokenize, Segment};
use crate::runner::{Runner, Stepper};
use crate::types::{ConstructionError, Error, Step};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Symbol(String),
    Variable(String),
}

/// One `pattern -> template` production, tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRule {
    source: String,
    pattern: Vec<Part>,
    template: Vec<Part>,
}

impl CanonicalRule {
    /// Parses `rule`, splitting literals into symbols of `alphabet`.
    pub fn parse(rule: &str, alphabet: &[String]) -> Result<Self, Error> {
        let (lhs, rhs) = parse_production(rule)?;
        let pattern = parts(&lhs, alphabet)?;
        let template = parts(&rhs, alphabet)?;

        if let Some(name) = template.iter().find_map(|part| match part {
            Part::Variable(name) if !pattern.contains(part) => Some(name),
            _ => None,
        }) {
            return Err(ConstructionError::UnboundVariable(format!("(${name})")).into());
        }

        Ok(Self {
            source: rule.trim().to_string(),
            pattern,
            template,
        })
    }

    /// Rewrites `word`, or returns `None` when the pattern does not match it.
    pub fn apply(&self, word: &[String]) -> Option<Vec<String>> {
        let mut bindings = HashMap::new();
        if !match_parts(&self.pattern, word, &mut bindings) {
            return None;
        }

        let output = self
            .template
            .iter()
            .flat_map(|part| match part {
                Part::Symbol(symbol) => std::slice::from_ref(symbol),
                Part::Variable(name) => bindings.get(name.as_str()).copied().unwrap_or_default(),
            })
            .cloned()
            .collect();

        Some(output)
    }
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn parts(text: &str, alphabet: &[String]) -> Result<Vec<Part>, Error> {
    let mut parts = Vec::new();
    for segment in parse_template(text)? {
        match segment {
            Segment::Variable(name) => parts.push(Part::Variable(name)),
            Segment::Literal(literal) => {
                parts.extend(tokenize(&literal, alphabet)?.into_iter().map(Part::Symbol))
            }
        }
    }
    Ok(parts)
}

/// Matches `parts` against all of `word`, backtracking from the longest capture down.
///
/// A variable that occurs twice must capture the same symbols both times.
fn match_parts<'w>(
    parts: &[Part],
    word: &'w [String],
    bindings: &mut HashMap<String, &'w [String]>,
) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return word.is_empty();
    };

    match first {
        Part::Symbol(symbol) => {
            word.first() == Some(symbol) && match_parts(rest, &word[1..], bindings)
        }
        Part::Variable(name) => {
            if let Some(bound) = bindings.get(name).copied() {
                return word.starts_with(bound) && match_parts(rest, &word[bound.len()..], bindings);
            }

            for len in (0..=word.len()).rev() {
                bindings.insert(name.clone(), &word[..len]);
                if match_parts(rest, &word[len..], bindings) {
                    return true;
                }
            }

            bindings.remove(name);
            false
        }
    }
}

/// The word after a production was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteTrace {
    /// Number of productions applied so far.
    pub step: usize,
    /// The production applied last, if any.
    pub rule: Option<String>,
    pub matched: bool,
    pub word: String,
}

impl fmt::Display for RewriteTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) if self.matched => write!(f, "{:>6}  {}  ({rule})", self.step, self.word),
            Some(rule) => write!(f, "{:>6}  {}  ({rule}, no match)", self.step, self.word),
            None => write!(f, "{:>6}  {}", self.step, self.word),
        }
    }
}

/// A canonical system over a fixed alphabet.
///
/// One step applies the next production in list order; the system halts after the last.
/// A production that does not match leaves the word as it is.
pub struct CanonicalSystem {
    alphabet: Vec<String>,
    rules: Vec<CanonicalRule>,
    word: Vec<String>,
    cursor: usize,
    matched: bool,
}

impl CanonicalSystem {
    pub fn new(alphabet: &[&str], rules: &[&str]) -> Result<Self, Error> {
        let alphabet: Vec<String> = alphabet.iter().map(|s| s.to_string()).collect();
        let rules = rules
            .iter()
            .map(|rule| CanonicalRule::parse(rule, &alphabet))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            alphabet,
            rules,
            word: Vec::new(),
            cursor: 0,
            matched: false,
        })
    }

    /// Applies every production once, in order, to `input`.
    ///
    /// Callers that want a derivation of several passes call this repeatedly.
    pub fn forward(&mut self, input: &str) -> Result<String, Error> {
        self.run(input)
    }

    pub fn rules(&self) -> &[CanonicalRule] {
        &self.rules
    }

    pub fn word(&self) -> String {
        self.word.concat()
    }
}

impl Stepper for CanonicalSystem {
    type Trace = RewriteTrace;

    fn step(&mut self) -> Result<Step, Error> {
        let Some(rule) = self.rules.get(self.cursor) else {
            return Ok(Step::Halt);
        };

        match rule.apply(&self.word) {
            Some(output) => {
                self.word = output;
                self.matched = true;
            }
            None => self.matched = false,
        }
        debug!(rule = %rule, matched = self.matched, word = %self.word.concat(), "rewrite");

        self.cursor += 1;
        Ok(Step::Continue)
    }

    fn trace(&self) -> RewriteTrace {
        RewriteTrace {
            step: self.cursor,
            rule: self
                .cursor
                .checked_sub(1)
                .map(|i| self.rules[i].to_string()),
            matched: self.matched,
            word: self.word(),
        }
    }
}

impl Runner for CanonicalSystem {
    type Input = str;
    type Output = String;

    fn load(&mut self, input: &str) -> Result<(), Error> {
        self.word = tokenize(input, &self.alphabet)?;
        self.cursor = 0;
        self.matched = false;
        Ok(())
    }

    fn output(&self) -> String {
        self.word()
    }
}
