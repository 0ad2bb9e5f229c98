use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::parser::{parse_production, tokenize};
use crate::types::{ConstructionError, Error, EMPTY_PRODUCTION, TEXT_HALTING_MARKER};

/// `lhs -> rhs`: the word appended when `lhs` is at the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<String>,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rhs.is_empty() {
            write!(f, "{} -> {}", self.lhs, EMPTY_PRODUCTION)
        } else {
            write!(f, "{} -> {}", self.lhs, self.rhs.join(" "))
        }
    }
}

/// A sequence of tag symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWord(Vec<String>);

impl TagWord {
    pub fn new(symbols: Vec<String>) -> Self {
        Self(symbols)
    }

    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    pub fn into_symbols(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The symbols written back to back, the way text systems show words.
    pub fn concat(&self) -> String {
        self.0.concat()
    }
}

impl<S: Into<String>> FromIterator<S> for TagWord {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TagWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// A tag system: at most one production per symbol plus a halting marker.
///
/// Symbols are strings, so compiled systems can use long names like `A_q0_1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSystem {
    halting_marker: String,
    alphabet: Vec<String>,
    productions: Vec<Production>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TagSystem {
    pub fn new(halting_marker: &str) -> Self {
        Self {
            halting_marker: halting_marker.to_string(),
            alphabet: Vec::new(),
            productions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builds a system from text rules such as `a1 -> a2a1a3`, `X -> _` or `a3 -> *`.
    ///
    /// Both sides are split into symbols of `alphabet`; `*` is the halting marker and a
    /// lone `_` is the empty word.
    pub fn from_rules(alphabet: &[&str], rules: &[&str]) -> Result<Self, Error> {
        let mut system = Self::new(TEXT_HALTING_MARKER);
        system.alphabet = alphabet.iter().map(|s| s.to_string()).collect();

        let mut rhs_alphabet = system.alphabet.clone();
        rhs_alphabet.push(TEXT_HALTING_MARKER.to_string());

        for rule in rules {
            let (lhs, rhs) = parse_production(rule)?;

            let lhs = match tokenize(&lhs, &system.alphabet)?.as_slice() {
                [symbol] => symbol.clone(),
                _ => return Err(ConstructionError::MalformedProduction(rule.to_string()).into()),
            };
            let rhs = if rhs == EMPTY_PRODUCTION {
                Vec::new()
            } else {
                tokenize(&rhs, &rhs_alphabet)?
            };

            system.insert(lhs, rhs)?;
        }

        Ok(system)
    }

    /// Adds `lhs -> rhs`, refusing a second production for the same symbol.
    pub fn insert(&mut self, lhs: impl Into<String>, rhs: Vec<String>) -> Result<(), ConstructionError> {
        let lhs = lhs.into();
        if self.index.contains_key(&lhs) {
            return Err(ConstructionError::DuplicateProduction(lhs));
        }

        self.index.insert(lhs.clone(), self.productions.len());
        self.productions.push(Production { lhs, rhs });
        Ok(())
    }

    pub fn production(&self, symbol: &str) -> Option<&[String]> {
        self.index
            .get(symbol)
            .map(|&i| self.productions[i].rhs.as_slice())
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn halting_marker(&self) -> &str {
        &self.halting_marker
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Every symbol the system knows about, in first-seen order.
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.alphabet
            .iter()
            .chain(std::iter::once(&self.halting_marker))
            .chain(
                self.productions
                    .iter()
                    .flat_map(|p| std::iter::once(&p.lhs).chain(p.rhs.iter())),
            )
            .filter(|symbol| seen.insert(symbol.as_str()))
            .cloned()
            .collect()
    }

    /// Splits `text` into a word over [`TagSystem::symbols`].
    pub fn parse_word(&self, text: &str) -> Result<TagWord, ConstructionError> {
        tokenize(text, &self.symbols()).map(TagWord::new)
    }
}
