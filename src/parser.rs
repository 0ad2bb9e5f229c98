//! This module provides the parser for machine definition files and production strings,
//! utilizing the `pest` crate. The grammar lives in `grammar.pest`.

use crate::{
    analyzer::analyze,
    machine::{MachineDefinition, TransitionRule},
    types::{ConstructionError, Direction, Error, DEFAULT_BLANK_SYMBOL},
};
use pest::{
    error::{Error as PestError, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// A piece of a canonical pattern or template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A `($k)` placeholder, holding `k`.
    Variable(String),
    /// Literal text between placeholders.
    Literal(String),
}

/// Parses a machine definition file into a [`MachineDefinition`].
///
/// The parsed definition is validated before being returned, so a successful result can
/// be handed to any engine constructor.
pub fn parse(input: &str) -> Result<MachineDefinition, Error> {
    let mut pairs = DefinitionParser::parse(Rule::definition, input.trim())
        .map_err(|e| Error::ParseError(Box::new(e)))?;

    let definition = match pairs.next() {
        Some(root) => parse_definition(root)?,
        None => return Err(ConstructionError::MissingSection("transition_table".into()).into()),
    };

    analyze(&definition)?;

    Ok(definition)
}

/// Collects the sections of a definition, rejecting any section declared twice.
fn parse_definition(pair: Pair<Rule>) -> Result<MachineDefinition, Error> {
    let mut name = None;
    let mut states = None;
    let mut input_symbols = None;
    let mut tape_symbols = None;
    let mut blank = None;
    let mut start_state = None;
    let mut accept_states = None;
    let mut initial_tape = None;
    let mut transitions = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        if rule == Rule::EOI {
            continue;
        }
        if !seen.insert(rule) {
            return Err(parse_error(
                &format!("Duplicate \"{}\" declaration", section_name(rule)),
                span,
            ));
        }

        match rule {
            Rule::name_header => name = Some(parse_text(p)),
            Rule::states_header => states = Some(parse_tokens(p)),
            Rule::input_header => input_symbols = Some(parse_symbols(p)?),
            Rule::symbols_header => tape_symbols = Some(parse_symbols(p)?),
            Rule::blank_header => blank = parse_symbols(p)?.first().copied(),
            Rule::initial_header => start_state = parse_tokens(p).into_iter().next(),
            Rule::accept_header => accept_states = Some(parse_tokens(p)),
            Rule::tape_header => initial_tape = Some(parse_tokens(p).concat()),
            Rule::table => transitions = Some(parse_transitions(p)?),
            _ => {}
        }
    }

    let blank = blank.unwrap_or(DEFAULT_BLANK_SYMBOL);
    let tape_symbols = require(tape_symbols, "symbols")?;
    let input_symbols = input_symbols.unwrap_or_else(|| {
        tape_symbols
            .iter()
            .copied()
            .filter(|&symbol| symbol != blank)
            .collect()
    });

    Ok(MachineDefinition {
        name: name.unwrap_or_else(|| "Untitled".to_string()),
        states: require(states, "states")?,
        input_symbols,
        tape_symbols,
        blank,
        start_state: require(start_state, "initial_state")?,
        accept_states: accept_states.unwrap_or_default(),
        initial_tape: initial_tape.unwrap_or_default(),
        transitions: require(transitions, "transition_table")?,
    })
}

/// Parses the `#transition_table` section, one `state read next write dir` row per line.
fn parse_transitions(pair: Pair<Rule>) -> Result<Vec<TransitionRule>, Error> {
    let mut transitions = Vec::new();

    for row in pair.into_inner() {
        let span = row.as_span();
        let fields: Vec<Pair<Rule>> = row.into_inner().collect();
        let [state, read, next_state, write, direction] = fields.as_slice() else {
            return Err(parse_error("Expected `state read next write direction`", span));
        };

        transitions.push(TransitionRule {
            state: state.as_str().to_string(),
            read: parse_symbol(read)?,
            next_state: next_state.as_str().to_string(),
            write: parse_symbol(write)?,
            direction: Direction::parse(direction.as_str())?,
        });
    }

    Ok(transitions)
}

/// Parses a production string `lhs -> rhs` into its trimmed sides.
pub fn parse_production(input: &str) -> Result<(String, String), Error> {
    let mut pairs = DefinitionParser::parse(Rule::production, input.trim())
        .map_err(|_| ConstructionError::MalformedProduction(input.to_string()))?;

    let mut sides = pairs
        .next()
        .map(|p| p.into_inner())
        .into_iter()
        .flatten()
        .filter(|p| matches!(p.as_rule(), Rule::lhs | Rule::rhs))
        .map(|p| p.as_str().trim().to_string());

    match (sides.next(), sides.next()) {
        (Some(lhs), Some(rhs)) if !lhs.is_empty() && !rhs.is_empty() => Ok((lhs, rhs)),
        _ => Err(ConstructionError::MalformedProduction(input.to_string()).into()),
    }
}

/// Splits a canonical pattern or template into literals and `($k)` variables.
pub fn parse_template(input: &str) -> Result<Vec<Segment>, Error> {
    let pairs = DefinitionParser::parse(Rule::template, input)
        .map_err(|e| Error::ParseError(Box::new(e)))?;

    Ok(pairs
        .flatten()
        .filter_map(|p| match p.as_rule() {
            Rule::variable => {
                let text = p.as_str();
                Some(Segment::Variable(text[2..text.len() - 1].to_string()))
            }
            Rule::literal => Some(Segment::Literal(p.as_str().to_string())),
            _ => None,
        })
        .collect())
}

/// Splits `text` into symbols of `alphabet`, preferring the longest symbol at each position.
///
/// Whitespace between symbols is ignored.
pub fn tokenize(text: &str, alphabet: &[String]) -> Result<Vec<String>, ConstructionError> {
    let mut symbols = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let symbol = alphabet
            .iter()
            .filter(|symbol| !symbol.is_empty() && rest.starts_with(symbol.as_str()))
            .max_by_key(|symbol| symbol.len())
            .ok_or_else(|| {
                let unknown = rest.chars().next().map(String::from).unwrap_or_default();
                ConstructionError::UndefinedSymbol(unknown)
            })?;

        symbols.push(symbol.clone());
        rest = rest[symbol.len()..].trim_start();
    }

    Ok(symbols)
}

/// Creates an `Error::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> Error {
    Error::ParseError(Box::new(PestError::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

fn parse_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .map(|p| p.as_str().trim().to_string())
        .next()
        .unwrap_or_default()
}

/// Flattens the `token` pairs below a header.
fn parse_tokens(pair: Pair<Rule>) -> Vec<String> {
    tokens_of(pair.into_inner())
}

fn tokens_of(pairs: Pairs<Rule>) -> Vec<String> {
    pairs
        .flatten()
        .filter(|p| p.as_rule() == Rule::token)
        .map(|p| p.as_str().to_string())
        .collect()
}

fn parse_symbols(pair: Pair<Rule>) -> Result<Vec<char>, Error> {
    pair.into_inner()
        .flatten()
        .filter(|p| p.as_rule() == Rule::token)
        .map(|p| parse_symbol(&p))
        .collect()
}

/// Parses a token that must be exactly one character.
fn parse_symbol(pair: &Pair<Rule>) -> Result<char, Error> {
    let mut chars = pair.as_str().chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(parse_error(
            &format!("Symbol must be a single character: {}", pair.as_str()),
            pair.as_span(),
        )),
    }
}

fn require<T>(value: Option<T>, section: &str) -> Result<T, Error> {
    value.ok_or_else(|| ConstructionError::MissingSection(section.to_string()).into())
}

fn section_name(rule: Rule) -> &'static str {
    match rule {
        Rule::name_header => "#name:",
        Rule::states_header => "#states:",
        Rule::input_header => "#input_symbols:",
        Rule::symbols_header => "#symbols:",
        Rule::blank_header => "#blank:",
        Rule::initial_header => "#initial_state:",
        Rule::accept_header => "#accept_states:",
        Rule::tape_header => "#initial_tape:",
        _ => "#transition_table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOGGLE: &str = r#"
// Flips every bit, then accepts on the first blank.
#name: Toggle
#states: q0 q1
#symbols: 0 1 _
#initial_state: q0
#accept_states: q1
#initial_tape: 1010
#transition_table
q0 0 q0 1 R
q0 1 q0 0 R
q0 _ q1 _ L
"#;

    #[test]
    fn test_parse_simple_definition() {
        let definition = parse(TOGGLE).unwrap();

        assert_eq!(definition.name, "Toggle");
        assert_eq!(definition.states, vec!["q0", "q1"]);
        assert_eq!(definition.tape_symbols, vec!['0', '1', '_']);
        assert_eq!(definition.input_symbols, vec!['0', '1']);
        assert_eq!(definition.blank, DEFAULT_BLANK_SYMBOL);
        assert_eq!(definition.start_state, "q0");
        assert_eq!(definition.accept_states, vec!["q1"]);
        assert_eq!(definition.initial_tape, "1010");
        assert_eq!(definition.transitions.len(), 3);
        assert_eq!(
            definition.transitions[2],
            TransitionRule::new("q0", '_', "q1", '_', Direction::Left)
        );
    }

    #[test]
    fn test_parse_custom_blank_and_inline_comments() {
        let input = r#"
#name: Dots
#states: s h
#symbols: . x
#blank: .
#initial_state: s   // starts here
#accept_states: h
#transition_table
s x s . >
s . h . <
"#;
        let definition = parse(input).unwrap();

        assert_eq!(definition.blank, '.');
        assert_eq!(definition.start_state, "s");
        assert_eq!(definition.initial_tape, "");
        assert_eq!(definition.transitions[0].direction, Direction::Right);
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = TOGGLE.replace("#name: Toggle", "#name: Toggle\n#name: Again");
        let error = parse(&input).unwrap_err();

        assert!(matches!(error, Error::ParseError(_)));
        assert!(error.to_string().contains("Duplicate \"#name:\" declaration"));
    }

    #[test]
    fn test_parse_missing_initial_state() {
        let input = TOGGLE.replace("#initial_state: q0\n", "");

        assert_eq!(
            parse(&input),
            Err(ConstructionError::MissingSection("initial_state".into()).into())
        );
    }

    #[test]
    fn test_parse_unsupported_direction() {
        let input = TOGGLE.replace("q0 _ q1 _ L", "q0 _ q1 _ S");

        assert_eq!(
            parse(&input),
            Err(ConstructionError::UnsupportedDirection("S".into()).into())
        );
    }

    #[test]
    fn test_parse_multi_character_symbol() {
        let input = TOGGLE.replace("q0 1 q0 0 R", "q0 10 q0 0 R");
        let error = parse(&input).unwrap_err();

        assert!(error.to_string().contains("single character"));
    }

    #[test]
    fn test_parse_validates_states() {
        let input = TOGGLE.replace("q0 _ q1 _ L", "q0 _ q9 _ L");

        assert_eq!(
            parse(&input),
            Err(ConstructionError::UndefinedState("q9".into()).into())
        );
    }

    #[test]
    fn test_parse_missing_table() {
        let input = "#name: Nothing\n#states: a\n";

        assert!(matches!(parse(input), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_parse_production() {
        assert_eq!(
            parse_production("a1 -> a2a1a3"),
            Ok(("a1".to_string(), "a2a1a3".to_string()))
        );
        assert_eq!(
            parse_production("  X  ->  _ "),
            Ok(("X".to_string(), "_".to_string()))
        );
        assert_eq!(
            parse_production("a1 a2"),
            Err(ConstructionError::MalformedProduction("a1 a2".into()).into())
        );
        assert!(parse_production("-> a").is_err());
    }

    #[test]
    fn test_parse_template() {
        assert_eq!(
            parse_template("($1)11P($2)($1)").unwrap(),
            vec![
                Segment::Variable("1".into()),
                Segment::Literal("11P".into()),
                Segment::Variable("2".into()),
                Segment::Variable("1".into()),
            ]
        );
        assert_eq!(parse_template("").unwrap(), vec![]);
    }

    #[test]
    fn test_tokenize_prefers_longest_symbol() {
        let alphabet = vec!["a".to_string(), "a1".to_string(), "a2".to_string()];

        assert_eq!(
            tokenize("a2a1 a", &alphabet),
            Ok(vec!["a2".to_string(), "a1".to_string(), "a".to_string()])
        );
        assert_eq!(
            tokenize("a3", &alphabet),
            Err(ConstructionError::UndefinedSymbol("3".into()))
        );
    }
}
