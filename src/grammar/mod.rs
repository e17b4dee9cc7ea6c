//! Mode grammar: how relations may be used when forming candidate literals.
//!
//! A mode such as `moviegender(+movie,#gender)` says that the first argument
//! must be an already-bound variable of type `movie` and the second a known
//! constant of type `gender`. Modes are parsed from text by [`parser`];
//! constant pools are derived once from the background facts.

pub mod parser;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::term::{Fact, Predicate};

pub use parser::{parse_fact, parse_facts, parse_mode, parse_modes};

// ---------------------------------------------------------------------------
// Mode symbols
// ---------------------------------------------------------------------------

/// How one argument position of a mode may be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeSymbol {
    /// `+`: a variable already bound in the head or body.
    Input,
    /// `-`: a fresh variable, or any bound variable of the type.
    Output,
    /// `` ` ``: a fresh variable, or a body-local variable of the type.
    BodyOutput,
    /// `#`: a known constant of the type.
    Constant,
}

impl ModeSymbol {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Input),
            '-' => Some(Self::Output),
            '`' => Some(Self::BodyOutput),
            '#' => Some(Self::Constant),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Input => '+',
            Self::Output => '-',
            Self::BodyOutput => '`',
            Self::Constant => '#',
        }
    }
}

impl fmt::Display for ModeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// One typed argument slot of a mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeArg {
    pub symbol: ModeSymbol,
    pub type_name: String,
}

impl ModeArg {
    pub fn new(symbol: ModeSymbol, type_name: impl Into<String>) -> Self {
        Self {
            symbol,
            type_name: type_name.into(),
        }
    }
}

/// A mode declaration: a predicate and its typed, moded argument slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mode {
    pub predicate: Predicate,
    pub arguments: Vec<ModeArg>,
}

impl Mode {
    pub fn new(predicate: impl Into<Predicate>, arguments: Vec<ModeArg>) -> Self {
        Self {
            predicate: predicate.into(),
            arguments,
        }
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Argument type names in order, ignoring mode symbols.
    pub fn type_signature(&self) -> Vec<&str> {
        self.arguments
            .iter()
            .map(|a| a.type_name.as_str())
            .collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}{}", arg.symbol, arg.type_name)?;
        }
        f.write_str(").")
    }
}

/// Check that every mode of a predicate declares the same argument types.
///
/// Returns the shared signature of each predicate on success.
pub fn validate_mode_structure(modes: &[Mode]) -> ConfigResult<BTreeMap<Predicate, Vec<String>>> {
    let mut signatures: BTreeMap<Predicate, Vec<String>> = BTreeMap::new();
    for mode in modes {
        let signature: Vec<String> = mode.arguments.iter().map(|a| a.type_name.clone()).collect();
        match signatures.get(&mode.predicate) {
            Some(existing) if *existing != signature => {
                return Err(ConfigError::InconsistentModes {
                    predicate: mode.predicate.to_string(),
                });
            }
            Some(_) => {}
            None => {
                signatures.insert(mode.predicate.clone(), signature);
            }
        }
    }
    Ok(signatures)
}

// ---------------------------------------------------------------------------
// Constant pools
// ---------------------------------------------------------------------------

/// Known ground values per type, gathered from `#`-moded argument positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    by_type: BTreeMap<String, BTreeSet<String>>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, value: impl Into<String>) {
        self.by_type
            .entry(type_name.into())
            .or_default()
            .insert(value.into());
    }

    /// Constants of a type; empty when the type has none.
    pub fn values(&self, type_name: &str) -> impl Iterator<Item = &str> {
        self.by_type
            .get(type_name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn get(&self, type_name: &str) -> Option<&BTreeSet<String>> {
        self.by_type.get(type_name)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

/// Collect, for every `#` argument of every mode, the value found at that
/// position in each fact of the mode's predicate.
pub fn derive_constants<'a>(
    modes: &[Mode],
    facts: impl IntoIterator<Item = &'a Fact>,
) -> ConstantPool {
    let facts: Vec<&Fact> = facts.into_iter().collect();
    let mut pool = ConstantPool::new();
    for mode in modes {
        for (position, arg) in mode.arguments.iter().enumerate() {
            if arg.symbol != ModeSymbol::Constant {
                continue;
            }
            for fact in facts.iter().filter(|f| f.predicate == mode.predicate) {
                if let Some(value) = fact.arguments.get(position) {
                    pool.insert(arg.type_name.as_str(), value.as_str());
                }
            }
        }
    }
    pool
}
