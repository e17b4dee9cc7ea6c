//! Clause structure search.
//!
//! - [`criterion`]: impurity of a literal's match/no-match split
//! - [`strategy`]: which scored candidate to keep
//! - [`builder`]: the greedy search that grows one clause

pub mod builder;
pub mod criterion;
pub mod strategy;

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::grammar::{ConstantPool, Mode, derive_constants, validate_mode_structure};
use crate::term::{Fact, Predicate};

pub use builder::{BuilderConfig, ClauseBuilder, LeafStatistics, LearnedClause, StopReason};
pub use criterion::Criterion;
pub use strategy::Strategy;

/// Everything fixed about a search before it starts: the target, the mode
/// declarations, each predicate's argument types, and the constant pool.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    pub target: Predicate,
    pub modes: Vec<Mode>,
    pub signatures: BTreeMap<Predicate, Vec<String>>,
    pub constants: ConstantPool,
}

impl SearchSpace {
    /// Validate the modes against `target` and derive constants from `background`.
    pub fn new(target: &str, modes: Vec<Mode>, background: &[Fact]) -> ConfigResult<Self> {
        if target.trim().is_empty() {
            return Err(ConfigError::MissingTarget);
        }
        let target = Predicate::new(target.trim());
        let signatures = validate_mode_structure(&modes)?;
        if !signatures.contains_key(&target) {
            return Err(ConfigError::NoTargetModes {
                target: target.to_string(),
            });
        }
        let constants = derive_constants(&modes, background);
        Ok(Self {
            target,
            modes,
            signatures,
            constants,
        })
    }

    /// Argument types of the target.
    pub fn target_signature(&self) -> &[String] {
        self.signatures
            .get(&self.target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Predicates that may appear in a body.
    pub fn body_predicate_count(&self, allow_recursion: bool) -> usize {
        self.signatures
            .keys()
            .filter(|p| allow_recursion || **p != self.target)
            .count()
    }
}
