//! Learner configuration, persisted as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::structure::{BuilderConfig, Criterion, Strategy};

/// A count, or a fraction of some total.
///
/// In TOML an integer is a count and a float is a fraction in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    Count(usize),
    Fraction(f64),
}

impl Limit {
    fn check_fraction(name: &'static str, fraction: f64) -> ConfigResult<()> {
        if fraction > 0.0 && fraction <= 1.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidFraction {
                name,
                value: fraction,
            })
        }
    }

    fn check_count(name: &'static str, count: usize) -> ConfigResult<usize> {
        if count >= 1 {
            Ok(count)
        } else {
            Err(ConfigError::InvalidLimit {
                name,
                value: count.to_string(),
                minimum: 1,
            })
        }
    }

    /// Resolve against `total`, rounding fractions down.
    fn floor(self, name: &'static str, total: usize) -> ConfigResult<usize> {
        match self {
            Limit::Count(count) => Self::check_count(name, count),
            Limit::Fraction(fraction) => {
                Self::check_fraction(name, fraction)?;
                Self::check_count(name, (fraction * total as f64).floor() as usize)
            }
        }
    }

    /// Resolve against `total`, rounding fractions up.
    fn ceil(self, name: &'static str, total: usize) -> ConfigResult<usize> {
        match self {
            Limit::Count(count) => Self::check_count(name, count),
            Limit::Fraction(fraction) => {
                Self::check_fraction(name, fraction)?;
                Self::check_count(name, (fraction * total as f64).ceil() as usize)
            }
        }
    }
}

/// Configuration for [`RuleClassifier`](super::RuleClassifier) and
/// [`RuleRegressor`](super::RuleRegressor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Split criterion. `None` uses the learner's default: Gini for the
    /// classifier, MSE for the regressor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criterion: Option<Criterion>,
    /// Candidate selection strategy (default: best).
    pub strategy: Strategy,
    /// Maximum literals per clause (default: unlimited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_literals: Option<usize>,
    /// Predicates sampled per search round (default: all).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_predicates: Option<Limit>,
    /// Stop growing once fewer examples remain covered (default: 1).
    pub min_examples_learn: Limit,
    /// Independent clauses to learn (default: 1).
    pub n_clauses: usize,
    /// Fraction of examples each clause is learned on (default: 1.0).
    pub sample_ratio: f64,
    /// Allow the target in its own body (default: false).
    pub allow_recursion: bool,
    /// RNG seed for `fit`; `None` seeds from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            criterion: None,
            strategy: Strategy::Best,
            max_literals: None,
            max_predicates: None,
            min_examples_learn: Limit::Count(1),
            n_clauses: 1,
            sample_ratio: 1.0,
            allow_recursion: false,
            seed: None,
        }
    }
}

/// Limits resolved against a concrete problem.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub builder: BuilderConfig,
    pub n_clauses: usize,
    /// Examples drawn for each clause.
    pub sample_size: usize,
}

impl LearnerConfig {
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_literals(mut self, max_literals: usize) -> Self {
        self.max_literals = Some(max_literals);
        self
    }

    pub fn with_max_predicates(mut self, limit: Limit) -> Self {
        self.max_predicates = Some(limit);
        self
    }

    pub fn with_min_examples(mut self, limit: Limit) -> Self {
        self.min_examples_learn = limit;
        self
    }

    pub fn with_n_clauses(mut self, n_clauses: usize) -> Self {
        self.n_clauses = n_clauses;
        self
    }

    pub fn with_sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = ratio;
        self
    }

    pub fn with_recursion(mut self, allow: bool) -> Self {
        self.allow_recursion = allow;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every limit and resolve fractions.
    ///
    /// `examples` is the number of training examples and `predicates` the
    /// number of predicates eligible for a body.
    pub fn resolve(
        &self,
        default_criterion: Criterion,
        examples: usize,
        predicates: usize,
    ) -> ConfigResult<ResolvedConfig> {
        let max_literals = match self.max_literals {
            Some(0) => {
                return Err(ConfigError::InvalidLimit {
                    name: "max_literals",
                    value: "0".into(),
                    minimum: 1,
                });
            }
            other => other,
        };
        let max_predicates = self
            .max_predicates
            .map(|limit| limit.floor("max_predicates", predicates))
            .transpose()?;
        let min_examples = self.min_examples_learn.ceil("min_examples_learn", examples)?;
        if self.n_clauses == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "n_clauses",
                value: "0".into(),
                minimum: 1,
            });
        }
        Limit::check_fraction("sample_ratio", self.sample_ratio)?;
        let sample_size =
            ((self.sample_ratio * examples as f64).ceil() as usize).clamp(1, examples.max(1));

        Ok(ResolvedConfig {
            builder: BuilderConfig {
                max_literals,
                max_predicates,
                min_examples,
                criterion: self.criterion.unwrap_or(default_criterion),
                strategy: self.strategy,
                allow_recursion: self.allow_recursion,
            },
            n_clauses: self.n_clauses,
            sample_size,
        })
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigParse {
            path: "<string>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ConfigWrite {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::ConfigWrite {
            path: path.display().to_string(),
            source: e,
        })
    }
}
