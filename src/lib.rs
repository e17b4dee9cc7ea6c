//! # relrules
//!
//! Greedy induction of relational rules from weighted examples and
//! background facts.
//!
//! A learner searches for a clause, one literal at a time, whose match/no-match
//! splits best separate the examples of a target relation. Each accepted
//! literal is a step of a decision path, and the leaves record the mean truth
//! on both sides of each split.
//!
//! ## Architecture
//!
//! - **Terms** (`term`): variables, constants, literals, clauses, weighted facts
//! - **Grammar** (`grammar`): fact and mode parsing, constant pools
//! - **Fact store** (`store`): facts compiled into per-predicate relations
//! - **Prover** (`prover`): set-based clause proving with weight aggregation
//! - **Candidates** (`candidates`, `variables`): mode-driven literal generation
//! - **Structure search** (`structure`): criteria, strategies, clause builder
//! - **Learners** (`learner`): classifier and regressor over the builder
//!
//! ## Library usage
//!
//! ```no_run
//! use relrules::grammar::parse_facts;
//! use relrules::learner::{LearnerConfig, RuleClassifier, RuleLearner};
//!
//! let background = parse_facts(["bird(tweety).", "cat(tom)."]).unwrap();
//! let examples = parse_facts(["flies(tweety).", "0.0::flies(tom)."]).unwrap();
//!
//! let mut learner = RuleClassifier::from_mode_lines(
//!     ["flies(+animal).", "bird(+animal).", "cat(+animal)."],
//!     "flies",
//!     LearnerConfig::default().with_seed(7),
//! )
//! .unwrap();
//! let rules = learner.fit(&examples, &background).unwrap();
//! println!("flies(A) :- {}", rules.clauses()[0].clause);
//! ```

pub mod candidates;
pub mod error;
pub mod grammar;
pub mod learner;
pub mod prover;
pub mod store;
pub mod structure;
pub mod term;
pub mod variables;

pub use error::{ConfigError, GrammarError, RulesError, RulesResult};
pub use learner::{LearnedRules, LearnerConfig, RuleClassifier, RuleLearner, RuleRegressor};
pub use term::{Clause, Example, Fact, Literal, Predicate, Term};
