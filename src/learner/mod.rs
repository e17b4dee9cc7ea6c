//! Rule learners: a classifier and a regressor over one target relation.
//!
//! Both learners validate their inputs, compile the background facts into a
//! [`FactStore`], and run the [`ClauseBuilder`] once per requested clause.
//! They differ only in how example weights become truth values and in their
//! default split criterion:
//!
//! | learner            | truth               | default criterion |
//! |--------------------|---------------------|-------------------|
//! | [`RuleClassifier`] | `1` if weight > 0   | Gini              |
//! | [`RuleRegressor`]  | the weight itself   | MSE               |

pub mod config;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, RulesError, RulesResult};
use crate::grammar::{Mode, parse_modes};
use crate::prover::{Prover, Weighting};
use crate::store::FactStore;
use crate::structure::{ClauseBuilder, Criterion, LeafStatistics, LearnedClause, SearchSpace};
use crate::term::{Example, Fact, Predicate};

pub use config::{LearnerConfig, Limit, ResolvedConfig};

// ---------------------------------------------------------------------------
// Learned rules
// ---------------------------------------------------------------------------

/// Result of a successful `fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedRules {
    pub target: Predicate,
    pub arity: usize,
    pub clauses: Vec<LearnedClause>,
}

impl LearnedRules {
    pub fn clauses(&self) -> &[LearnedClause] {
        &self.clauses
    }

    /// Per-clause leaf statistics, in clause order.
    pub fn leaf_statistics(&self) -> Vec<&[LeafStatistics]> {
        self.clauses.iter().map(|c| c.leaves.as_slice()).collect()
    }

    /// Leaf values averaged across clauses, one per example.
    fn average_leaf(&self, prover: &Prover<'_>, examples: &[Example]) -> Vec<f64> {
        let n = self.clauses.len().max(1) as f64;
        examples
            .iter()
            .map(|example| {
                self.clauses
                    .iter()
                    .map(|c| c.leaf_value(&c.strengths(prover, example, Weighting::Ignore)))
                    .sum::<f64>()
                    / n
            })
            .collect()
    }

    /// Weighted strength vectors of every clause, concatenated per example.
    fn features(&self, prover: &Prover<'_>, examples: &[Example]) -> Vec<Vec<f64>> {
        examples
            .iter()
            .map(|example| {
                self.clauses
                    .iter()
                    .flat_map(|c| c.strengths(prover, example, Weighting::Weighted))
                    .collect()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Shared learner core
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Classification,
    Regression,
}

impl Task {
    fn default_criterion(self) -> Criterion {
        match self {
            Task::Classification => Criterion::Gini,
            Task::Regression => Criterion::Mse,
        }
    }

    fn truth(self, weight: f64) -> f64 {
        match self {
            Task::Classification => {
                if weight > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Task::Regression => weight,
        }
    }
}

#[derive(Debug, Clone)]
struct LearnerCore {
    task: Task,
    modes: Vec<Mode>,
    target: String,
    config: LearnerConfig,
    rules: Option<LearnedRules>,
}

impl LearnerCore {
    fn new(task: Task, modes: Vec<Mode>, target: impl Into<String>, config: LearnerConfig) -> Self {
        Self {
            task,
            modes,
            target: target.into(),
            config,
            rules: None,
        }
    }

    fn fit_with_rng<R>(
        &mut self,
        examples: &[Example],
        background: &[Fact],
        rng: &mut R,
    ) -> RulesResult<&LearnedRules>
    where
        R: Rng + ?Sized,
    {
        let space = SearchSpace::new(&self.target, self.modes.clone(), background)?;
        let arity = space.target_signature().len();
        if examples.is_empty() {
            return Err(ConfigError::NoExamples.into());
        }
        check_examples(&space.target, arity, examples)?;

        let resolved = self.config.resolve(
            self.task.default_criterion(),
            examples.len(),
            space.body_predicate_count(self.config.allow_recursion),
        )?;
        let truth: Vec<Example> = examples
            .iter()
            .map(|e| e.clone().with_weight(self.task.truth(e.weight)))
            .collect();
        let store = FactStore::compile(background.iter().cloned());

        tracing::info!(
            predicate = %space.target,
            examples = examples.len(),
            predicates = space.signatures.len(),
            facts = background.len(),
            clauses = resolved.n_clauses,
            criterion = %resolved.builder.criterion,
            strategy = %resolved.builder.strategy,
            "fitting rule learner"
        );

        let builder = ClauseBuilder::new(&space, &store, &resolved.builder);
        let mut clauses = Vec::with_capacity(resolved.n_clauses);
        for index in 0..resolved.n_clauses {
            let sample = sample_examples(&truth, resolved.sample_size, rng);
            let learned = builder.build(&sample, rng);
            tracing::info!(
                index,
                clause = %learned.clause,
                literals = learned.clause.len(),
                stop = ?learned.stop,
                "learned clause"
            );
            clauses.push(learned);
        }

        Ok(&*self.rules.insert(LearnedRules {
            target: space.target.clone(),
            arity,
            clauses,
        }))
    }

    fn fitted(&self) -> RulesResult<&LearnedRules> {
        self.rules.as_ref().ok_or(RulesError::NotFitted)
    }

    fn average_leaf(&self, examples: &[Example], background: &[Fact]) -> RulesResult<Vec<f64>> {
        let rules = self.fitted()?;
        check_examples(&rules.target, rules.arity, examples)?;
        let store = FactStore::compile(background.iter().cloned());
        Ok(rules.average_leaf(&Prover::new(&store), examples))
    }

    fn extract_features(
        &self,
        examples: &[Example],
        background: &[Fact],
    ) -> RulesResult<Vec<Vec<f64>>> {
        let rules = self.fitted()?;
        check_examples(&rules.target, rules.arity, examples)?;
        let store = FactStore::compile(background.iter().cloned());
        Ok(rules.features(&Prover::new(&store), examples))
    }
}

fn check_examples(target: &Predicate, arity: usize, examples: &[Example]) -> ConfigResult<()> {
    for example in examples {
        if example.predicate != *target {
            return Err(ConfigError::ExampleTargetMismatch {
                example: example.to_string(),
                target: target.to_string(),
            });
        }
        if example.arity() != arity {
            return Err(ConfigError::ExampleArity {
                example: example.to_string(),
                expected: arity,
                actual: example.arity(),
            });
        }
    }
    Ok(())
}

/// Uniform subset of `size` examples, kept in input order.
fn sample_examples<R>(examples: &[Example], size: usize, rng: &mut R) -> Vec<Example>
where
    R: Rng + ?Sized,
{
    if size >= examples.len() {
        return examples.to_vec();
    }
    let mut picked = index::sample(rng, examples.len(), size).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| examples[i].clone()).collect()
}

// ---------------------------------------------------------------------------
// Public learners
// ---------------------------------------------------------------------------

/// Common surface of the classifier and the regressor.
pub trait RuleLearner {
    fn config(&self) -> &LearnerConfig;

    /// Learn clauses using the caller's RNG.
    fn fit_with_rng<R>(
        &mut self,
        examples: &[Example],
        background: &[Fact],
        rng: &mut R,
    ) -> RulesResult<&LearnedRules>
    where
        R: Rng + ?Sized;

    /// Learn clauses with an RNG seeded from the config, or from entropy.
    fn fit(&mut self, examples: &[Example], background: &[Fact]) -> RulesResult<&LearnedRules> {
        let mut rng = match self.config().seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.fit_with_rng(examples, background, &mut rng)
    }

    fn predict(&self, examples: &[Example], background: &[Fact]) -> RulesResult<Vec<f64>>;

    /// One feature row per example: the weighted match strengths of every
    /// literal of every clause.
    fn extract_features(
        &self,
        examples: &[Example],
        background: &[Fact],
    ) -> RulesResult<Vec<Vec<f64>>>;

    /// Learned rules, if `fit` has succeeded.
    fn rules(&self) -> Option<&LearnedRules>;
}

/// Learns rules separating positive (weight > 0) from negative examples.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    core: LearnerCore,
}

impl RuleClassifier {
    pub fn new(modes: Vec<Mode>, target: impl Into<String>, config: LearnerConfig) -> Self {
        Self {
            core: LearnerCore::new(Task::Classification, modes, target, config),
        }
    }

    /// Parse mode lines, then construct.
    pub fn from_mode_lines<I, S>(
        modes: I,
        target: impl Into<String>,
        config: LearnerConfig,
    ) -> RulesResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(parse_modes(modes)?, target, config))
    }

    /// Probability-like score in `[0, 1]` per example.
    pub fn predict_proba(
        &self,
        examples: &[Example],
        background: &[Fact],
    ) -> RulesResult<Vec<f64>> {
        self.core.average_leaf(examples, background)
    }
}

impl RuleLearner for RuleClassifier {
    fn config(&self) -> &LearnerConfig {
        &self.core.config
    }

    fn fit_with_rng<R>(
        &mut self,
        examples: &[Example],
        background: &[Fact],
        rng: &mut R,
    ) -> RulesResult<&LearnedRules>
    where
        R: Rng + ?Sized,
    {
        self.core.fit_with_rng(examples, background, rng)
    }

    /// `1.0` where the score is at least 0.5, else `0.0`.
    fn predict(&self, examples: &[Example], background: &[Fact]) -> RulesResult<Vec<f64>> {
        Ok(self
            .predict_proba(examples, background)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    fn extract_features(
        &self,
        examples: &[Example],
        background: &[Fact],
    ) -> RulesResult<Vec<Vec<f64>>> {
        self.core.extract_features(examples, background)
    }

    fn rules(&self) -> Option<&LearnedRules> {
        self.core.rules.as_ref()
    }
}

/// Learns rules whose leaves estimate a real-valued example weight.
#[derive(Debug, Clone)]
pub struct RuleRegressor {
    core: LearnerCore,
}

impl RuleRegressor {
    pub fn new(modes: Vec<Mode>, target: impl Into<String>, config: LearnerConfig) -> Self {
        Self {
            core: LearnerCore::new(Task::Regression, modes, target, config),
        }
    }

    /// Parse mode lines, then construct.
    pub fn from_mode_lines<I, S>(
        modes: I,
        target: impl Into<String>,
        config: LearnerConfig,
    ) -> RulesResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(parse_modes(modes)?, target, config))
    }
}

impl RuleLearner for RuleRegressor {
    fn config(&self) -> &LearnerConfig {
        &self.core.config
    }

    fn fit_with_rng<R>(
        &mut self,
        examples: &[Example],
        background: &[Fact],
        rng: &mut R,
    ) -> RulesResult<&LearnedRules>
    where
        R: Rng + ?Sized,
    {
        self.core.fit_with_rng(examples, background, rng)
    }

    fn predict(&self, examples: &[Example], background: &[Fact]) -> RulesResult<Vec<f64>> {
        self.core.average_leaf(examples, background)
    }

    fn extract_features(
        &self,
        examples: &[Example],
        background: &[Fact],
    ) -> RulesResult<Vec<Vec<f64>>> {
        self.core.extract_features(examples, background)
    }

    fn rules(&self) -> Option<&LearnedRules> {
        self.core.rules.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_facts;

    fn birds() -> (Vec<Fact>, Vec<Example>) {
        let background = parse_facts(["bird(tweety).", "bird(polly).", "cat(tom)."]).unwrap();
        let examples = parse_facts([
            "flies(tweety).",
            "flies(polly).",
            "0.0::flies(tom).",
            "0.0::flies(rex).",
        ])
        .unwrap();
        (background, examples)
    }

    fn classifier(config: LearnerConfig) -> RuleClassifier {
        RuleClassifier::from_mode_lines(
            ["flies(+animal).", "bird(+animal).", "cat(+animal)."],
            "flies",
            config,
        )
        .unwrap()
    }

    #[test]
    fn classifier_fits_and_predicts() {
        let (background, examples) = birds();
        let mut learner = classifier(LearnerConfig::default().with_seed(1));
        let rules = learner.fit(&examples, &background).unwrap();
        assert_eq!(rules.clauses().len(), 1);
        assert_eq!(rules.clauses()[0].clause.to_string(), "bird(A)");

        let queries = parse_facts(["flies(polly).", "flies(tom)."]).unwrap();
        assert_eq!(learner.predict_proba(&queries, &background).unwrap(), vec![1.0, 0.0]);
        assert_eq!(learner.predict(&queries, &background).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn classifier_treats_any_positive_weight_as_true() {
        let (background, _) = birds();
        let examples = parse_facts([
            "0.3::flies(tweety).",
            "7.0::flies(polly).",
            "0.0::flies(tom).",
            "0.0::flies(rex).",
        ])
        .unwrap();
        let mut learner = classifier(LearnerConfig::default().with_seed(1));
        let rules = learner.fit(&examples, &background).unwrap();
        assert_eq!(rules.clauses()[0].leaves[0].matched, 1.0);
    }

    #[test]
    fn regressor_keeps_raw_weights() {
        let background = parse_facts(["big(a).", "big(b).", "small(c).", "small(d)."]).unwrap();
        let examples = parse_facts([
            "10.0::mass(a).",
            "12.0::mass(b).",
            "1.0::mass(c).",
            "1.0::mass(d).",
        ])
        .unwrap();
        let mut learner = RuleRegressor::from_mode_lines(
            ["mass(+thing).", "big(+thing).", "small(+thing)."],
            "mass",
            LearnerConfig::default().with_seed(5).with_max_literals(1),
        )
        .unwrap();
        let rules = learner.fit(&examples, &background).unwrap();
        let leaf = rules.clauses()[0].leaves[0];
        let (high, low) = if rules.clauses()[0].clause.to_string() == "big(A)" {
            (leaf.matched, leaf.unmatched)
        } else {
            (leaf.unmatched, leaf.matched)
        };
        assert_eq!(high, 11.0);
        assert_eq!(low, 1.0);

        let predictions = learner.predict(&examples, &background).unwrap();
        assert_eq!(predictions, vec![11.0, 11.0, 1.0, 1.0]);
    }

    #[test]
    fn several_clauses_are_averaged() {
        let (background, examples) = birds();
        let mut learner = classifier(LearnerConfig::default().with_seed(9).with_n_clauses(3));
        let rules = learner.fit(&examples, &background).unwrap();
        assert_eq!(rules.clauses().len(), 3);
        assert_eq!(rules.leaf_statistics().len(), 3);
        let scores = learner.predict_proba(&examples, &background).unwrap();
        assert_eq!(scores, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn sample_ratio_learns_each_clause_on_a_subset() {
        use crate::structure::StopReason;

        // Half of the four examples per clause: a mixed pair is split by one
        // literal, a pure pair leaves nothing to improve.
        let (background, examples) = birds();
        let config = LearnerConfig::default()
            .with_sample_ratio(0.5)
            .with_n_clauses(20)
            .with_seed(21);
        let mut learner = classifier(config);
        let rules = learner.fit(&examples, &background).unwrap();
        assert_eq!(rules.clauses().len(), 20);

        for learned in rules.clauses() {
            if learned.prior == 0.5 {
                assert_eq!(learned.stop, StopReason::Pure);
                let leaf = learned.leaves[0];
                match learned.clause.to_string().as_str() {
                    "bird(A)" => assert_eq!((leaf.matched, leaf.unmatched), (1.0, 0.0)),
                    "cat(A)" => assert_eq!((leaf.matched, leaf.unmatched), (0.0, 1.0)),
                    other => panic!("unexpected clause {other}"),
                }
            } else {
                assert!(learned.prior == 0.0 || learned.prior == 1.0);
                assert!(learned.clause.is_empty());
                assert_eq!(learned.stop, StopReason::NoImprovement);
            }
        }
        assert!(rules.clauses().iter().any(|c| c.prior != 0.5));
    }

    #[test]
    fn sampling_draws_a_subset_in_input_order() {
        let (_, examples) = birds();
        let mut rng = StdRng::seed_from_u64(4);
        let sample = sample_examples(&examples, 2, &mut rng);
        assert_eq!(sample.len(), 2);
        let positions: Vec<usize> = sample
            .iter()
            .map(|s| examples.iter().position(|e| e == s).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        assert_eq!(sample_examples(&examples, 10, &mut rng), examples);
    }

    #[test]
    fn predicting_before_fit_fails() {
        let (background, examples) = birds();
        let learner = classifier(LearnerConfig::default());
        assert!(matches!(
            learner.predict(&examples, &background),
            Err(RulesError::NotFitted)
        ));
        assert!(matches!(
            learner.extract_features(&examples, &background),
            Err(RulesError::NotFitted)
        ));
        assert!(learner.rules().is_none());
    }

    #[test]
    fn fit_validates_examples() {
        let (background, _) = birds();
        let mut learner = classifier(LearnerConfig::default());

        let err = learner.fit(&[], &background).unwrap_err();
        assert!(matches!(err, RulesError::Config(ConfigError::NoExamples)));

        let wrong_target = parse_facts(["swims(nemo)."]).unwrap();
        let err = learner.fit(&wrong_target, &background).unwrap_err();
        assert!(matches!(
            err,
            RulesError::Config(ConfigError::ExampleTargetMismatch { .. })
        ));

        let wrong_arity = parse_facts(["flies(a, b)."]).unwrap();
        let err = learner.fit(&wrong_arity, &background).unwrap_err();
        assert!(matches!(
            err,
            RulesError::Config(ConfigError::ExampleArity { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn fit_validates_modes_and_target() {
        let (background, examples) = birds();
        let mut missing =
            RuleClassifier::from_mode_lines(["bird(+animal)."], "flies", LearnerConfig::default())
                .unwrap();
        assert!(matches!(
            missing.fit(&examples, &background),
            Err(RulesError::Config(ConfigError::NoTargetModes { .. }))
        ));

        let mut unnamed = classifier(LearnerConfig::default());
        unnamed.core.target = String::new();
        assert!(matches!(
            unnamed.fit(&examples, &background),
            Err(RulesError::Config(ConfigError::MissingTarget))
        ));
    }

    #[test]
    fn bad_mode_lines_surface_grammar_errors() {
        let err =
            RuleClassifier::from_mode_lines(["flies(*animal)."], "flies", LearnerConfig::default())
                .unwrap_err();
        assert!(matches!(err, RulesError::Grammar(_)));
    }
}
