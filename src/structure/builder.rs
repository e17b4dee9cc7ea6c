//! Greedy clause construction.
//!
//! The builder grows one clause a literal at a time, like a single path of a
//! decision tree over relational data. Each round it samples the eligible
//! predicates, generates every admissible candidate, scores each by the
//! impurity of its match/no-match split over the examples still covered, and
//! keeps the selected one only if it improves on the previous step.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::candidates::{CandidateGenerator, TypedScope, search_order};
use crate::prover::{Bindings, Prover, Weighting};
use crate::store::{FactStore, FactView, RowRef};
use crate::term::{Clause, Example, Fact, Literal, Predicate, Term};
use crate::variables::VariableAllocator;

use super::SearchSpace;
use super::criterion::{Criterion, partition};
use super::strategy::Strategy;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Resolved limits for one clause search.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Maximum literals in the clause; `None` grows until another stop fires.
    pub max_literals: Option<usize>,
    /// Predicates sampled per round; `None` considers all of them.
    pub max_predicates: Option<usize>,
    /// Stop once fewer examples than this remain covered (default: 1).
    pub min_examples: usize,
    pub criterion: Criterion,
    pub strategy: Strategy,
    /// Whether the target may appear in its own body (default: false).
    pub allow_recursion: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_literals: None,
            max_predicates: None,
            min_examples: 1,
            criterion: Criterion::Gini,
            strategy: Strategy::Best,
            allow_recursion: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Mean true weight on each side of an accepted split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafStatistics {
    pub matched: f64,
    pub unmatched: f64,
}

/// Why a clause search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No admissible candidate literal exists.
    Exhausted,
    /// The strategy declined every candidate.
    NoViableCandidate,
    /// The selected candidate did not lower the impurity.
    NoImprovement,
    /// The clause reached `max_literals`.
    MaxLiterals,
    /// Fewer than `min_examples` examples remain covered.
    TooFewExamples,
    /// Every covered example has the same true weight.
    Pure,
}

/// One learned clause with the statistics of each accepted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedClause {
    /// Head variables, one per target argument.
    pub head: Vec<String>,
    pub clause: Clause,
    /// One entry per literal of `clause`.
    pub leaves: Vec<LeafStatistics>,
    /// Mean true weight over the examples the clause was learned on.
    pub prior: f64,
    pub stop: StopReason,
}

impl LearnedClause {
    /// Initial bindings of the head variables for one example.
    pub fn head_bindings(&self, example: &Example) -> Bindings {
        Bindings::from_head(&self.head, &example.arguments)
    }

    /// Match strength after each literal for one example.
    pub fn strengths(
        &self,
        prover: &Prover<'_>,
        example: &Example,
        weighting: Weighting,
    ) -> Vec<f64> {
        prover.prove(&self.head_bindings(example), self.clause.literals(), weighting)
    }

    /// Mean true weight of the leaf that `strengths` end in.
    ///
    /// The first failing literal `k` selects the unmatched side of step `k`;
    /// a full match selects the matched side of the last step.
    pub fn leaf_value(&self, strengths: &[f64]) -> f64 {
        match strengths.iter().position(|s| *s <= 0.0) {
            Some(k) => self.leaves.get(k).map_or(self.prior, |leaf| leaf.unmatched),
            None => self.leaves.last().map_or(self.prior, |leaf| leaf.matched),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct Scored {
    literal: Literal,
    strengths: Vec<f64>,
}

/// Grows a single clause for the target of a [`SearchSpace`].
pub struct ClauseBuilder<'a> {
    space: &'a SearchSpace,
    store: &'a FactStore,
    config: &'a BuilderConfig,
}

impl<'a> ClauseBuilder<'a> {
    pub fn new(space: &'a SearchSpace, store: &'a FactStore, config: &'a BuilderConfig) -> Self {
        Self {
            space,
            store,
            config,
        }
    }

    /// Predicates that may appear in the body.
    fn body_predicates(&self) -> Vec<Predicate> {
        self.space
            .signatures
            .keys()
            .filter(|p| self.config.allow_recursion || **p != self.space.target)
            .cloned()
            .collect()
    }

    /// Random subset of the body predicates for one round.
    fn sample_predicates<R>(&self, predicates: &[Predicate], rng: &mut R) -> BTreeSet<Predicate>
    where
        R: Rng + ?Sized,
    {
        let mut shuffled = predicates.to_vec();
        shuffled.shuffle(rng);
        if let Some(limit) = self.config.max_predicates {
            shuffled.truncate(limit);
        }
        shuffled.into_iter().collect()
    }

    /// Store used while searching, plus the row each example must not see.
    ///
    /// With recursion enabled, examples with non-zero weight join the target
    /// relation, and each example's own row is hidden when it is proved.
    fn search_store(&self, examples: &[Example]) -> (FactStore, Vec<Option<RowRef>>) {
        if !self.config.allow_recursion {
            return (self.store.clone(), vec![None; examples.len()]);
        }

        let target = &self.space.target;
        let mut next_row = self.store.relation(target).map_or(0, |r| r.len());
        let mut own_rows = Vec::with_capacity(examples.len());
        let mut rows: Vec<Fact> = Vec::new();
        for example in examples {
            if example.weight != 0.0 {
                own_rows.push(Some(RowRef {
                    predicate: target.clone(),
                    index: next_row,
                }));
                next_row += 1;
                rows.push(example.clone());
            } else {
                own_rows.push(None);
            }
        }
        (self.store.merge(&FactStore::compile(rows)), own_rows)
    }

    /// Run the search to a terminal state.
    pub fn build<R>(&self, examples: &[Example], rng: &mut R) -> LearnedClause
    where
        R: Rng + ?Sized,
    {
        let criterion = self.config.criterion;
        let head_types = self.space.target_signature().to_vec();

        let mut allocator = VariableAllocator::new();
        let head: Vec<String> = head_types.iter().map(|_| allocator.next()).collect();
        let mut head_scope = TypedScope::new();
        for (variable, type_name) in head.iter().zip(&head_types) {
            head_scope.insert(type_name.as_str(), variable.as_str());
        }
        let mut body_scope = TypedScope::new();

        let (store, own_rows) = self.search_store(examples);
        let hints = store.usage_hints();
        let views: Vec<FactView<'_>> = own_rows
            .iter()
            .map(|row| match row {
                Some(row) => store.view().excluding(row),
                None => store.view(),
            })
            .collect();
        let bindings: Vec<Bindings> = examples
            .iter()
            .map(|e| Bindings::from_head(&head, &e.arguments))
            .collect();

        let generator = CandidateGenerator::new(&self.space.modes, &self.space.constants);
        let predicates = self.body_predicates();

        let mut working: Vec<usize> = (0..examples.len()).collect();
        let truth_of = |indices: &[usize]| -> Vec<f64> {
            indices.iter().map(|&i| examples[i].weight).collect()
        };
        let prior = mean(&truth_of(&working));
        let mut best_impurity = criterion.node_impurity(&truth_of(&working));
        let mut clause = Clause::default();
        let mut leaves = Vec::new();

        let stop = loop {
            if self.config.max_literals.is_some_and(|max| clause.len() >= max) {
                break StopReason::MaxLiterals;
            }
            if working.len() < self.config.min_examples {
                break StopReason::TooFewExamples;
            }

            let allowed = self.sample_predicates(&predicates, rng);
            let candidates = generator.generate(&allowed, &head_scope, &body_scope, &allocator);
            if candidates.is_empty() {
                break StopReason::Exhausted;
            }
            let mut ordered = search_order(candidates, &hints);
            ordered.shuffle(rng);

            let truth = truth_of(&working);
            let scored: Vec<(Scored, f64)> = ordered
                .into_iter()
                .map(|literal| {
                    let extended = clause.extended(literal);
                    let strengths: Vec<f64> = working
                        .iter()
                        .map(|&i| {
                            Prover::with_view(views[i])
                                .prove(&bindings[i], extended.literals(), Weighting::Ignore)
                                .last()
                                .copied()
                                .unwrap_or(0.0)
                        })
                        .collect();
                    let impurity = criterion.split_impurity(&strengths, &truth);
                    let literal = extended.literals()[clause.len()].clone();
                    (Scored { literal, strengths }, impurity)
                })
                .collect();

            let Some(index) = self.config.strategy.select(&scored, rng) else {
                break StopReason::NoViableCandidate;
            };
            let (selected, impurity) = &scored[index];
            tracing::debug!(
                literal = %selected.literal,
                impurity,
                best = best_impurity,
                candidates = scored.len(),
                predicates = allowed.len(),
                "selected candidate literal"
            );
            if *impurity >= best_impurity {
                break StopReason::NoImprovement;
            }

            let signature = self.space.signatures.get(&selected.literal.predicate);
            for (position, term) in selected.literal.arguments.iter().enumerate() {
                if let Term::Variable(name) = term {
                    if term.is_anonymous() {
                        continue;
                    }
                    allocator.reserve(name.as_str());
                    if !head_scope.contains(name) {
                        if let Some(type_name) = signature.and_then(|s| s.get(position)) {
                            body_scope.insert(type_name.as_str(), name.as_str());
                        }
                    }
                }
            }

            let (matched, unmatched) = partition(&selected.strengths, &truth);
            leaves.push(LeafStatistics {
                matched: mean(&matched),
                unmatched: mean(&unmatched),
            });
            working = working
                .iter()
                .zip(&selected.strengths)
                .filter(|(_, s)| **s > 0.0)
                .map(|(i, _)| *i)
                .collect();
            best_impurity = *impurity;
            clause.push(selected.literal.clone());

            if self.config.max_literals.is_some_and(|max| clause.len() >= max) {
                break StopReason::MaxLiterals;
            }
            if working.len() < self.config.min_examples {
                break StopReason::TooFewExamples;
            }
            let remaining = truth_of(&working);
            if remaining.windows(2).all(|w| w[0] == w[1]) {
                break StopReason::Pure;
            }
        };

        tracing::debug!(clause = %clause, ?stop, "clause search finished");
        LearnedClause {
            head,
            clause,
            leaves,
            prior,
            stop,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
