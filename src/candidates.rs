//! Candidate literal generation.
//!
//! Given the active modes, the constant pools, and the variables currently
//! bound in the head and in the body, enumerate every distinct literal that
//! may extend a clause. The generator only produces a set; the consumption
//! order is decided by the caller (deterministic sort, then a seeded shuffle).

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::{ConstantPool, Mode, ModeArg, ModeSymbol};
use crate::term::{Literal, Predicate, Term, UsageHints};
use crate::variables::VariableAllocator;

// ---------------------------------------------------------------------------
// Typed scopes
// ---------------------------------------------------------------------------

/// Variables in scope, grouped by type, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedScope {
    by_type: BTreeMap<String, Vec<String>>,
}

impl TypedScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable under a type; duplicates are ignored.
    pub fn insert(&mut self, type_name: impl Into<String>, variable: impl Into<String>) {
        let variable = variable.into();
        let vars = self.by_type.entry(type_name.into()).or_default();
        if !vars.contains(&variable) {
            vars.push(variable);
        }
    }

    pub fn variables(&self, type_name: &str) -> &[String] {
        self.by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.by_type
            .values()
            .any(|vars| vars.iter().any(|v| v == variable))
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(Vec::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Enumerates admissible next literals for a clause under construction.
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'a> {
    modes: &'a [Mode],
    constants: &'a ConstantPool,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(modes: &'a [Mode], constants: &'a ConstantPool) -> Self {
        Self { modes, constants }
    }

    /// Modes of the allowed predicates whose `+` arguments can all be filled.
    pub fn eligible_modes(
        &self,
        allowed: &BTreeSet<Predicate>,
        head: &TypedScope,
        body: &TypedScope,
    ) -> Vec<&'a Mode> {
        self.modes
            .iter()
            .filter(|mode| allowed.contains(&mode.predicate))
            .filter(|mode| {
                mode.arguments
                    .iter()
                    .filter(|arg| arg.symbol == ModeSymbol::Input)
                    .all(|arg| {
                        !head.variables(&arg.type_name).is_empty()
                            || !body.variables(&arg.type_name).is_empty()
                    })
            })
            .collect()
    }

    /// Terms that may fill one argument slot.
    ///
    /// `-` and `` ` `` slots draw exactly one fresh variable from `allocator`.
    pub fn argument_domain(
        &self,
        arg: &ModeArg,
        head: &TypedScope,
        body: &TypedScope,
        allocator: &mut VariableAllocator,
    ) -> Vec<Term> {
        let bound = |scope: &TypedScope| {
            scope
                .variables(&arg.type_name)
                .iter()
                .map(|v| Term::variable(v.as_str()))
                .collect::<Vec<_>>()
        };

        let mut domain = match arg.symbol {
            ModeSymbol::Constant => self
                .constants
                .values(&arg.type_name)
                .map(Term::constant)
                .collect(),
            ModeSymbol::Input => {
                let mut terms = bound(head);
                terms.extend(bound(body));
                terms
            }
            ModeSymbol::Output => {
                let mut terms = vec![Term::variable(allocator.next())];
                terms.extend(bound(head));
                terms.extend(bound(body));
                terms
            }
            ModeSymbol::BodyOutput => {
                let mut terms = vec![Term::variable(allocator.next())];
                terms.extend(bound(body).into_iter().filter(|t| !head.contains(t.name())));
                terms
            }
        };

        let mut seen = BTreeSet::new();
        domain.retain(|t| seen.insert(t.clone()));
        domain
    }

    /// Every distinct literal the allowed modes admit in the current scopes.
    ///
    /// Fresh variables come from a copy of `allocator` per mode; the caller
    /// commits the names of whichever candidate it keeps.
    pub fn generate(
        &self,
        allowed: &BTreeSet<Predicate>,
        head: &TypedScope,
        body: &TypedScope,
        allocator: &VariableAllocator,
    ) -> BTreeSet<Literal> {
        let mut candidates = BTreeSet::new();
        for mode in self.eligible_modes(allowed, head, body) {
            let mut speculative = allocator.clone();
            let domains: Vec<Vec<Term>> = mode
                .arguments
                .iter()
                .map(|arg| self.argument_domain(arg, head, body, &mut speculative))
                .collect();

            for arguments in cartesian_product(&domains) {
                candidates.insert(Literal::new(mode.predicate.clone(), arguments));
            }
        }
        candidates
    }
}

/// Deterministic consumption order for a candidate set.
pub fn search_order(candidates: BTreeSet<Literal>, hints: &UsageHints) -> Vec<Literal> {
    let mut ordered: Vec<Literal> = candidates.into_iter().collect();
    ordered.sort_by(|a, b| a.search_cmp(b, hints));
    ordered
}

fn cartesian_product(domains: &[Vec<Term>]) -> Vec<Vec<Term>> {
    let mut product: Vec<Vec<Term>> = vec![Vec::new()];
    for domain in domains {
        let mut next = Vec::with_capacity(product.len() * domain.len());
        for prefix in &product {
            for term in domain {
                let mut row = prefix.clone();
                row.push(term.clone());
                next.push(row);
            }
        }
        product = next;
    }
    product
}
