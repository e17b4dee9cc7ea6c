//! Selection strategies: which scored candidate literal to keep next.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

/// Picks one candidate from `(candidate, impurity)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lowest impurity; the first of equally scored candidates wins.
    #[default]
    Best,
    /// Random draw weighted by `max(0, 1 - 2 * impurity)`.
    Roulette,
}

impl Strategy {
    /// Index of the selected candidate, or `None` to stop the search.
    ///
    /// NaN impurities are never selected. `Best` returns an infinite
    /// impurity only when nothing finite exists; `Roulette` never does.
    pub fn select<T, R>(self, scored: &[(T, f64)], rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        match self {
            Strategy::Best => best(scored),
            Strategy::Roulette => roulette(scored, rng),
        }
    }
}

fn best<T>(scored: &[(T, f64)]) -> Option<usize> {
    let mut selected: Option<(usize, f64)> = None;
    for (index, (_, impurity)) in scored.iter().enumerate() {
        if impurity.is_nan() {
            continue;
        }
        match selected {
            Some((_, lowest)) if *impurity >= lowest => {}
            _ => selected = Some((index, *impurity)),
        }
    }
    selected.map(|(index, _)| index)
}

fn roulette<T, R>(scored: &[(T, f64)], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let finite: Vec<(usize, f64)> = scored
        .iter()
        .enumerate()
        .filter(|(_, (_, impurity))| impurity.is_finite())
        .map(|(index, (_, impurity))| (index, (1.0 - 2.0 * impurity).max(0.0)))
        .collect();
    if finite.is_empty() {
        return None;
    }

    // WeightedIndex rejects an all-zero distribution, which means no
    // candidate is better than chance.
    let dist = WeightedIndex::new(finite.iter().map(|(_, w)| *w)).ok()?;
    Some(finite[dist.sample(rng)].0)
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Best => write!(f, "best"),
            Strategy::Roulette => write!(f, "roulette"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best" => Ok(Strategy::Best),
            "roulette" => Ok(Strategy::Roulette),
            other => Err(format!(
                "unknown strategy \"{other}\", expected \"best\" or \"roulette\""
            )),
        }
    }
}
