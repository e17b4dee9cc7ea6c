//! Impurity criteria for scoring a literal's match/no-match split.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How well a split separates examples by their true weight. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity, for 0/1 classification targets.
    Gini,
    /// Mean squared error around the group mean, for regression targets.
    Mse,
}

impl Criterion {
    /// Impurity of a single group of true weights.
    ///
    /// An empty group has undefined impurity and yields `+∞`.
    pub fn node_impurity(self, truth: &[f64]) -> f64 {
        if truth.is_empty() {
            return f64::INFINITY;
        }
        let n = truth.len() as f64;
        let mean = truth.iter().sum::<f64>() / n;
        match self {
            Criterion::Gini => 1.0 - mean.powi(2) - (1.0 - mean).powi(2),
            Criterion::Mse => {
                let squared: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
                squared / n
            }
        }
    }

    /// Size-weighted impurity of the matched and unmatched groups.
    ///
    /// A strength above zero counts as matched. When either group is empty
    /// the split is degenerate and the impurity is `+∞`.
    pub fn split_impurity(self, strengths: &[f64], truth: &[f64]) -> f64 {
        let (matched, unmatched) = partition(strengths, truth);
        if matched.is_empty() || unmatched.is_empty() {
            return f64::INFINITY;
        }
        let n = (matched.len() + unmatched.len()) as f64;
        matched.len() as f64 / n * self.node_impurity(&matched)
            + unmatched.len() as f64 / n * self.node_impurity(&unmatched)
    }
}

/// True weights of matched and unmatched examples, in input order.
pub fn partition(strengths: &[f64], truth: &[f64]) -> (Vec<f64>, Vec<f64>) {
    strengths
        .iter()
        .zip(truth)
        .fold((Vec::new(), Vec::new()), |(mut matched, mut unmatched), (s, t)| {
            if *s > 0.0 {
                matched.push(*t);
            } else {
                unmatched.push(*t);
            }
            (matched, unmatched)
        })
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Gini => write!(f, "gini"),
            Criterion::Mse => write!(f, "mse"),
        }
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gini" => Ok(Criterion::Gini),
            "mse" => Ok(Criterion::Mse),
            other => Err(format!("unknown criterion \"{other}\", expected \"gini\" or \"mse\"")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[i32]) -> Vec<f64> {
        values.iter().map(|v| *v as f64).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    const ATT: [i32; 14] = [0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1];

    #[test]
    fn gini_of_mixed_split() {
        let truth = floats(&[0, 0, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 0]);
        assert_close(Criterion::Gini.split_impurity(&floats(&ATT), &truth), 0.4428571428571429);
    }

    #[test]
    fn gini_of_pure_split_is_zero() {
        let truth = floats(&ATT);
        assert_eq!(Criterion::Gini.split_impurity(&floats(&ATT), &truth), 0.0);
    }

    #[test]
    fn gini_of_nearly_pure_split() {
        let truth = floats(&[0, 0, 0, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1]);
        assert_close(Criterion::Gini.split_impurity(&floats(&ATT), &truth), 0.12857142857142853);
    }

    #[test]
    fn mse_of_mixed_split() {
        let truth = floats(&[0, 0, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 0]);
        assert_close(Criterion::Mse.split_impurity(&floats(&ATT), &truth), 0.22142857142857145);
    }

    #[test]
    fn mse_of_constant_groups_is_zero() {
        let att = floats(&[1, 1, 1, 0, 0, 0]);
        let truth = floats(&[5, 5, 5, 9, 9, 9]);
        assert_eq!(Criterion::Mse.split_impurity(&att, &truth), 0.0);
    }

    #[test]
    fn mse_of_nearly_constant_groups() {
        let att = floats(&[1, 1, 1, 0, 0, 0]);
        let truth = [5.0, 4.9, 5.0, 6.0, 6.0, 6.1];
        assert_close(Criterion::Mse.split_impurity(&att, &truth), 0.0022222222222222066);
    }

    #[test]
    fn degenerate_split_is_infinite() {
        let truth = [1.0, 0.0, 1.0];
        assert!(Criterion::Gini.split_impurity(&[1.0, 1.0, 1.0], &truth).is_infinite());
        assert!(Criterion::Mse.split_impurity(&[0.0, 0.0, 0.0], &truth).is_infinite());
        assert!(Criterion::Gini.node_impurity(&[]).is_infinite());
    }

    #[test]
    fn node_impurity_of_all_examples() {
        assert_close(Criterion::Gini.node_impurity(&[1.0, 0.0, 0.0, 0.0]), 0.375);
        assert_close(Criterion::Mse.node_impurity(&[1.0, 3.0]), 1.0);
    }

    #[test]
    fn weighted_strengths_count_as_matched() {
        let (matched, unmatched) = partition(&[2.2, 0.0, 1.0], &[1.0, 0.0, 1.0]);
        assert_eq!(matched, vec![1.0, 1.0]);
        assert_eq!(unmatched, vec![0.0]);
    }

    #[test]
    fn parses_names() {
        assert_eq!("gini".parse::<Criterion>().unwrap(), Criterion::Gini);
        assert_eq!("MSE".parse::<Criterion>().unwrap(), Criterion::Mse);
        assert!("entropy".parse::<Criterion>().is_err());
        assert_eq!(Criterion::Mse.to_string(), "mse");
    }
}
