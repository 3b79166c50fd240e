//! Pearson correlation across instruments and its extreme pairs.

use crate::domain::diagnostic::{Diagnostic, Outcome};
use crate::domain::returns::ReturnMatrix;
use crate::domain::stats;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Symmetric correlation matrix; `None` marks an undefined coefficient
/// (zero variance or fewer than two overlapping returns).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

/// One unordered instrument pair; `first` precedes `second` in the matrix's
/// symbol order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPair {
    pub first: String,
    pub second: String,
    pub value: f64,
}

pub const EXTREME_PAIRS: usize = 3;

/// Pairwise-complete Pearson correlation of every column pair.
pub fn compute_correlation(returns: &ReturnMatrix) -> Outcome<CorrelationMatrix> {
    let symbols = returns.symbols().to_vec();
    let columns: Vec<&[Option<f64>]> = returns.columns().map(|(_, c)| c).collect();
    let n = symbols.len();
    let mut values = vec![vec![None; n]; n];
    let mut diagnostics = Vec::new();

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = columns[i]
                .iter()
                .zip(columns[j])
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            let r = stats::pearson(&pairs);
            if r.is_none() {
                let subject = if i == j {
                    symbols[i].clone()
                } else {
                    format!("{}/{}", symbols[i], symbols[j])
                };
                debug!(%subject, overlap = pairs.len(), "correlation undefined");
                diagnostics.push(Diagnostic::degenerate(
                    subject,
                    "zero variance or fewer than two overlapping returns",
                ));
            }
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Outcome::new(CorrelationMatrix { symbols, values }, diagnostics)
}

impl CorrelationMatrix {
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Defined off-diagonal coefficients, each unordered pair of distinct
    /// names once. A repeated symbol never pairs with itself.
    pub fn pairs(&self) -> Vec<CorrelationPair> {
        let n = self.symbols.len();
        let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        let mut seen = HashSet::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.symbols[i].as_str(), self.symbols[j].as_str());
                if a == b || !seen.insert(if a < b { (a, b) } else { (b, a) }) {
                    continue;
                }
                if let Some(value) = self.values[i][j] {
                    out.push(CorrelationPair {
                        first: self.symbols[i].clone(),
                        second: self.symbols[j].clone(),
                        value,
                    });
                }
            }
        }
        out
    }

    /// The `k` lowest coefficients, most negative first.
    pub fn most_negative(&self, k: usize) -> Vec<CorrelationPair> {
        self.ranked(k, |a, b| a.value.total_cmp(&b.value))
    }

    /// The `k` highest coefficients, most positive first.
    pub fn most_positive(&self, k: usize) -> Vec<CorrelationPair> {
        self.ranked(k, |a, b| b.value.total_cmp(&a.value))
    }

    fn ranked<F>(&self, k: usize, cmp: F) -> Vec<CorrelationPair>
    where
        F: Fn(&CorrelationPair, &CorrelationPair) -> Ordering,
    {
        let mut pairs = self.pairs();
        // stable sort: ties keep matrix order
        pairs.sort_by(cmp);
        pairs.truncate(k);
        pairs
    }
}
