//! Close-price matrix aligned on a shared timestamp axis.

use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Close prices for several instruments, one column per requested symbol.
///
/// Rows are chronological; a row is present only if at least one column has
/// a value at that timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    timestamps: Vec<NaiveDateTime>,
    symbols: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Outer-joins the close prices of `series` on the union of their
    /// timestamps.
    ///
    /// The column set is `symbols` in order, with repeats collapsed onto
    /// their first occurrence; a requested symbol with no series becomes an
    /// all-missing column.
    pub fn align(symbols: &[String], series: &[PriceSeries]) -> Self {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();
        let by_symbol: HashMap<&str, &PriceSeries> =
            series.iter().map(|s| (s.symbol(), s)).collect();

        let timeline: BTreeSet<NaiveDateTime> = symbols
            .iter()
            .filter_map(|sym| by_symbol.get(sym.as_str()))
            .flat_map(|s| s.bars().iter().map(|b| b.timestamp))
            .collect();
        let timestamps: Vec<NaiveDateTime> = timeline.into_iter().collect();

        let columns = symbols
            .iter()
            .map(|sym| {
                let closes: HashMap<NaiveDateTime, f64> = by_symbol
                    .get(sym.as_str())
                    .map(|s| s.bars().iter().map(|b| (b.timestamp, b.close)).collect())
                    .unwrap_or_default();
                timestamps.iter().map(|t| closes.get(t).copied()).collect()
            })
            .collect();

        Self::from_columns(timestamps, symbols, columns)
    }

    /// Builds a matrix from raw columns, dropping rows missing in every column
    /// and non-finite cells.
    ///
    /// # Panics
    ///
    /// Panics if a column's length differs from `timestamps`.
    pub fn from_columns(
        timestamps: Vec<NaiveDateTime>,
        symbols: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Self {
        assert_eq!(symbols.len(), columns.len(), "one column per symbol");
        for col in &columns {
            assert_eq!(col.len(), timestamps.len(), "column length must match timestamps");
        }

        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);

        let keep: Vec<usize> = order
            .into_iter()
            .filter(|&i| columns.iter().any(|c| c[i].is_some_and(f64::is_finite)))
            .collect();

        let columns = columns
            .iter()
            .map(|c| {
                keep.iter()
                    .map(|&i| c[i].filter(|v| v.is_finite()))
                    .collect()
            })
            .collect();
        let timestamps = keep.iter().map(|&i| timestamps[i]).collect();

        Self {
            timestamps,
            symbols,
            columns,
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// The valid (timestamp, close) pairs of one column, in time order.
    pub fn valid_closes(&self, symbol: &str) -> Vec<(NaiveDateTime, f64)> {
        self.column(symbol)
            .map(|col| {
                self.timestamps
                    .iter()
                    .zip(col)
                    .filter_map(|(d, v)| v.map(|v| (*d, v)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
