//! Log returns over an aligned price matrix.

use crate::domain::error::MarketlensError;
use crate::domain::price_matrix::PriceMatrix;
use chrono::NaiveDateTime;

/// Per-instrument log returns on the matrix's time axis (minus its first row).
///
/// A cell is `None` when either price of the pair is missing or non-positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    timestamps: Vec<NaiveDateTime>,
    symbols: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

/// A single timestamped return stream, gaps removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn log_return(prev: Option<f64>, curr: Option<f64>) -> Option<f64> {
    let (p, c) = (prev?, curr?);
    if p <= 0.0 || c <= 0.0 {
        return None;
    }
    let r = (c / p).ln();
    r.is_finite().then_some(r)
}

/// `ln(P_t / P_{t-1})` per column.
///
/// The first row never has a return and is dropped, as is any later row in
/// which no column has one. Fewer than two input rows is an error, and so is
/// a matrix in which no adjacent pair yields a return.
pub fn compute_returns(prices: &PriceMatrix) -> Result<ReturnMatrix, MarketlensError> {
    let rows = prices.row_count();
    if rows == 0 {
        return Err(MarketlensError::EmptyInput {
            context: "price matrix".into(),
        });
    }
    if rows < 2 {
        return Err(MarketlensError::InsufficientData {
            subject: "returns".into(),
            available: rows,
            required: 2,
        });
    }

    let raw: Vec<Vec<Option<f64>>> = prices
        .columns()
        .map(|(_, col)| col.windows(2).map(|w| log_return(w[0], w[1])).collect())
        .collect();

    let keep: Vec<usize> = (0..rows - 1)
        .filter(|&i| raw.iter().any(|c| c[i].is_some()))
        .collect();
    if keep.is_empty() {
        return Err(MarketlensError::InsufficientData {
            subject: "returns".into(),
            available: 0,
            required: 1,
        });
    }

    Ok(ReturnMatrix {
        timestamps: keep.iter().map(|&i| prices.timestamps()[i + 1]).collect(),
        symbols: prices.symbols().to_vec(),
        columns: raw
            .iter()
            .map(|c| keep.iter().map(|&i| c[i]).collect())
            .collect(),
    })
}

impl ReturnMatrix {
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

    /// The defined returns of one instrument.
    pub fn series(&self, symbol: &str) -> Option<ReturnSeries> {
        let col = self.column(symbol)?;
        let (timestamps, values) = self
            .timestamps
            .iter()
            .zip(col)
            .filter_map(|(t, v)| v.map(|v| (*t, v)))
            .unzip();
        Some(ReturnSeries::new(timestamps, values))
    }
}

/// Equal-weight portfolio return: the mean of the instruments that have a
/// return on each row.
pub fn portfolio_returns(returns: &ReturnMatrix) -> ReturnSeries {
    let mut timestamps = Vec::with_capacity(returns.row_count());
    let mut values = Vec::with_capacity(returns.row_count());
    for (i, ts) in returns.timestamps.iter().enumerate() {
        let row: Vec<f64> = returns.columns.iter().filter_map(|c| c[i]).collect();
        if row.is_empty() {
            continue;
        }
        timestamps.push(*ts);
        values.push(row.iter().sum::<f64>() / row.len() as f64);
    }
    ReturnSeries::new(timestamps, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
    }

    fn matrix(columns: Vec<(&str, Vec<Option<f64>>)>) -> PriceMatrix {
        let n = columns[0].1.len();
        let timestamps = (1..=n as u32).map(day).collect();
        let (symbols, cols): (Vec<String>, Vec<_>) =
            columns.into_iter().map(|(s, c)| (s.to_string(), c)).unzip();
        PriceMatrix::from_columns(timestamps, symbols, cols)
    }

    #[test]
    fn five_bar_log_returns() {
        let m = matrix(vec![(
            "A",
            vec![Some(10.0), Some(11.0), Some(9.0), Some(12.0), Some(11.0)],
        )]);
        let r = compute_returns(&m).unwrap();
        let s = r.series("A").unwrap();
        let expected = [
            (1.1_f64).ln(),
            (9.0_f64 / 11.0).ln(),
            (12.0_f64 / 9.0).ln(),
            (11.0_f64 / 12.0).ln(),
        ];
        assert_eq!(s.len(), 4);
        for (got, want) in s.values.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(r.timestamps()[0], day(2));
    }

    #[test]
    fn single_row_is_insufficient() {
        let m = matrix(vec![("A", vec![Some(10.0)])]);
        assert!(matches!(
            compute_returns(&m),
            Err(MarketlensError::InsufficientData {
                available: 1,
                required: 2,
                ..
            })
        ));
    }

    #[test]
    fn empty_matrix_is_empty_input() {
        let m = PriceMatrix::from_columns(vec![], vec!["A".into()], vec![vec![]]);
        assert!(matches!(
            compute_returns(&m),
            Err(MarketlensError::EmptyInput { .. })
        ));
    }

    #[test]
    fn gaps_keep_rows_with_any_return() {
        let m = matrix(vec![
            ("A", vec![Some(10.0), Some(11.0), None, Some(12.0)]),
            ("B", vec![Some(20.0), Some(21.0), Some(22.0), Some(23.0)]),
        ]);
        let r = compute_returns(&m).unwrap();
        assert_eq!(r.row_count(), 3);
        let a = r.column("A").unwrap();
        assert!(a[0].is_some());
        assert!(a[1].is_none());
        assert!(a[2].is_none());
        assert_eq!(r.series("B").unwrap().len(), 3);
    }

    #[test]
    fn non_positive_prices_have_no_return() {
        let m = matrix(vec![("A", vec![Some(10.0), Some(0.0), Some(5.0)])]);
        // neither pair yields a return
        assert!(matches!(
            compute_returns(&m),
            Err(MarketlensError::InsufficientData { available: 0, .. })
        ));
    }

    #[test]
    fn disjoint_columns_have_no_return() {
        let m = matrix(vec![
            ("A", vec![Some(10.0), None, Some(12.0), None]),
            ("B", vec![None, Some(20.0), None, Some(22.0)]),
        ]);
        assert!(matches!(
            compute_returns(&m),
            Err(MarketlensError::InsufficientData { available: 0, required: 1, .. })
        ));
    }

    #[test]
    fn portfolio_is_row_mean() {
        let m = matrix(vec![
            ("A", vec![Some(100.0), Some(110.0), Some(121.0)]),
            ("B", vec![Some(50.0), Some(45.0), None]),
        ]);
        let r = compute_returns(&m).unwrap();
        let p = portfolio_returns(&r);
        assert_eq!(p.len(), 2);
        let expected0 = ((1.1_f64).ln() + (0.9_f64).ln()) / 2.0;
        assert_relative_eq!(p.values[0], expected0, epsilon = 1e-12);
        assert_relative_eq!(p.values[1], (1.1_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn unknown_symbol_has_no_series() {
        let m = matrix(vec![("A", vec![Some(1.0), Some(2.0)])]);
        let r = compute_returns(&m).unwrap();
        assert!(r.series("B").is_none());
    }
}
