//! Price provider port.

use crate::domain::diagnostic::{Diagnostic, Outcome};
use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::price_matrix::PriceMatrix;
use chrono::NaiveDate;
use tracing::debug;

pub trait PriceSource {
    /// Bars for one instrument whose calendar date lies between `start` and
    /// `end` inclusive; every intraday bar of a boundary day is included.
    ///
    /// Missing high/low/volume is not an error; the returned series simply
    /// carries `None` for those fields.
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, MarketlensError>;

    /// Close-price matrix for several instruments.
    ///
    /// A symbol the source cannot supply becomes an all-missing column and a
    /// `MissingColumn` diagnostic; the other symbols are unaffected.
    fn fetch_matrix(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Outcome<PriceMatrix> {
        let mut series = Vec::with_capacity(symbols.len());
        let mut diagnostics = Vec::new();
        for symbol in symbols {
            match self.fetch_series(symbol, start, end, interval) {
                Ok(s) => series.push(s),
                Err(e) => {
                    debug!(%symbol, error = %e, "symbol unavailable");
                    diagnostics.push(Diagnostic::missing_column(symbol.as_str(), "close"));
                }
            }
        }
        Outcome::new(PriceMatrix::align(symbols, &series), diagnostics)
    }
}
