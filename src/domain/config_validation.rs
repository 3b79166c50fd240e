//! Configuration loading and validation.
//!
//! Every key is optional; missing keys take the documented defaults. Values
//! that are present but out of range are rejected before any computation.

use crate::domain::error::MarketlensError;
use crate::domain::features;
use crate::domain::indicator::{IndicatorKind, IndicatorParams};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;

const INDICATORS: &str = "indicators";
const FEATURES: &str = "features";
const DATA: &str = "data";

pub const DEFAULT_INTERVAL: &str = "1d";

/// Where and what to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub path: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub interval: String,
    pub symbols: Vec<String>,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MarketlensError {
    MarketlensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, MarketlensError> {
    let value = config.get_int(section, key, default as i64);
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value as usize)
}

pub fn load_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, MarketlensError> {
    let d = IndicatorParams::default();
    let params = IndicatorParams {
        sma_window: window(config, INDICATORS, "sma_window", d.sma_window)?,
        ema_window: window(config, INDICATORS, "ema_window", d.ema_window)?,
        ma_medium: window(config, INDICATORS, "ma_medium", d.ma_medium)?,
        ma_long: window(config, INDICATORS, "ma_long", d.ma_long)?,
        bollinger_window: window(config, INDICATORS, "bollinger_window", d.bollinger_window)?,
        bollinger_k: config.get_double(INDICATORS, "bollinger_k", d.bollinger_k),
        rsi_window: window(config, INDICATORS, "rsi_window", d.rsi_window)?,
        macd_fast: window(config, INDICATORS, "macd_fast", d.macd_fast)?,
        macd_slow: window(config, INDICATORS, "macd_slow", d.macd_slow)?,
        macd_signal: window(config, INDICATORS, "macd_signal", d.macd_signal)?,
        adx_window: window(config, INDICATORS, "adx_window", d.adx_window)?,
        sar_step: config.get_double(INDICATORS, "sar_step", d.sar_step),
        sar_max_step: config.get_double(INDICATORS, "sar_max_step", d.sar_max_step),
        ichimoku_tenkan: window(config, INDICATORS, "ichimoku_tenkan", d.ichimoku_tenkan)?,
        ichimoku_kijun: window(config, INDICATORS, "ichimoku_kijun", d.ichimoku_kijun)?,
        ichimoku_senkou_b: window(config, INDICATORS, "ichimoku_senkou_b", d.ichimoku_senkou_b)?,
        stoch_window: window(config, INDICATORS, "stoch_window", d.stoch_window)?,
        stoch_smooth: window(config, INDICATORS, "stoch_smooth", d.stoch_smooth)?,
    };
    validate_indicator_params(&params)?;
    Ok(params)
}

/// Cross-field checks that a single window lookup cannot make.
pub fn validate_indicator_params(p: &IndicatorParams) -> Result<(), MarketlensError> {
    if p.macd_fast >= p.macd_slow {
        return Err(invalid(
            INDICATORS,
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    if p.ma_medium == p.ma_long {
        return Err(invalid(
            INDICATORS,
            "ma_medium",
            "ma_medium must differ from ma_long",
        ));
    }
    if !(p.bollinger_k > 0.0) {
        return Err(invalid(INDICATORS, "bollinger_k", "bollinger_k must be positive"));
    }
    if !(p.sar_step > 0.0 && p.sar_step <= 1.0) {
        return Err(invalid(INDICATORS, "sar_step", "sar_step must be in (0, 1]"));
    }
    if !(p.sar_max_step > 0.0 && p.sar_max_step <= 1.0) {
        return Err(invalid(INDICATORS, "sar_max_step", "sar_max_step must be in (0, 1]"));
    }
    if p.sar_step > p.sar_max_step {
        return Err(invalid(
            INDICATORS,
            "sar_step",
            "sar_step must not exceed sar_max_step",
        ));
    }
    Ok(())
}

/// The `requested` list, or every indicator when the key is absent.
pub fn load_requested_indicators(
    config: &dyn ConfigPort,
) -> Result<BTreeSet<IndicatorKind>, MarketlensError> {
    let Some(names) = config.get_list(INDICATORS, "requested") else {
        return Ok(IndicatorKind::all());
    };
    names
        .iter()
        .map(|n| {
            n.parse::<IndicatorKind>()
                .map_err(|e| invalid(INDICATORS, "requested", e.to_string()))
        })
        .collect()
}

pub fn load_feature_window(config: &dyn ConfigPort) -> Result<usize, MarketlensError> {
    let value = window(config, FEATURES, "window", features::DEFAULT_WINDOW)?;
    if value < 2 {
        return Err(invalid(FEATURES, "window", "window must be at least 2"));
    }
    Ok(value)
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, MarketlensError> {
    config
        .get_string(DATA, key)
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                invalid(DATA, key, format!("invalid {} format, expected YYYY-MM-DD", key))
            })
        })
        .transpose()
}

pub fn load_data_config(config: &dyn ConfigPort) -> Result<DataConfig, MarketlensError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(DATA, "start_date", "start_date must not be after end_date"));
        }
    }

    let interval = config
        .get_string(DATA, "interval")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    Ok(DataConfig {
        path: config.get_string(DATA, "path").filter(|s| !s.trim().is_empty()),
        start_date,
        end_date,
        interval,
        symbols: config.get_list(DATA, "symbols").unwrap_or_default(),
    })
}
