use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// rate gap (percentage points) above which avalanche beats snowball
pub const DEFAULT_AVALANCHE_RATE_GAP: Decimal = dec!(2);

/// average remaining term (months) above which reduce-term is recommended
pub const DEFAULT_REDUCE_TERM_THRESHOLD_MONTHS: u32 = 24;

pub const DEFAULT_FORECAST_MONTHS: u32 = 6;
pub const DEFAULT_SUGGESTION_LOOKBACK_MONTHS: u32 = 3;
pub const DEFAULT_REPORT_PERIOD_DAYS: u32 = 30;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub advisor: AdvisorConfig,
    pub budget: BudgetConfig,
    pub report: ReportConfig,
}

/// payoff advisor thresholds
///
/// both are fixed heuristics, not derived optima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub avalanche_rate_gap: Decimal,
    pub reduce_term_threshold_months: u32,
}

/// budget planning defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub forecast_months: u32,
    pub suggestion_lookback_months: u32,
}

/// report defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub period_days: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            avalanche_rate_gap: DEFAULT_AVALANCHE_RATE_GAP,
            reduce_term_threshold_months: DEFAULT_REDUCE_TERM_THRESHOLD_MONTHS,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            forecast_months: DEFAULT_FORECAST_MONTHS,
            suggestion_lookback_months: DEFAULT_SUGGESTION_LOOKBACK_MONTHS,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period_days: DEFAULT_REPORT_PERIOD_DAYS,
        }
    }
}

impl EngineConfig {
    /// parse from json; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.advisor.avalanche_rate_gap.is_sign_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "avalanche rate gap must not be negative, got {}",
                    self.advisor.avalanche_rate_gap
                ),
            });
        }
        if self.budget.forecast_months == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "forecast must cover at least one month".to_string(),
            });
        }
        if self.budget.suggestion_lookback_months == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "suggestion lookback must cover at least one month".to_string(),
            });
        }
        if self.report.period_days == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "report period must cover at least one day".to_string(),
            });
        }
        Ok(())
    }
}
