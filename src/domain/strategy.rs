//! Strategy model.
//!
//! A strategy bundles the static catalog attributes (asset class, category,
//! risk, capital, bounds, historical base rates) with its entry and exit
//! rule sets. Validation happens once at load time; the engine assumes a
//! validated strategy afterwards.

use crate::domain::error::TradecastError;
use crate::domain::rule::RuleSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Options,
    Futures,
    Crypto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Long,
    Short,
    Spread,
    Straddle,
    Strangle,
    IronCondor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Directional bias derived from the category. Multi-leg option structures
/// have no single direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Long,
    Short,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub category: StrategyCategory,
    pub risk_level: RiskLevel,
    pub capital_required: f64,
    pub max_loss: Option<f64>,
    pub max_profit: Option<f64>,
    /// Historical base rate in [0, 1], when the catalog carries one.
    pub success_rate: Option<f64>,
    /// Historical average return per trade, percent.
    pub avg_return_pct: Option<f64>,
    pub entry_rules: RuleSet,
    pub exit_rules: RuleSet,
    pub max_holding_days: usize,
}

impl Strategy {
    pub fn bias(&self) -> Bias {
        match self.category {
            StrategyCategory::Long => Bias::Long,
            StrategyCategory::Short => Bias::Short,
            StrategyCategory::Spread
            | StrategyCategory::Straddle
            | StrategyCategory::Strangle
            | StrategyCategory::IronCondor => Bias::Neutral,
        }
    }

    /// Bars of history the strategy needs before any signal is meaningful.
    pub fn required_history(&self) -> usize {
        self.entry_rules
            .required_history()
            .max(self.exit_rules.required_history())
    }

    /// Load-time validation. Rule problems surface here, never during
    /// evaluation.
    pub fn validate(&self) -> Result<(), TradecastError> {
        if self.id.trim().is_empty() {
            return Err(TradecastError::InvalidInput {
                reason: "strategy with empty id".into(),
            });
        }
        if self.capital_required <= 0.0 {
            return Err(TradecastError::InvalidInput {
                reason: format!(
                    "strategy '{}': capital_required must be positive",
                    self.id
                ),
            });
        }
        if let Some(rate) = self.success_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(TradecastError::InvalidInput {
                    reason: format!(
                        "strategy '{}': success_rate {} outside [0, 1]",
                        self.id, rate
                    ),
                });
            }
        }
        if self.max_holding_days == 0 {
            return Err(TradecastError::InvalidInput {
                reason: format!("strategy '{}': max_holding_days must be positive", self.id),
            });
        }
        self.entry_rules.validate()?;
        self.exit_rules.validate()?;
        Ok(())
    }
}

impl std::fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StrategyCategory::Long => "long",
            StrategyCategory::Short => "short",
            StrategyCategory::Spread => "spread",
            StrategyCategory::Straddle => "straddle",
            StrategyCategory::Strangle => "strangle",
            StrategyCategory::IronCondor => "iron_condor",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for StrategyCategory {
    type Err = TradecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(StrategyCategory::Long),
            "short" => Ok(StrategyCategory::Short),
            "spread" => Ok(StrategyCategory::Spread),
            "straddle" => Ok(StrategyCategory::Straddle),
            "strangle" => Ok(StrategyCategory::Strangle),
            "iron_condor" => Ok(StrategyCategory::IronCondor),
            _ => Err(TradecastError::InvalidInput {
                reason: format!("unknown strategy category: {}", s),
            }),
        }
    }
}

impl std::str::FromStr for AssetClass {
    type Err = TradecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equity" => Ok(AssetClass::Equity),
            "options" => Ok(AssetClass::Options),
            "futures" => Ok(AssetClass::Futures),
            "crypto" => Ok(AssetClass::Crypto),
            _ => Err(TradecastError::InvalidInput {
                reason: format!("unknown asset class: {}", s),
            }),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = TradecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(TradecastError::InvalidInput {
                reason: format!("unknown risk level: {}", s),
            }),
        }
    }
}
