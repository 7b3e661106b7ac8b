//! Built-in strategy catalog and INI strategy loading.
//!
//! The built-in catalog carries eight predefined strategies spanning
//! equity, options, futures and crypto. Custom strategies load from an
//! INI section via `ConfigPort`; every rule expression is parsed and the
//! strategy validated at load time, so evaluation never fails later.

use crate::domain::error::TradecastError;
use crate::domain::rule::{Combine, NamedRule, RuleSet};
use crate::domain::rule_parser;
use crate::domain::strategy::{AssetClass, RiskLevel, Strategy, StrategyCategory};
use crate::ports::config_port::ConfigPort;

fn rule_set(combine: Combine, rules: &[(&str, &str)]) -> Result<RuleSet, TradecastError> {
    let mut named = Vec::with_capacity(rules.len());
    for (name, expr) in rules {
        named.push(NamedRule {
            name: (*name).to_string(),
            rule: rule_parser::parse(expr)?,
        });
    }
    Ok(RuleSet::new(named, combine))
}

/// The predefined catalog. Construction parses every rule expression, so
/// a malformed catalog entry fails loudly instead of mis-trading quietly.
pub fn builtin_strategies() -> Result<Vec<Strategy>, TradecastError> {
    let strategies = vec![
        Strategy {
            id: "long_equity_momentum".into(),
            name: "Long Equity Momentum".into(),
            asset_class: AssetClass::Equity,
            category: StrategyCategory::Long,
            risk_level: RiskLevel::Medium,
            capital_required: 5_000.0,
            max_loss: Some(1_000.0),
            max_profit: Some(2_500.0),
            success_rate: Some(0.655),
            avg_return_pct: Some(8.2),
            entry_rules: rule_set(
                Combine::AllOf,
                &[
                    ("strong momentum", "ABOVE(RSI(14), 60)"),
                    ("price above trend", "ABOVE(close, SMA(20))"),
                ],
            )?,
            exit_rules: rule_set(Combine::AnyOf, &[("overbought", "ABOVE(RSI(14), 80)")])?,
            max_holding_days: 30,
        },
        Strategy {
            id: "short_equity_reversal".into(),
            name: "Short Equity Mean Reversion".into(),
            asset_class: AssetClass::Equity,
            category: StrategyCategory::Short,
            risk_level: RiskLevel::High,
            capital_required: 10_000.0,
            max_loss: Some(2_000.0),
            max_profit: Some(3_000.0),
            success_rate: Some(0.583),
            avg_return_pct: Some(12.1),
            entry_rules: rule_set(
                Combine::AllOf,
                &[
                    ("overbought", "ABOVE(RSI(14), 70)"),
                    ("trend breakdown", "CROSS_BELOW(close, SMA(20))"),
                ],
            )?,
            exit_rules: rule_set(Combine::AnyOf, &[("oversold", "BELOW(RSI(14), 30)")])?,
            max_holding_days: 30,
        },
        Strategy {
            id: "long_call_earnings".into(),
            name: "Long Call Before Earnings".into(),
            asset_class: AssetClass::Options,
            category: StrategyCategory::Long,
            risk_level: RiskLevel::High,
            capital_required: 2_000.0,
            max_loss: Some(2_000.0),
            max_profit: Some(8_000.0),
            success_rate: Some(0.452),
            avg_return_pct: Some(15.8),
            entry_rules: rule_set(
                Combine::AllOf,
                &[
                    ("bullish bias", "ABOVE(RSI(14), 50)"),
                    ("price above trend", "ABOVE(close, SMA(20))"),
                ],
            )?,
            exit_rules: RuleSet::empty(),
            max_holding_days: 21,
        },
        Strategy {
            id: "put_credit_spread".into(),
            name: "Put Credit Spread".into(),
            asset_class: AssetClass::Options,
            category: StrategyCategory::Spread,
            risk_level: RiskLevel::Medium,
            capital_required: 3_000.0,
            max_loss: Some(800.0),
            max_profit: Some(200.0),
            success_rate: Some(0.789),
            avg_return_pct: Some(6.7),
            entry_rules: rule_set(
                Combine::AllOf,
                &[
                    ("above support", "ABOVE(close, SMA(50))"),
                    ("not overbought", "BETWEEN(RSI(14), 40, 70)"),
                ],
            )?,
            exit_rules: RuleSet::empty(),
            max_holding_days: 30,
        },
        Strategy {
            id: "iron_condor_neutral".into(),
            name: "Iron Condor (Neutral)".into(),
            asset_class: AssetClass::Options,
            category: StrategyCategory::IronCondor,
            risk_level: RiskLevel::Medium,
            capital_required: 4_000.0,
            max_loss: Some(800.0),
            max_profit: Some(200.0),
            success_rate: Some(0.724),
            avg_return_pct: Some(5.2),
            entry_rules: rule_set(
                Combine::AllOf,
                &[
                    ("sideways momentum", "BETWEEN(RSI(14), 40, 60)"),
                    ("inside the bands", "BELOW(close, BOLLINGER_UPPER(20, 2))"),
                ],
            )?,
            exit_rules: RuleSet::empty(),
            max_holding_days: 30,
        },
        Strategy {
            id: "straddle_volatility".into(),
            name: "Long Straddle (High Vol)".into(),
            asset_class: AssetClass::Options,
            category: StrategyCategory::Straddle,
            risk_level: RiskLevel::High,
            capital_required: 3_500.0,
            max_loss: Some(3_500.0),
            max_profit: Some(15_000.0),
            success_rate: Some(0.421),
            avg_return_pct: Some(18.3),
            entry_rules: rule_set(
                Combine::AnyOf,
                &[
                    ("stretched up", "ABOVE(RSI(14), 70)"),
                    ("stretched down", "BELOW(RSI(14), 30)"),
                ],
            )?,
            exit_rules: RuleSet::empty(),
            max_holding_days: 14,
        },
        Strategy {
            id: "crypto_momentum".into(),
            name: "Crypto Momentum Trading".into(),
            asset_class: AssetClass::Crypto,
            category: StrategyCategory::Long,
            risk_level: RiskLevel::High,
            capital_required: 2_000.0,
            max_loss: Some(1_000.0),
            max_profit: Some(5_000.0),
            success_rate: Some(0.528),
            avg_return_pct: Some(22.4),
            entry_rules: rule_set(
                Combine::AllOf,
                &[(
                    "band breakout",
                    "CROSS_ABOVE(close, BOLLINGER_UPPER(20, 2))",
                )],
            )?,
            exit_rules: rule_set(
                Combine::AnyOf,
                &[("trend lost", "CROSS_BELOW(close, SMA(20))")],
            )?,
            max_holding_days: 14,
        },
        Strategy {
            id: "futures_trend_following".into(),
            name: "Futures Trend Following".into(),
            asset_class: AssetClass::Futures,
            category: StrategyCategory::Long,
            risk_level: RiskLevel::Medium,
            capital_required: 8_000.0,
            max_loss: Some(1_600.0),
            max_profit: Some(4_000.0),
            success_rate: Some(0.617),
            avg_return_pct: Some(11.3),
            entry_rules: rule_set(
                Combine::AllOf,
                &[("golden cross", "CROSS_ABOVE(SMA(20), SMA(50))")],
            )?,
            exit_rules: rule_set(
                Combine::AnyOf,
                &[("death cross", "CROSS_BELOW(SMA(20), SMA(50))")],
            )?,
            max_holding_days: 60,
        },
    ];

    for strategy in &strategies {
        strategy.validate()?;
    }
    Ok(strategies)
}

/// Look up a built-in strategy by id.
pub fn find_strategy(id: &str) -> Result<Strategy, TradecastError> {
    builtin_strategies()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| TradecastError::UnknownStrategy { id: id.to_string() })
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TradecastError> {
    config
        .get_string(section, key)
        .ok_or_else(|| TradecastError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn parse_combine(section: &str, key: &str, value: &str) -> Result<Combine, TradecastError> {
    match value {
        "all_of" => Ok(Combine::AllOf),
        "any_of" => Ok(Combine::AnyOf),
        "majority" => Ok(Combine::Majority),
        _ => Err(TradecastError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("unknown combinator '{}'", value),
        }),
    }
}

/// Parse `name: EXPR; name: EXPR; …` into named rules.
fn parse_rule_list(
    section: &str,
    key: &str,
    value: &str,
) -> Result<Vec<NamedRule>, TradecastError> {
    let mut rules = Vec::new();
    for entry in value.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, expr)) = entry.split_once(':') else {
            return Err(TradecastError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("rule entry '{}' missing 'name: expression' separator", entry),
            });
        };
        rules.push(NamedRule {
            name: name.trim().to_string(),
            rule: rule_parser::parse(expr.trim())?,
        });
    }
    Ok(rules)
}

fn optional_double(config: &dyn ConfigPort, section: &str, key: &str) -> Option<f64> {
    config
        .get_string(section, key)
        .and_then(|v| v.trim().parse::<f64>().ok())
}

/// Load a strategy from the INI section named `strategy.<id>`.
pub fn load_strategy(config: &dyn ConfigPort, id: &str) -> Result<Strategy, TradecastError> {
    let section = format!("strategy.{}", id);

    let name = require(config, &section, "name")?;
    let asset_class: AssetClass = require(config, &section, "asset_class")?
        .parse()
        .map_err(|_| TradecastError::ConfigInvalid {
            section: section.clone(),
            key: "asset_class".into(),
            reason: "expected equity, options, futures or crypto".into(),
        })?;
    let category: StrategyCategory = require(config, &section, "category")?
        .parse()
        .map_err(|_| TradecastError::ConfigInvalid {
            section: section.clone(),
            key: "category".into(),
            reason: "unknown category".into(),
        })?;
    let risk_level: RiskLevel = require(config, &section, "risk_level")?
        .parse()
        .map_err(|_| TradecastError::ConfigInvalid {
            section: section.clone(),
            key: "risk_level".into(),
            reason: "expected low, medium or high".into(),
        })?;

    let capital_required = require(config, &section, "capital_required")?
        .trim()
        .parse::<f64>()
        .map_err(|_| TradecastError::ConfigInvalid {
            section: section.clone(),
            key: "capital_required".into(),
            reason: "expected a number".into(),
        })?;

    let entry_combine = parse_combine(
        &section,
        "entry_combine",
        config
            .get_string(&section, "entry_combine")
            .unwrap_or_else(|| "all_of".to_string())
            .as_str(),
    )?;
    let exit_combine = parse_combine(
        &section,
        "exit_combine",
        config
            .get_string(&section, "exit_combine")
            .unwrap_or_else(|| "any_of".to_string())
            .as_str(),
    )?;

    let entry_rules = RuleSet::new(
        parse_rule_list(&section, "entry_rules", &require(config, &section, "entry_rules")?)?,
        entry_combine,
    );
    let exit_rules = RuleSet::new(
        config
            .get_string(&section, "exit_rules")
            .map(|v| parse_rule_list(&section, "exit_rules", &v))
            .transpose()?
            .unwrap_or_default(),
        exit_combine,
    );

    let strategy = Strategy {
        id: id.to_string(),
        name,
        asset_class,
        category,
        risk_level,
        capital_required,
        max_loss: optional_double(config, &section, "max_loss"),
        max_profit: optional_double(config, &section, "max_profit"),
        success_rate: optional_double(config, &section, "success_rate"),
        avg_return_pct: optional_double(config, &section, "avg_return_pct"),
        entry_rules,
        exit_rules,
        max_holding_days: config.get_int(&section, "max_holding_days", 30).max(0) as usize,
    };

    strategy.validate()?;
    Ok(strategy)
}
