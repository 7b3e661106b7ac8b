//! Backtest simulator.
//!
//! Replays a strategy over a validated price series with a
//! `Flat → Entered → Closed` state machine, one position at a time.
//! Entries fill at the signal bar's close adjusted by proportional
//! slippage; exits check stop, target, exit rules, then the holding
//! limit, in that order, and any position still open at the last bar is
//! force-closed with reason `PeriodEnd`. The run is deterministic:
//! identical inputs produce identical results.

use crate::domain::error::TradecastError;
use crate::domain::indicator::{compute_indicators, IndicatorSet};
use crate::domain::metrics::{build_equity_curve, EquityPoint, Metrics};
use crate::domain::position::{CloseReason, Direction, OpenPosition, TradeResult};
use crate::domain::price::{Asset, PriceBar, PriceSeries};
use crate::domain::rule_eval;
use crate::domain::strategy::{Bias, Strategy};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fewest bars any backtest may run on, regardless of rule lookbacks.
pub const MIN_HISTORY_BARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Per-side commission as a fraction of notional.
    pub commission_rate: f64,
    /// Proportional, always adverse.
    pub slippage_rate: f64,
    /// Stop distance as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// Target distance as a fraction of entry price.
    pub take_profit_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.001,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.15,
        }
    }
}

/// Cooperative cancellation handle, checked between bars.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub asset: Asset,
    pub period: Period,
    pub total_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: Option<f64>,
    pub degenerate: bool,
    pub trades: Vec<TradeResult>,
    pub equity_curve: Vec<EquityPoint>,
}

enum State {
    Flat,
    Entered(OpenPosition),
}

pub fn run_backtest(
    strategy: &Strategy,
    asset: &Asset,
    series: &PriceSeries,
    config: &BacktestConfig,
    cancel: &CancelToken,
) -> Result<BacktestResult, TradecastError> {
    let bars = series.bars();
    let minimum = strategy.required_history().max(MIN_HISTORY_BARS);
    if bars.len() < minimum {
        return Err(TradecastError::InsufficientData {
            symbol: asset.symbol.clone(),
            bars: bars.len(),
            minimum,
        });
    }

    let mut kinds = strategy.entry_rules.referenced_indicators();
    for kind in strategy.exit_rules.referenced_indicators() {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    let indicators = compute_indicators(bars, &kinds);

    let direction = match strategy.bias() {
        Bias::Long => Some(Direction::Long),
        Bias::Short => Some(Direction::Short),
        // Multi-leg structures have no simulatable underlying direction;
        // they produce a zero-trade result.
        Bias::Neutral => None,
    };

    let mut trades = Vec::new();
    let mut state = State::Flat;

    for index in minimum - 1..bars.len() {
        if cancel.is_cancelled() {
            return Err(TradecastError::Cancelled);
        }
        let bar = &bars[index];

        match state {
            State::Flat => {
                let Some(direction) = direction else {
                    continue;
                };
                let outcome = rule_eval::evaluate_set(&strategy.entry_rules, bars, &indicators, index);
                if outcome.fired {
                    let entry_price = fill_price(bar.close, direction, Side::Entry, config);
                    state = State::Entered(OpenPosition {
                        entry_date: bar.timestamp,
                        entry_index: index,
                        entry_price,
                        quantity: strategy.capital_required / entry_price,
                        direction,
                    });
                }
            }
            State::Entered(ref position) => {
                if let Some(reason) = exit_reason(position, strategy, bars, &indicators, index, config) {
                    trades.push(close_position(position, bar, reason, config));
                    state = State::Flat;
                }
            }
        }
    }

    if let State::Entered(ref position) = state {
        let last = bars.last().ok_or_else(|| TradecastError::InvalidInput {
            reason: "empty price series".into(),
        })?;
        trades.push(close_position(position, last, CloseReason::PeriodEnd, config));
    }

    let metrics = Metrics::compute(&trades, config.initial_capital);
    let equity_curve = build_equity_curve(&trades, config.initial_capital);

    Ok(BacktestResult {
        strategy: strategy.clone(),
        asset: asset.clone(),
        period: Period {
            start: bars[0].timestamp,
            end: bars[bars.len() - 1].timestamp,
        },
        total_return: metrics.total_return,
        win_rate: metrics.win_rate,
        sharpe_ratio: metrics.sharpe_ratio,
        max_drawdown: metrics.max_drawdown,
        total_trades: metrics.total_trades,
        avg_win: metrics.avg_win,
        avg_loss: metrics.avg_loss,
        profit_factor: metrics.profit_factor,
        degenerate: metrics.degenerate,
        trades,
        equity_curve,
    })
}

enum Side {
    Entry,
    Exit,
}

/// Close price adjusted by adverse slippage for the given side.
fn fill_price(close: f64, direction: Direction, side: Side, config: &BacktestConfig) -> f64 {
    let s = config.slippage_rate;
    match (direction, side) {
        (Direction::Long, Side::Entry) | (Direction::Short, Side::Exit) => close * (1.0 + s),
        (Direction::Long, Side::Exit) | (Direction::Short, Side::Entry) => close * (1.0 - s),
    }
}

fn exit_reason(
    position: &OpenPosition,
    strategy: &Strategy,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    index: usize,
    config: &BacktestConfig,
) -> Option<CloseReason> {
    let bar = &bars[index];
    let entry = position.entry_price;

    let stop_hit = match position.direction {
        Direction::Long => bar.close < entry * (1.0 - config.stop_loss_pct),
        Direction::Short => bar.close > entry * (1.0 + config.stop_loss_pct),
    };
    if stop_hit {
        return Some(CloseReason::StopLoss);
    }

    let target_hit = match position.direction {
        Direction::Long => bar.close > entry * (1.0 + config.take_profit_pct),
        Direction::Short => bar.close < entry * (1.0 - config.take_profit_pct),
    };
    if target_hit {
        return Some(CloseReason::TakeProfit);
    }

    if !strategy.exit_rules.is_empty()
        && rule_eval::evaluate_set(&strategy.exit_rules, bars, indicators, index).fired
    {
        return Some(CloseReason::SignalExit);
    }

    let days_held = (bar.timestamp - position.entry_date).num_days();
    if days_held > strategy.max_holding_days as i64 {
        return Some(CloseReason::MaxHold);
    }

    None
}

fn close_position(
    position: &OpenPosition,
    bar: &PriceBar,
    reason: CloseReason,
    config: &BacktestConfig,
) -> TradeResult {
    let exit_price = fill_price(bar.close, position.direction, Side::Exit, config);
    let commission = (position.entry_price + exit_price) * position.quantity * config.commission_rate;
    let slippage = (position.entry_price + exit_price) * position.quantity * config.slippage_rate;

    TradeResult {
        entry_date: position.entry_date,
        exit_date: bar.timestamp,
        entry_price: position.entry_price,
        exit_price,
        quantity: position.quantity,
        pnl: position.gross_pnl(exit_price) - commission,
        commission,
        slippage,
        direction: position.direction,
        reason,
    }
}
