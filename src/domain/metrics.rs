//! Performance metrics over a completed backtest run.
//!
//! Conventions: `total_return` and `win_rate` are fractions, not percents.
//! Sharpe uses per-trade returns against initial capital, annualized by
//! √252. Degenerate cases resolve by policy and are flagged, never raised:
//! no trades → zero metrics with `degenerate = true`; zero gross loss →
//! `profit_factor = None`.

use crate::domain::position::TradeResult;
use chrono::NaiveDateTime;
use serde::Serialize;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One point of the reconstructed per-trade equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Fraction of initial capital.
    pub total_return: f64,
    /// Fraction of trades with positive P&L; 0 when there are none.
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough fraction of the equity curve.
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Gross profit / gross loss; `None` when gross loss is zero.
    pub profit_factor: Option<f64>,
    /// True when there were no trades to measure.
    pub degenerate: bool,
}

impl Metrics {
    pub fn compute(trades: &[TradeResult], initial_capital: f64) -> Self {
        if trades.is_empty() {
            return Metrics {
                total_return: 0.0,
                win_rate: 0.0,
                sharpe_ratio: 0.0,
                max_drawdown: 0.0,
                total_trades: 0,
                avg_win: 0.0,
                avg_loss: 0.0,
                profit_factor: None,
                degenerate: true,
            };
        }

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let total_return = if initial_capital > 0.0 {
            total_pnl / initial_capital
        } else {
            0.0
        };

        let mut wins = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut losses = 0usize;
        for trade in trades {
            if trade.pnl > 0.0 {
                wins += 1;
                gross_profit += trade.pnl;
            } else if trade.pnl < 0.0 {
                losses += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        let win_rate = wins as f64 / trades.len() as f64;
        let avg_win = if wins > 0 {
            gross_profit / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };
        let profit_factor = (gross_loss > 0.0).then(|| gross_profit / gross_loss);

        let equity_curve = build_equity_curve(trades, initial_capital);

        Metrics {
            total_return,
            win_rate,
            sharpe_ratio: compute_sharpe(trades, initial_capital),
            max_drawdown: compute_drawdown(&equity_curve),
            total_trades: trades.len(),
            avg_win,
            avg_loss,
            profit_factor,
            degenerate: false,
        }
    }
}

/// Equity after each closed trade. The curve opens with an
/// initial-capital point at the first entry, so starting capital is a
/// peak candidate for drawdown.
pub fn build_equity_curve(trades: &[TradeResult], initial_capital: f64) -> Vec<EquityPoint> {
    let Some(first) = trades.first() else {
        return Vec::new();
    };
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(EquityPoint {
        date: first.entry_date,
        equity: initial_capital,
    });
    let mut equity = initial_capital;
    for trade in trades {
        equity += trade.pnl;
        curve.push(EquityPoint {
            date: trade.exit_date,
            equity,
        });
    }
    curve
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn compute_sharpe(trades: &[TradeResult], initial_capital: f64) -> f64 {
    if trades.len() < 2 || initial_capital <= 0.0 {
        return 0.0;
    }

    let returns: Vec<f64> = trades.iter().map(|t| t.pnl / initial_capital).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{CloseReason, Direction};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn trade(day: u32, pnl: f64) -> TradeResult {
        let entry = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TradeResult {
            entry_date: entry,
            exit_date: entry + chrono::Duration::days(1),
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 10.0,
            quantity: 10.0,
            pnl,
            commission: 0.0,
            slippage: 0.0,
            direction: Direction::Long,
            reason: CloseReason::TakeProfit,
        }
    }

    #[test]
    fn no_trades_is_degenerate() {
        let metrics = Metrics::compute(&[], 10_000.0);
        assert!(metrics.degenerate);
        assert_eq!(metrics.total_trades, 0);
        assert!(metrics.win_rate.abs() < f64::EPSILON);
        assert!(metrics.total_return.abs() < f64::EPSILON);
        assert_eq!(metrics.profit_factor, None);
    }

    #[test]
    fn win_rate_is_exact_fraction() {
        let trades = vec![trade(1, 100.0), trade(3, -50.0), trade(5, 200.0), trade(7, 0.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert_relative_eq!(metrics.win_rate, 0.5);
        assert_eq!(metrics.total_trades, 4);
    }

    #[test]
    fn total_return_is_fraction_of_capital() {
        let trades = vec![trade(1, 500.0), trade(3, -200.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert_relative_eq!(metrics.total_return, 0.03, max_relative = 1e-12);
    }

    #[test]
    fn profit_factor_none_without_losses() {
        let trades = vec![trade(1, 100.0), trade(3, 200.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert_eq!(metrics.profit_factor, None);
        assert!(!metrics.degenerate);
    }

    #[test]
    fn profit_factor_ratio() {
        let trades = vec![trade(1, 300.0), trade(3, -100.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert!((metrics.profit_factor.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn avg_win_and_loss() {
        let trades = vec![trade(1, 100.0), trade(3, 300.0), trade(5, -50.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert!((metrics.avg_win - 200.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 50.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_from_equity_curve() {
        // equity: 10_000 → 11_000 → 10_450 → 11_495
        let trades = vec![trade(1, 1_000.0), trade(3, -550.0), trade(5, 1_045.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert_relative_eq!(metrics.max_drawdown, 0.05, max_relative = 1e-9);
    }

    #[test]
    fn drawdown_anchored_at_initial_capital() {
        // No trade ever exceeds starting equity: the decline is measured
        // from 10_000, not from the post-first-trade level.
        let trades = vec![trade(1, -1_000.0), trade(3, -1_000.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert_relative_eq!(metrics.max_drawdown, 0.2, max_relative = 1e-9);
    }

    #[test]
    fn sharpe_zero_for_constant_returns() {
        let trades = vec![trade(1, 100.0), trade(3, 100.0), trade(5, 100.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert!(metrics.sharpe_ratio.abs() < 1e-9);
    }

    #[test]
    fn sharpe_positive_for_mostly_winning_trades() {
        let trades = vec![trade(1, 100.0), trade(3, 200.0), trade(5, -50.0)];
        let metrics = Metrics::compute(&trades, 10_000.0);
        assert!(metrics.sharpe_ratio > 0.0);
    }

    #[test]
    fn equity_curve_opens_at_initial_capital() {
        let trades = vec![trade(1, 100.0), trade(3, -40.0)];
        let curve = build_equity_curve(&trades, 1_000.0);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[0].date, trades[0].entry_date);
        assert!((curve[0].equity - 1_000.0).abs() < 1e-9);
        assert!((curve[1].equity - 1_100.0).abs() < 1e-9);
        assert!((curve[2].equity - 1_060.0).abs() < 1e-9);
    }

    #[test]
    fn equity_curve_empty_without_trades() {
        assert!(build_equity_curve(&[], 1_000.0).is_empty());
    }
}
