//! Position bookkeeping for the backtest simulator.

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

/// Why the simulator closed a position. Checked in this order each bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    SignalExit,
    MaxHold,
    PeriodEnd,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CloseReason::StopLoss => "stop loss triggered",
            CloseReason::TakeProfit => "profit target reached",
            CloseReason::SignalExit => "exit signal fired",
            CloseReason::MaxHold => "maximum holding period reached",
            CloseReason::PeriodEnd => "period end",
        };
        f.write_str(s)
    }
}

/// An open position inside a run. Internal to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_date: NaiveDateTime,
    pub entry_index: usize,
    pub entry_price: f64,
    pub quantity: f64,
    pub direction: Direction,
}

impl OpenPosition {
    /// Raw P&L against an exit price, before costs.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) * self.quantity,
            Direction::Short => (self.entry_price - exit_price) * self.quantity,
        }
    }
}

/// A completed round trip. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeResult {
    pub entry_date: NaiveDateTime,
    pub exit_date: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Net of commission.
    pub pnl: f64,
    pub commission: f64,
    pub slippage: f64,
    pub direction: Direction,
    pub reason: CloseReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn long_pnl_rises_with_price() {
        let position = OpenPosition {
            entry_date: date(1),
            entry_index: 0,
            entry_price: 100.0,
            quantity: 10.0,
            direction: Direction::Long,
        };
        assert!((position.gross_pnl(110.0) - 100.0).abs() < 1e-9);
        assert!((position.gross_pnl(90.0) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn short_pnl_rises_with_falling_price() {
        let position = OpenPosition {
            entry_date: date(1),
            entry_index: 0,
            entry_price: 100.0,
            quantity: 10.0,
            direction: Direction::Short,
        };
        assert!((position.gross_pnl(90.0) - 100.0).abs() < 1e-9);
        assert!((position.gross_pnl(110.0) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn close_reason_serializes_snake_case() {
        let json = serde_json::to_string(&CloseReason::StopLoss).unwrap();
        assert_eq!(json, "\"stop_loss\"");
        let json = serde_json::to_string(&CloseReason::PeriodEnd).unwrap();
        assert_eq!(json, "\"period_end\"");
    }
}
