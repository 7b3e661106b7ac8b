//! Core domain types and logic.

pub mod backtest;
pub mod catalog;
pub mod error;
pub mod forecast;
pub mod indicator;
pub mod metrics;
pub mod position;
pub mod price;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod signal;
pub mod strategy;
