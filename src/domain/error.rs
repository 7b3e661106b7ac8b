//! Domain error types.
//!
//! Validation failures are fatal and local to a single request. Degenerate
//! numeric cases (zero-division in RSI, profit factor with no losses) are
//! resolved by policy in the modules that own them and surface as `Option`
//! fields, never as errors.

/// A parse error with position information for rule expressions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for tradecast.
#[derive(Debug, thiserror::Error)]
pub enum TradecastError {
    #[error("invalid price data: {reason}")]
    InvalidInput { reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("unknown strategy: {id}")]
    UnknownStrategy { id: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("run cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradecastError> for std::process::ExitCode {
    fn from(err: &TradecastError) -> Self {
        let code: u8 = match err {
            TradecastError::Io(_) | TradecastError::Serialization(_) => 1,
            TradecastError::ConfigParse { .. }
            | TradecastError::ConfigMissing { .. }
            | TradecastError::ConfigInvalid { .. } => 2,
            TradecastError::RuleParse(_)
            | TradecastError::RuleInvalid { .. }
            | TradecastError::UnknownStrategy { .. } => 3,
            TradecastError::InvalidInput { .. }
            | TradecastError::InsufficientData { .. }
            | TradecastError::DataSource { .. } => 4,
            TradecastError::Cancelled => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError {
            message: "expected operand".into(),
            position: 4,
        };
        assert_eq!(err.to_string(), "parse error at position 4: expected operand");
    }

    #[test]
    fn parse_error_caret_context() {
        let err = ParseError {
            message: "unexpected token".into(),
            position: 6,
        };
        let rendered = err.display_with_context("close >> 100");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "close >> 100");
        assert_eq!(lines[1], "      ^");
    }

    fn exit_code_of(err: &TradecastError) -> String {
        format!("{:?}", std::process::ExitCode::from(err))
    }

    #[test]
    fn exit_codes_by_category() {
        let config = TradecastError::ConfigMissing {
            section: "backtest".into(),
            key: "initial_capital".into(),
        };
        assert_eq!(exit_code_of(&config), format!("{:?}", std::process::ExitCode::from(2u8)));

        let data = TradecastError::InsufficientData {
            symbol: "AAPL".into(),
            bars: 10,
            minimum: 30,
        };
        assert_eq!(exit_code_of(&data), format!("{:?}", std::process::ExitCode::from(4u8)));

        assert_eq!(
            exit_code_of(&TradecastError::Cancelled),
            format!("{:?}", std::process::ExitCode::from(5u8))
        );
    }
}
