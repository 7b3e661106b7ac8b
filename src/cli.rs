//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::baseline_predictor::BaselinePredictor;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report;
use crate::domain::backtest::{run_backtest, BacktestConfig, CancelToken};
use crate::domain::catalog;
use crate::domain::error::TradecastError;
use crate::domain::forecast::{batch_forecast, generate_forecast, ForecastParams};
use crate::domain::price::{Asset, AssetType, PriceSeries, Timeframe};
use crate::domain::signal::{BlendWeights, CONFIDENCE_FLOOR};
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tradecast", about = "Trading forecast and backtest engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a strategy over historical data
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a forecast for a symbol
    Forecast {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Strategy id; omit to forecast every built-in strategy
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long, default_value = "1d")]
        timeframe: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the built-in strategy catalog
    Strategies,
    /// Validate the strategies defined in a config file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            output,
        } => cmd_backtest(&config, symbol.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Forecast {
            config,
            symbol,
            strategy,
            timeframe,
            output,
        } => cmd_forecast(
            &config,
            &symbol,
            strategy.as_deref(),
            &timeframe,
            output.as_deref(),
        ),
        Command::Strategies => cmd_strategies(),
        Command::Validate { config } => cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn load_config(path: &std::path::Path) -> Result<FileConfigAdapter, TradecastError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradecastError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, TradecastError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| TradecastError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

fn backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", defaults.initial_capital),
        commission_rate: config.get_double("backtest", "commission_rate", defaults.commission_rate),
        slippage_rate: config.get_double("backtest", "slippage_rate", defaults.slippage_rate),
        stop_loss_pct: config.get_double("backtest", "stop_loss_pct", defaults.stop_loss_pct),
        take_profit_pct: config.get_double("backtest", "take_profit_pct", defaults.take_profit_pct),
    }
}

fn forecast_params(config: &dyn ConfigPort) -> ForecastParams {
    ForecastParams {
        weights: BlendWeights {
            rule: config.get_double("forecast", "rule_weight", 0.5),
            ml: config.get_double("forecast", "ml_weight", 0.5),
        },
        confidence_floor: config.get_double("forecast", "confidence_floor", CONFIDENCE_FLOOR),
    }
}

fn make_asset(config: &dyn ConfigPort, symbol: &str) -> Asset {
    let asset_type = match config.get_string("asset", "type").as_deref() {
        Some("crypto") => AssetType::Crypto,
        Some("future") => AssetType::Future,
        Some("option") => AssetType::Option,
        _ => AssetType::Stock,
    };
    Asset {
        symbol: symbol.to_string(),
        name: config
            .get_string("asset", "name")
            .unwrap_or_else(|| symbol.to_string()),
        asset_type,
        exchange: config.get_string("asset", "exchange"),
    }
}

/// Built-in strategies win; anything else must be a `[strategy.<id>]`
/// section in the config.
fn resolve_strategy(config: &dyn ConfigPort, id: &str) -> Result<Strategy, TradecastError> {
    match catalog::find_strategy(id) {
        Ok(strategy) => Ok(strategy),
        Err(TradecastError::UnknownStrategy { .. }) => catalog::load_strategy(config, id),
        Err(e) => Err(e),
    }
}

fn resolve_output(
    rendered: String,
    output: Option<&std::path::Path>,
) -> Result<(), TradecastError> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            Ok(())
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn cmd_backtest(
    config_path: &std::path::Path,
    symbol_override: Option<&str>,
    strategy_override: Option<&str>,
    output: Option<&std::path::Path>,
) -> Result<(), TradecastError> {
    let config = load_config(config_path)?;

    let symbol = match symbol_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("backtest", "symbol")
            .ok_or_else(|| TradecastError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            })?,
    };
    let strategy_id = match strategy_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("backtest", "strategy")
            .ok_or_else(|| TradecastError::ConfigMissing {
                section: "backtest".into(),
                key: "strategy".into(),
            })?,
    };

    let strategy = resolve_strategy(&config, &strategy_id)?;
    eprintln!("Backtesting {} on {}", strategy.name, symbol);

    let series: PriceSeries = data_adapter(&config)?.fetch_series(&symbol, None, None)?;
    eprintln!("Loaded {} bars", series.len());

    let asset = make_asset(&config, &symbol);
    let result = run_backtest(
        &strategy,
        &asset,
        &series,
        &backtest_config(&config),
        &CancelToken::new(),
    )?;

    eprintln!(
        "{} trades, total return {:.2}%",
        result.total_trades,
        result.total_return * 100.0
    );
    resolve_output(json_report::render(&result)?, output)
}

fn cmd_forecast(
    config_path: &std::path::Path,
    symbol: &str,
    strategy_id: Option<&str>,
    timeframe: &str,
    output: Option<&std::path::Path>,
) -> Result<(), TradecastError> {
    let config = load_config(config_path)?;
    let timeframe: Timeframe = timeframe
        .parse()
        .map_err(|reason| TradecastError::InvalidInput { reason })?;

    let series = data_adapter(&config)?.fetch_series(symbol, None, None)?;
    eprintln!("Loaded {} bars for {}", series.len(), symbol);

    let asset = make_asset(&config, symbol);
    let params = forecast_params(&config);
    let predictor = BaselinePredictor::new();

    let rendered = match strategy_id {
        Some(id) => {
            let strategy = resolve_strategy(&config, id)?;
            let result = generate_forecast(
                &asset,
                &strategy,
                &series,
                timeframe,
                Some(&predictor),
                &params,
            )?;
            json_report::render(&result)?
        }
        None => {
            let strategies = catalog::builtin_strategies()?;
            let results = batch_forecast(
                &asset,
                &strategies,
                &series,
                timeframe,
                Some(&predictor),
                &params,
            )?;
            json_report::render(&results)?
        }
    };

    resolve_output(rendered, output)
}

fn cmd_strategies() -> Result<(), TradecastError> {
    let strategies = catalog::builtin_strategies()?;
    for s in &strategies {
        println!(
            "{:<26} {:<32} {} / {:?} risk, capital {}",
            s.id, s.name, s.category, s.risk_level, s.capital_required
        );
    }
    Ok(())
}

fn cmd_validate(config_path: &std::path::Path) -> Result<(), TradecastError> {
    let config = load_config(config_path)?;
    let ids = config
        .get_string("strategies", "ids")
        .ok_or_else(|| TradecastError::ConfigMissing {
            section: "strategies".into(),
            key: "ids".into(),
        })?;

    for id in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let strategy = catalog::load_strategy(&config, id)?;
        eprintln!("{}: ok ({} entry rules)", id, strategy.entry_rules.rules.len());
    }
    Ok(())
}
