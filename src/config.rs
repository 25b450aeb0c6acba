use std::path::PathBuf;

use chrono_tz::Tz;
use clap::builder::TypedValueParser;
use clap::Parser;

/// Command-line configuration for the liquidity sweep scanner.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Directory holding one `<SYMBOL>.csv` bar file per instrument.
    #[arg(short = 'd', long = "data-dir", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Maximum number of instruments to scan, taken in sorted order.
    #[arg(long, default_value_t = 100)]
    pub symbols: usize,

    /// Only scan symbols ending with this suffix (e.g. `-USDT`).
    #[arg(long)]
    pub quote_suffix: Option<String>,

    /// Half-width of the window used to qualify swing highs and lows.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub lookback: usize,

    /// Number of most recent bars scanned per instrument.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub limit: usize,

    /// Worker threads used to scan instruments in parallel.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub workers: usize,

    /// IANA timezone used to localise bar timestamps.
    #[arg(long = "tz", default_value = "Asia/Taipei", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// Write chart data for every signalled instrument to this JSON file.
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Trailing bars included in each chart handoff.
    #[arg(long, default_value_t = 150)]
    pub chart_bars: usize,
}

fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|err| format!("unknown timezone {value:?}: {err}"))
}
