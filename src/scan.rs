use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{detect_sweeps, extract_swings};
use crate::config::AppConfig;
use crate::data::{Bar, SwingSet, SweepSignal};
use crate::loader::{tail_window, validate_series};
use crate::source::{discover_symbols, BarSource};

/// Settings the orchestrator needs for one pass over the instrument universe.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub symbols: usize,
    pub quote_suffix: Option<String>,
    pub lookback: usize,
    pub limit: usize,
    pub workers: usize,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            symbols: config.symbols,
            quote_suffix: config.quote_suffix.clone(),
            lookback: config.lookback,
            limit: config.limit,
            workers: config.workers,
        }
    }
}

/// Result of running the swing and sweep pipeline over one instrument's bars.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentScan {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub swings: SwingSet,
    pub signals: Vec<SweepSignal>,
}

impl InstrumentScan {
    pub fn has_signals(&self) -> bool {
        !self.signals.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Scanned(InstrumentScan),
    Skipped { symbol: String, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub scanned: Vec<InstrumentScan>,
    pub skipped: Vec<(String, String)>,
}

impl ScanSummary {
    pub fn signalled(&self) -> impl Iterator<Item = &InstrumentScan> {
        self.scanned.iter().filter(|scan| scan.has_signals())
    }

    pub fn signal_count(&self) -> usize {
        self.scanned.iter().map(|scan| scan.signals.len()).sum()
    }
}

/// Extract swings and classify the latest bar, recomputing everything from `bars`.
pub fn scan_instrument(symbol: &str, bars: Vec<Bar>, lookback: usize) -> InstrumentScan {
    let swings = extract_swings(&bars, lookback);
    let signals = detect_sweeps(&bars, &swings);
    InstrumentScan {
        symbol: symbol.to_string(),
        bars,
        swings,
        signals,
    }
}

/// Fetch, window, validate and scan a single instrument. Any failure becomes a skip.
pub fn scan_symbol(source: &dyn BarSource, symbol: &str, config: &ScanConfig) -> ScanOutcome {
    let fetched = match source.fetch_bars(symbol) {
        Ok(bars) => bars,
        Err(err) => {
            return ScanOutcome::Skipped {
                symbol: symbol.to_string(),
                reason: format!("{err:#}"),
            }
        }
    };

    let bars = tail_window(fetched, config.limit);
    if let Err(err) = validate_series(&bars) {
        return ScanOutcome::Skipped {
            symbol: symbol.to_string(),
            reason: err.to_string(),
        };
    }

    ScanOutcome::Scanned(scan_instrument(symbol, bars, config.lookback))
}

/// Scan every discovered instrument on a bounded worker pool.
pub fn run_scan(source: &dyn BarSource, config: &ScanConfig) -> Result<ScanSummary> {
    let symbols = discover_symbols(source, config.quote_suffix.as_deref(), config.symbols)?;
    info!(
        instruments = symbols.len(),
        lookback = config.lookback,
        limit = config.limit,
        workers = config.workers,
        "starting sweep scan"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .context("failed to build scan worker pool")?;

    let outcomes: Vec<ScanOutcome> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| scan_symbol(source, symbol, config))
            .collect()
    });

    let mut summary = ScanSummary::default();
    for outcome in outcomes {
        match outcome {
            ScanOutcome::Scanned(scan) => {
                debug!(
                    symbol = %scan.symbol,
                    bars = scan.bars.len(),
                    swings = scan.swings.len(),
                    highs = scan.swings.highs.len(),
                    lows = scan.swings.lows.len(),
                    "scanned instrument"
                );
                for signal in &scan.signals {
                    info!(
                        symbol = %scan.symbol,
                        direction = signal.direction.label(),
                        structure = signal.structure_price,
                        "sweep detected"
                    );
                }
                summary.scanned.push(scan);
            }
            ScanOutcome::Skipped { symbol, reason } => {
                warn!(symbol = %symbol, %reason, "skipping instrument");
                summary.skipped.push((symbol, reason));
            }
        }
    }

    summary.scanned.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    summary.skipped.sort();
    Ok(summary)
}
