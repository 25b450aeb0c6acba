use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sweep_scanner::config::AppConfig;
use sweep_scanner::output::{print_report, write_json_report};
use sweep_scanner::scan::{run_scan, ScanConfig};
use sweep_scanner::source::CsvDirectorySource;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::parse();
    run(&config)
}

fn run(config: &AppConfig) -> Result<()> {
    if !config.data_dir.is_dir() {
        bail!("data directory {:?} does not exist", config.data_dir);
    }

    let source = CsvDirectorySource::new(&config.data_dir, config.timezone);
    let scan_config = ScanConfig::from(config);
    let summary = run_scan(&source, &scan_config)?;
    if summary.scanned.is_empty() {
        warn!(skipped = summary.skipped.len(), "no instrument produced usable data");
    }

    print_report(&summary, config.timezone);

    if let Some(path) = &config.report_json {
        let written = write_json_report(path, &summary, config.chart_bars)?;
        info!(instruments = written, path = %path.display(), "wrote chart report");
    }

    Ok(())
}
