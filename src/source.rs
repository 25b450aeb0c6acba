use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use itertools::Itertools;

use crate::data::Bar;
use crate::loader::load_bars_from_csv;

/// Where instruments and their bar history come from.
pub trait BarSource: Sync {
    /// Every instrument the source can serve, in no particular order.
    fn list_symbols(&self) -> Result<Vec<String>>;

    /// Bars for one instrument, sorted ascending by timestamp.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>>;
}

/// One `<SYMBOL>.csv` file per instrument inside a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    timezone: Tz,
}

impl CsvDirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P, timezone: Tz) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            timezone,
        }
    }
}

impl BarSource for CsvDirectorySource {
    fn list_symbols(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read data directory {:?}", self.dir))?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        Ok(symbols)
    }

    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let path = self.dir.join(format!("{symbol}.csv"));
        load_bars_from_csv(&path, self.timezone)
            .with_context(|| format!("failed to load bars for {symbol}"))
    }
}

/// Filter by quote suffix, sort, and keep the first `count` symbols.
pub fn discover_symbols(
    source: &dyn BarSource,
    quote_suffix: Option<&str>,
    count: usize,
) -> Result<Vec<String>> {
    let symbols = source
        .list_symbols()?
        .into_iter()
        .filter(|symbol| quote_suffix.map_or(true, |suffix| symbol.ends_with(suffix)))
        .sorted()
        .dedup()
        .take(count)
        .collect();
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::utc;

    struct FixedSymbols(Vec<&'static str>);

    impl BarSource for FixedSymbols {
        fn list_symbols(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }

        fn fetch_bars(&self, _symbol: &str) -> Result<Vec<Bar>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn discovery_filters_sorts_and_truncates() {
        let source = FixedSymbols(vec!["SOL-USDT", "BTC-USDT", "ETH-USDC", "ADA-USDT"]);
        let symbols = discover_symbols(&source, Some("-USDT"), 2).unwrap();
        assert_eq!(symbols, vec!["ADA-USDT", "BTC-USDT"]);

        let all = discover_symbols(&source, None, 10).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], "ADA-USDT");
    }

    #[test]
    fn csv_directory_lists_only_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BTC-USDT.csv"), "1704067200000,1,2,0.5,1.5\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let source = CsvDirectorySource::new(dir.path(), utc());
        let symbols = source.list_symbols().unwrap();
        assert_eq!(symbols, vec!["BTC-USDT".to_string()]);

        let bars = source.fetch_bars("BTC-USDT").unwrap();
        assert_eq!(bars.len(), 1);
        assert!(source.fetch_bars("ETH-USDT").is_err());
    }
}
