use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::data::{Bar, Direction, SwingKind, SwingPoint};
use crate::scan::{InstrumentScan, ScanSummary};

#[derive(Tabled)]
struct SignalRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Direction")]
    direction: &'static str,
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Wick")]
    wick: String,
}

pub fn print_report(summary: &ScanSummary, timezone: Tz) {
    println!("\n=== Liquidity Sweep Scan ===\n");
    println!(
        "Scanned {} instruments ({} skipped)",
        summary.scanned.len(),
        summary.skipped.len()
    );

    let rows: Vec<SignalRow> = summary
        .signalled()
        .flat_map(|scan| {
            let current = scan.bars.last();
            scan.signals.iter().map(move |signal| {
                let (close, wick) = match current {
                    Some(bar) => (
                        format!("{:.4}", bar.close),
                        format!(
                            "{:.4}",
                            match signal.direction {
                                Direction::Short => bar.high,
                                Direction::Long => bar.low,
                            }
                        ),
                    ),
                    None => ("-".to_string(), "-".to_string()),
                };
                SignalRow {
                    symbol: scan.symbol.clone(),
                    time: signal
                        .timestamp
                        .with_timezone(&timezone)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                    direction: signal.direction.label(),
                    structure: format!("{:.4}", signal.structure_price),
                    close,
                    wick,
                }
            })
        })
        .collect();

    if rows.is_empty() {
        println!("No sweep signals this cycle.");
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{table}\n");
}

/// Horizontal structure level spanning from the swing bar to the bar that broke it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureLine {
    pub kind: SwingKind,
    pub price: f64,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepMarker {
    pub at_index: usize,
    pub direction: Direction,
    pub structure_price: f64,
    pub marker_price: f64,
}

/// Everything a chart renderer needs to redraw one instrument without recomputation.
/// Indices refer to the full scanned series; `window_start` is the index of `bars[0]`.
#[derive(Debug, Clone, Serialize)]
pub struct ChartHandoff {
    pub symbol: String,
    pub window_start: usize,
    pub bars: Vec<Bar>,
    pub structures: Vec<StructureLine>,
    pub markers: Vec<SweepMarker>,
}

impl ChartHandoff {
    pub fn from_scan(scan: &InstrumentScan, chart_bars: usize) -> Self {
        let window_start = scan.bars.len().saturating_sub(chart_bars);

        // Levels that were used up before the window opens are not drawn.
        let line = |point: &SwingPoint| StructureLine {
            kind: point.kind,
            price: point.price,
            start_index: point.source_index,
            end_index: point.expiry_index,
        };
        let structures = scan
            .swings
            .highs
            .iter()
            .chain(scan.swings.lows.iter())
            .filter(|point| point.expiry_index >= window_start)
            .map(line)
            .collect();

        let markers = scan
            .signals
            .iter()
            .filter_map(|signal| {
                let bar = scan.bars.get(signal.at_index)?;
                let marker_price = match signal.direction {
                    Direction::Short => bar.high,
                    Direction::Long => bar.low,
                };
                Some(SweepMarker {
                    at_index: signal.at_index,
                    direction: signal.direction,
                    structure_price: signal.structure_price,
                    marker_price,
                })
            })
            .collect();

        Self {
            symbol: scan.symbol.clone(),
            window_start,
            bars: scan.bars[window_start..].to_vec(),
            structures,
            markers,
        }
    }
}

pub fn write_json_report<P: AsRef<Path>>(
    path: P,
    summary: &ScanSummary,
    chart_bars: usize,
) -> Result<usize> {
    let path_ref = path.as_ref();
    let handoffs: Vec<ChartHandoff> = summary
        .signalled()
        .map(|scan| ChartHandoff::from_scan(scan, chart_bars))
        .collect();

    let file =
        File::create(path_ref).with_context(|| format!("failed to create {:?}", path_ref))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &handoffs)
        .with_context(|| format!("failed to write chart report to {:?}", path_ref))?;
    Ok(handoffs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::bars_from;
    use crate::scan::scan_instrument;

    fn swept_scan() -> InstrumentScan {
        // Bar 1's high is broken at bar 3, bar 4's at bar 5; bar 5 rejects back below 106.
        let bars = bars_from(&[
            (101.0, 99.0, 100.0),
            (105.0, 99.5, 100.0),
            (102.0, 99.2, 100.0),
            (105.5, 99.6, 100.0),
            (106.0, 99.7, 100.0),
            (103.0, 99.8, 100.0),
            (106.5, 99.9, 105.0),
        ]);
        scan_instrument("BTC-USDT", bars, 1)
    }

    #[test]
    fn handoff_keeps_spans_and_markers() {
        let scan = swept_scan();
        let handoff = ChartHandoff::from_scan(&scan, 150);
        assert_eq!(handoff.window_start, 0);
        assert_eq!(handoff.bars.len(), 7);

        let high_at_four = handoff
            .structures
            .iter()
            .find(|line| line.kind == SwingKind::High && line.start_index == 4)
            .expect("structure for swing high at bar 4");
        assert_eq!(high_at_four.end_index, 6);

        assert_eq!(handoff.markers.len(), 1);
        assert_eq!(handoff.markers[0].at_index, 6);
        assert_eq!(handoff.markers[0].marker_price, 106.5);
        assert_eq!(handoff.markers[0].structure_price, 106.0);
    }

    #[test]
    fn handoff_drops_levels_expired_before_window() {
        let scan = swept_scan();
        let handoff = ChartHandoff::from_scan(&scan, 3);
        assert_eq!(handoff.window_start, 4);
        assert_eq!(handoff.bars.len(), 3);
        assert!(handoff
            .structures
            .iter()
            .all(|line| line.end_index >= handoff.window_start));
        assert!(!handoff
            .structures
            .iter()
            .any(|line| line.kind == SwingKind::High && line.start_index == 1));
    }

    #[test]
    fn json_report_contains_only_signalled_instruments() {
        let quiet = scan_instrument("ETH-USDT", bars_from(&[(101.0, 100.0, 100.5); 5]), 1);
        let summary = ScanSummary {
            scanned: vec![swept_scan(), quiet],
            skipped: Vec::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let written = write_json_report(&path, &summary, 150).unwrap();
        assert_eq!(written, 1);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["symbol"], "BTC-USDT");
        assert_eq!(entries[0]["markers"][0]["direction"], "Short");
    }
}
