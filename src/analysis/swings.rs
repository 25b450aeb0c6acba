use crate::data::{Bar, SwingKind, SwingPoint, SwingSet};

/// Locate swing highs and lows over a symmetric `lookback` window and compute the index
/// at which each one is invalidated by a later bar.
///
/// Series shorter than `2 * lookback + 1` bars yield an empty set. Bars tied for a
/// window extremum each produce their own swing point.
pub fn extract_swings(bars: &[Bar], lookback: usize) -> SwingSet {
    if lookback == 0 || bars.len() <= lookback.saturating_mul(2) {
        return SwingSet::default();
    }

    let last_index = bars.len() - 1;
    let mut swings = SwingSet::default();

    for idx in lookback..bars.len() - lookback {
        let window = &bars[idx - lookback..=idx + lookback];
        let bar = &bars[idx];

        let window_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        if bar.high == window_high {
            let expiry_index = first_break(bars, idx, |later| later.high > bar.high);
            swings.highs.push(SwingPoint {
                source_index: idx,
                price: bar.high,
                timestamp: bar.timestamp,
                expiry_index: expiry_index.unwrap_or(last_index),
                kind: SwingKind::High,
            });
        }

        let window_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        if bar.low == window_low {
            let expiry_index = first_break(bars, idx, |later| later.low < bar.low);
            swings.lows.push(SwingPoint {
                source_index: idx,
                price: bar.low,
                timestamp: bar.timestamp,
                expiry_index: expiry_index.unwrap_or(last_index),
                kind: SwingKind::Low,
            });
        }
    }

    swings
}

fn first_break<F>(bars: &[Bar], idx: usize, breaks: F) -> Option<usize>
where
    F: Fn(&Bar) -> bool,
{
    bars[idx + 1..]
        .iter()
        .position(breaks)
        .map(|offset| idx + 1 + offset)
}
