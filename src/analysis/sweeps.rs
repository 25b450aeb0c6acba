use crate::data::{Bar, Direction, SwingPoint, SwingSet, SweepSignal};

/// Classify the most recent bar against swing levels that expire on that bar.
///
/// A high whose wick trades above the level but closes at or below it is a Short sweep;
/// a low pierced from above with a close at or above it is a Long sweep. Levels that
/// expired on an earlier bar are ignored. Highs are reported before lows.
pub fn detect_sweeps(bars: &[Bar], swings: &SwingSet) -> Vec<SweepSignal> {
    let Some(current) = bars.last() else {
        return Vec::new();
    };
    let last_index = bars.len() - 1;

    let shorts = active(&swings.highs, last_index)
        .filter(|high| current.high > high.price && current.close <= high.price)
        .map(|high| signal(current, last_index, Direction::Short, high));

    let longs = active(&swings.lows, last_index)
        .filter(|low| current.low < low.price && current.close >= low.price)
        .map(|low| signal(current, last_index, Direction::Long, low));

    shorts.chain(longs).collect()
}

fn active(points: &[SwingPoint], last_index: usize) -> impl Iterator<Item = &SwingPoint> {
    points
        .iter()
        .filter(move |point| point.expiry_index == last_index)
}

fn signal(current: &Bar, at_index: usize, direction: Direction, point: &SwingPoint) -> SweepSignal {
    SweepSignal {
        at_index,
        timestamp: current.timestamp,
        direction,
        structure_price: point.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract_swings;
    use crate::data::test_support::bars_from;

    fn detect(triples: &[(f64, f64, f64)], lookback: usize) -> Vec<SweepSignal> {
        let bars = bars_from(triples);
        let swings = extract_swings(&bars, lookback);
        detect_sweeps(&bars, &swings)
    }

    #[test]
    fn empty_series_has_no_signals() {
        assert!(detect_sweeps(&[], &SwingSet::default()).is_empty());
    }

    #[test]
    fn wick_above_high_with_rejection_is_short() {
        let signals = detect(
            &[
                (101.0, 99.0, 100.0),
                (105.0, 99.5, 100.0),
                (102.0, 99.2, 100.0),
                (106.0, 99.8, 104.5),
            ],
            1,
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Short);
        assert_eq!(signals[0].structure_price, 105.0);
        assert_eq!(signals[0].at_index, 3);
    }

    #[test]
    fn close_exactly_on_level_still_counts() {
        let signals = detect(
            &[
                (101.0, 99.0, 100.0),
                (101.5, 95.0, 100.0),
                (101.0, 98.0, 100.0),
                (101.2, 94.0, 95.0),
            ],
            1,
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Long);
        assert_eq!(signals[0].structure_price, 95.0);
    }

    #[test]
    fn breakout_close_is_not_a_sweep() {
        let signals = detect(
            &[
                (101.0, 99.0, 100.0),
                (105.0, 99.5, 100.0),
                (102.0, 99.2, 100.0),
                (107.0, 99.8, 106.0),
            ],
            1,
        );
        assert!(signals.is_empty());
    }

    #[test]
    fn level_broken_earlier_does_not_refire() {
        // Bar 3 breaks the high at bar 1; bar 4 wicks above it again and rejects.
        let signals = detect(
            &[
                (101.0, 99.0, 100.0),
                (105.0, 99.5, 100.0),
                (102.0, 99.2, 100.0),
                (105.5, 99.4, 104.0),
                (105.2, 99.6, 104.0),
            ],
            1,
        );
        assert!(signals.iter().all(|s| s.structure_price != 105.0));
    }

    #[test]
    fn tied_levels_fire_separately_highs_first() {
        let bars = bars_from(&[
            (101.0, 99.0, 100.0),
            (105.0, 95.0, 100.0),
            (105.0, 95.0, 100.0),
            (102.0, 99.0, 100.0),
            (106.0, 94.0, 100.0),
        ]);
        let swings = extract_swings(&bars, 1);
        let signals = detect_sweeps(&bars, &swings);
        let directions: Vec<Direction> = signals.iter().map(|s| s.direction).collect();
        assert_eq!(
            directions,
            vec![
                Direction::Short,
                Direction::Short,
                Direction::Long,
                Direction::Long
            ]
        );
        assert!(signals.iter().all(|s| s.at_index == 4));
    }
}
