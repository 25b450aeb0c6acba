use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// Single OHLCV bar sampled at a uniform interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Prices are finite and positive, and the high/low bracket the open and close.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwingKind {
    High,
    Low,
}

/// Local extremum qualified over a symmetric window, with the index at which a later
/// bar first trades through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingPoint {
    pub source_index: usize,
    pub price: f64,
    pub timestamp: DateTime<Tz>,
    /// First later index that breaks the level, or the last index of the series.
    pub expiry_index: usize,
    pub kind: SwingKind,
}

/// Swing highs and lows extracted from one series, each in ascending source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwingSet {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingSet {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.highs.len() + self.lows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Short,
    Long,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Short => "Short",
            Direction::Long => "Long",
        }
    }
}

/// Sweep detected on the most recent bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSignal {
    pub at_index: usize,
    pub timestamp: DateTime<Tz>,
    pub direction: Direction,
    pub structure_price: f64,
}
