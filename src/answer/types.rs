// src/answer/types.rs

use std::fmt;

/// One normalized response from the structured-answer service.
///
/// `coordinates` and `cells` are parallel: the i-th cell was read from the
/// i-th `(row, column)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredAnswer {
    pub answer: String,
    pub coordinates: Vec<(i64, i64)>,
    pub cells: Vec<String>,
    pub aggregator: String,
}

/// A summed energy quantity. Displays as `"6.0 kWh"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregatedQuantity(f64);

impl AggregatedQuantity {
    pub const UNIT: &'static str = "kWh";

    pub fn new(value: f64) -> Self {
        AggregatedQuantity(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for AggregatedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.0, Self::UNIT)
    }
}
