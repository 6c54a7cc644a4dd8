use serde::{Deserialize, Serialize};

use super::aggregate::AggregateTotals;

/// Published industry averages, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub label: String,
    pub open_rate: f64,
    pub click_rate: f64,
}

impl Benchmark {
    pub fn new(label: &str, open_rate: f64, click_rate: f64) -> Self {
        Self {
            label: label.to_string(),
            open_rate,
            click_rate,
        }
    }

    pub fn industry_defaults() -> Vec<Self> {
        INDUSTRY_BENCHMARKS
            .iter()
            .map(|(label, open, click)| Self::new(label, *open, *click))
            .collect()
    }

    fn rate_fraction(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Open => self.open_rate / 100.0,
            Metric::Click => self.click_rate / 100.0,
        }
    }
}

/// (label, open %, click %)
pub const INDUSTRY_BENCHMARKS: [(&str, f64, f64); 5] = [
    ("Religion & Church", 27.0, 2.9),
    ("Nonprofit", 25.2, 2.7),
    ("Education", 28.5, 2.9),
    ("Marketing & Advertising", 17.4, 2.0),
    ("All Industries", 21.3, 2.6),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Open,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

/// Rates are fractions; `delta` is in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub benchmark_label: String,
    pub metric: Metric,
    pub your_rate: f64,
    pub industry_rate: f64,
    pub delta: f64,
    pub direction: Direction,
}

/// One open and one click comparison per benchmark, in table order.
pub fn compare(totals: &AggregateTotals, benchmarks: &[Benchmark]) -> Vec<ComparisonResult> {
    benchmarks
        .iter()
        .flat_map(|benchmark| {
            [
                (Metric::Open, totals.avg_open_rate),
                (Metric::Click, totals.avg_click_rate),
            ]
            .into_iter()
            .map(move |(metric, your_rate)| compare_rate(benchmark, metric, your_rate))
        })
        .collect()
}

fn compare_rate(benchmark: &Benchmark, metric: Metric, your_rate: f64) -> ComparisonResult {
    let industry_rate = benchmark.rate_fraction(metric);
    let delta = (your_rate - industry_rate) * 100.0;

    ComparisonResult {
        benchmark_label: benchmark.label.clone(),
        metric,
        your_rate,
        industry_rate,
        delta,
        // ties count as above
        direction: if delta >= 0.0 {
            Direction::Above
        } else {
            Direction::Below
        },
    }
}
