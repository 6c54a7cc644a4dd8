//! Pure reductions over normalized campaign collections.

mod aggregate;
mod benchmarks;
mod highlights;
mod trend;

pub use aggregate::{aggregate, AggregateTotals};
pub use benchmarks::{compare, Benchmark, ComparisonResult};
pub use highlights::{select_highlights, Highlights};
pub use trend::{build_trend, Granularity, TrendPoint};
