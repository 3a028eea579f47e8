//! Completion statistics: CSV export and cohort averages.

use std::ops::Range;
use std::path::Path;

use csv::Writer;

use lot_motion::{LegKind, TravelRecord};

use crate::{CompletionRow, OutputResult};

/// Write one row per record to a new CSV file at `path`.
pub fn write_completion_stats(path: &Path, records: &[TravelRecord]) -> OutputResult<()> {
    let mut w = Writer::from_path(path)?;
    w.write_record(CompletionRow::HEADER)?;
    for record in records {
        w.write_record(CompletionRow::from(record).fields())?;
    }
    w.flush()?;
    Ok(())
}

/// Which counter [`cohort_average`] averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortMetric {
    Elapsed,
    Delay,
}

/// Mean of `metric` over completed inbound legs whose agent's admission
/// index lies in `range`.  `0.0` when no leg qualifies.
///
/// With 20 agents, `0..10` and `10..20` compare the first and last halves
/// of an admission sequence.
pub fn cohort_average(records: &[TravelRecord], range: Range<usize>, metric: CohortMetric) -> f64 {
    let (sum, n) = records
        .iter()
        .filter(|r| matches!(r.leg, LegKind::Inbound { .. }))
        .filter(|r| range.contains(&r.admission_index))
        .map(|r| match metric {
            CohortMetric::Elapsed => r.elapsed_ticks,
            CohortMetric::Delay => r.delay_ticks,
        })
        .fold((0u64, 0u64), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}
