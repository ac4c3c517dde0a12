//! Value ordering helpers for switch-table generators.

use super::const_record::ConstantRecord;

/// Sort records by numeric value. Equal values keep declaration order.
pub fn sort_by_value(records: &mut [ConstantRecord]) {
    records.sort_by(|a, b| a.cmp_value(b));
}

/// Split records into runs of consecutive values.
///
/// Records are sorted first. Of several names sharing a value only the
/// first declared one is kept, matching what a `String()` switch can
/// express.
pub fn split_into_runs(records: &[ConstantRecord]) -> Vec<Vec<ConstantRecord>> {
    let mut sorted = records.to_vec();
    sort_by_value(&mut sorted);
    sorted.dedup_by(|later, earlier| later.cmp_value(earlier).is_eq());

    let mut runs: Vec<Vec<ConstantRecord>> = Vec::new();
    for record in sorted {
        match runs.last_mut() {
            Some(run) if run.last().is_some_and(|prev| prev.precedes(&record)) => run.push(record),
            _ => runs.push(vec![record]),
        }
    }
    runs
}
