//! Aggregate counts over a dataset with stored results.

use std::collections::BTreeMap;

use harness::core::case::RefactoringCase;

use crate::outcome::{CaseOutcome, classify_case};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindCounts {
    pub total: usize,
    pub success: usize,
    pub oracle_fail: usize,
    pub compile_fail: usize,
    pub error: usize,
}

/// Per-kind outcome counts, keyed by the dataset's kind strings.
pub fn aggregate(cases: &[RefactoringCase]) -> BTreeMap<String, KindCounts> {
    let mut summary: BTreeMap<String, KindCounts> = BTreeMap::new();
    for case in cases {
        let counts = summary.entry(case.kind.as_str().to_string()).or_default();
        counts.total += 1;
        match classify_case(case) {
            CaseOutcome::Success => counts.success += 1,
            CaseOutcome::OracleFail => counts.oracle_fail += 1,
            CaseOutcome::CompileFail => counts.compile_fail += 1,
            CaseOutcome::Error => counts.error += 1,
        }
    }
    summary
}

pub fn print_summary(cases: &[RefactoringCase]) {
    let summary = aggregate(cases);
    let mut totals = KindCounts::default();
    for (kind, counts) in &summary {
        println!(
            "{kind}: total={} success={} oracle_fail={} compile_fail={} error={}",
            counts.total, counts.success, counts.oracle_fail, counts.compile_fail, counts.error
        );
        totals.total += counts.total;
        totals.success += counts.success;
        totals.oracle_fail += counts.oracle_fail;
        totals.compile_fail += counts.compile_fail;
        totals.error += counts.error;
    }
    println!(
        "all: total={} success={} oracle_fail={} compile_fail={} error={}",
        totals.total, totals.success, totals.oracle_fail, totals.compile_fail, totals.error
    );
}
