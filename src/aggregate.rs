use crate::entry::Entry;
use serde::Serialize;
use std::collections::HashMap;

/// Per-date summary feeding the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePoint {
    pub group_key: String,
    pub avg_performance: f64,
    pub total_profit: f64,
    pub count: usize,
}

#[derive(Default)]
struct Bucket {
    performance_sum: f64,
    profit_sum: f64,
    count: usize,
}

/// Groups entries by date key and averages performance / sums profit.
///
/// Points come out in order of first appearance of their key, not sorted
/// by date. Entries without any date all land in the `""` bucket.
pub fn aggregate(entries: &[Entry]) -> Vec<AggregatePoint> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(&str, Bucket)> = Vec::new();

    for entry in entries {
        let key = entry.group_key();
        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push((key, Bucket::default()));
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot].1;
        bucket.performance_sum += entry.performance();
        bucket.profit_sum += entry.profit();
        bucket.count += 1;
    }

    buckets
        .into_iter()
        .map(|(key, bucket)| AggregatePoint {
            group_key: key.to_string(),
            avg_performance: bucket.performance_sum / bucket.count as f64,
            total_profit: bucket.profit_sum,
            count: bucket.count,
        })
        .collect()
}

/// Whole-list sums shown in the TOTAL row and the headline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub initial_value: f64,
    pub final_value: f64,
    pub profit: f64,
    pub commission: f64,
}

pub fn totals(entries: &[Entry]) -> Totals {
    entries.iter().fold(Totals::default(), |mut acc, entry| {
        acc.initial_value += entry.initial_value();
        acc.final_value += entry.final_value();
        acc.profit += entry.profit();
        acc.commission += entry.commission();
        acc
    })
}
