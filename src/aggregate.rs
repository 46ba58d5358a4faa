// Grouped totals, ranking, and missing-aware statistics over the
// normalized table.
//
// Missing amounts contribute zero to sums at aggregation time only;
// means and activity counts exclude them from the denominator.
use crate::types::SalesRecord;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// A grouping key component. Records lacking the keyed attribute (no
/// year, no type) fall out of that grouping rather than forming a
/// phantom group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Agency,
    Supplier,
    Month,
    Year,
    Kind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    /// One label per requested dimension, in dimension order.
    pub labels: Vec<String>,
    /// Sum of amounts, missing-as-zero.
    pub total: f64,
}

impl GroupTotal {
    pub fn label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }
}

fn key_labels(record: &SalesRecord, dims: &[Dimension]) -> Option<Vec<String>> {
    dims.iter()
        .map(|d| match d {
            Dimension::Agency => Some(record.agency.clone()),
            Dimension::Supplier => Some(record.supplier.clone()),
            Dimension::Month => Some(record.month.name().to_string()),
            Dimension::Year => record.year.map(|y| y.to_string()),
            Dimension::Kind => record.kind.clone(),
        })
        .collect()
}

/// Summed totals per group, returned in first-seen order.
pub fn totals(records: &[SalesRecord], dims: &[Dimension]) -> Vec<GroupTotal> {
    struct Acc {
        first_idx: usize,
        total: f64,
    }
    let mut map: HashMap<Vec<String>, Acc> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let Some(labels) = key_labels(record, dims) else {
            continue;
        };
        let acc = map.entry(labels).or_insert(Acc {
            first_idx: idx,
            total: 0.0,
        });
        // A missing amount contributes zero to the sum, here and only here.
        if let Some(v) = record.amount {
            acc.total += v;
        }
    }
    let mut out: Vec<(usize, GroupTotal)> = map
        .into_iter()
        .map(|(labels, acc)| {
            (
                acc.first_idx,
                GroupTotal {
                    labels,
                    total: acc.total,
                },
            )
        })
        .collect();
    // Hash-map iteration order is arbitrary; first-seen input order is
    // the deterministic baseline every ranking tie-break relies on.
    out.sort_by_key(|(first_idx, _)| *first_idx);
    out.into_iter().map(|(_, group)| group).collect()
}

/// Sort groups by total descending. The sort is stable, so ties keep
/// the first-seen order `totals` established.
pub fn rank_by_total(mut groups: Vec<GroupTotal>) -> Vec<GroupTotal> {
    groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    groups
}

/// Leading slice of an already-ranked list.
pub fn top_n(groups: &[GroupTotal], n: usize) -> &[GroupTotal] {
    &groups[..groups.len().min(n)]
}

/// Arithmetic mean over present values only; `None` when nothing is
/// present. The average of [200, missing] is 200, not 100.
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.into_iter().flatten() {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Distinct months in which at least one record carries a value.
pub fn active_months<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut months = BTreeSet::new();
    for record in records {
        if record.amount.is_some() {
            months.insert(record.month);
        }
    }
    months.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Month;

    fn record(agency: &str, supplier: &str, month: Month, amount: Option<f64>) -> SalesRecord {
        SalesRecord {
            agency: agency.to_string(),
            supplier: supplier.to_string(),
            month,
            amount,
            revenue: None,
            year: None,
            kind: None,
        }
    }

    #[test]
    fn duplicate_keys_sum_across_sheets() {
        // One row for Alpha/Janeiro on each of two supplier sheets.
        let records = vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(100.0)),
            record("Alpha", "Affinity", Month::Janeiro, Some(50.0)),
        ];
        let groups = totals(&records, &[Dimension::Agency, Dimension::Month]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].labels, vec!["Alpha", "Janeiro"]);
        assert_eq!(groups[0].total, 150.0);
    }

    #[test]
    fn grouping_then_summing_matches_filtered_raw_sums() {
        let records = vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(10.0)),
            record("Beta", "Sakura", Month::Janeiro, Some(20.0)),
            record("Alpha", "Affinity", Month::Marco, Some(30.0)),
            record("Beta", "Affinity", Month::Marco, None),
        ];
        let groups = totals(&records, &[Dimension::Agency]);
        for group in groups {
            let raw: f64 = records
                .iter()
                .filter(|r| r.agency == group.label())
                .filter_map(|r| r.amount)
                .sum();
            assert_eq!(group.total, raw);
        }
    }

    #[test]
    fn missing_is_zero_only_for_sums() {
        let records = vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(200.0)),
            record("Alpha", "Sakura", Month::Fevereiro, None),
        ];
        let groups = totals(&records, &[Dimension::Agency]);
        assert_eq!(groups[0].total, 200.0);

        let mean = mean_present(records.iter().map(|r| r.amount));
        assert_eq!(mean, Some(200.0));
        assert_eq!(mean_present(vec![None::<f64>, None]), None);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let records = vec![
            record("First", "Sakura", Month::Janeiro, Some(100.0)),
            record("Second", "Sakura", Month::Janeiro, Some(100.0)),
            record("Third", "Sakura", Month::Janeiro, Some(250.0)),
        ];
        let ranked = rank_by_total(totals(&records, &[Dimension::Agency]));
        let names: Vec<&str> = ranked.iter().map(GroupTotal::label).collect();
        assert_eq!(names, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn top_n_slices_after_the_sort() {
        let records = vec![
            record("A", "S", Month::Janeiro, Some(1.0)),
            record("B", "S", Month::Janeiro, Some(3.0)),
            record("C", "S", Month::Janeiro, Some(2.0)),
        ];
        let ranked = rank_by_total(totals(&records, &[Dimension::Agency]));
        let top = top_n(&ranked, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].label(), "B");
        assert_eq!(top[1].label(), "C");
        assert_eq!(top_n(&ranked, 10).len(), 3);
    }

    #[test]
    fn records_without_the_keyed_attribute_fall_out() {
        let mut with_year = record("Alpha", "Sakura", Month::Janeiro, Some(10.0));
        with_year.year = Some(2023);
        let without_year = record("Beta", "Sakura", Month::Janeiro, Some(20.0));
        let groups = totals(&[with_year, without_year], &[Dimension::Year]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].labels, vec!["2023"]);
    }

    #[test]
    fn active_months_ignore_missing_values() {
        let records = vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(10.0)),
            record("Alpha", "Sakura", Month::Fevereiro, None),
            record("Alpha", "Sakura", Month::Janeiro, Some(5.0)),
        ];
        assert_eq!(active_months(&records), 1);
    }
}
