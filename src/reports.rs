use crate::aggregate::{
    active_months, mean_present, rank_by_total, top_n, totals, Dimension, GroupTotal,
};
use crate::calendar::{order_month_names, Month};
use crate::config::ReportOptions;
use crate::types::{
    AgencyRankingRow, KindTotalsRow, MonthlySalesRow, PodiumRow, SalesTable, SummaryStats,
    SupplierSummaryRow, YearMonthRow,
};
use crate::util::format_number;
use chrono::Local;
use std::collections::{HashMap, HashSet};
use tracing::warn;

fn into_label(group: GroupTotal) -> String {
    group.labels.into_iter().next().unwrap_or_default()
}

/// Consolidated sales per month, in calendar order, with the number of
/// agencies that actually sold something that month.
pub fn monthly_sales(table: &SalesTable) -> Vec<MonthlySalesRow> {
    let groups = totals(&table.records, &[Dimension::Month]);
    let by_month: HashMap<&str, &GroupTotal> =
        groups.iter().map(|g| (g.label(), g)).collect();

    let mut active: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in &table.records {
        if record.amount.is_some() {
            active
                .entry(record.month.name())
                .or_default()
                .insert(record.agency.as_str());
        }
    }

    let names: Vec<String> = groups.iter().map(|g| g.label().to_string()).collect();
    order_month_names(&names)
        .into_iter()
        .filter_map(|name| {
            by_month.get(name.as_str()).map(|group| MonthlySalesRow {
                total: format_number(group.total, 2),
                active_agencies: active.get(name.as_str()).map(HashSet::len).unwrap_or(0),
                month: name,
            })
        })
        .collect()
}

/// Agencies ranked by total sales, with each agency's share of the
/// overall total and its count of active months.
pub fn agency_ranking(table: &SalesTable) -> Vec<AgencyRankingRow> {
    let ranked = rank_by_total(totals(&table.records, &[Dimension::Agency]));
    let grand_total: f64 = ranked.iter().map(|g| g.total).sum();

    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, group)| {
            let share = if grand_total.abs() < f64::EPSILON {
                0.0
            } else {
                group.total / grand_total * 100.0
            };
            let months = active_months(
                table
                    .records
                    .iter()
                    .filter(|r| r.agency == group.label()),
            );
            AgencyRankingRow {
                rank: idx + 1,
                total: format_number(group.total, 2),
                share_pct: format_number(share, 2),
                active_months: months,
                agency: into_label(group),
            }
        })
        .collect()
}

/// Per-supplier comparison metrics: sales, revenue, distinct service
/// types, active months, and the mean sale over present values.
pub fn supplier_summary(table: &SalesTable) -> Vec<SupplierSummaryRow> {
    let ranked = rank_by_total(totals(&table.records, &[Dimension::Supplier]));
    ranked
        .into_iter()
        .map(|group| {
            let records: Vec<_> = table
                .records
                .iter()
                .filter(|r| r.supplier == group.label())
                .collect();
            let total_revenue: f64 = records.iter().filter_map(|r| r.revenue).sum();
            let kinds: HashSet<&str> = records.iter().filter_map(|r| r.kind.as_deref()).collect();
            let months = active_months(records.iter().copied());
            let avg_sale = mean_present(records.iter().map(|r| r.amount)).unwrap_or(0.0);
            SupplierSummaryRow {
                total_sales: format_number(group.total, 2),
                total_revenue: format_number(total_revenue, 2),
                service_kinds: kinds.len(),
                active_months: months,
                avg_sale: format_number(avg_sale, 2),
                supplier: into_label(group),
            }
        })
        .collect()
}

/// Totals per service type, sales-descending. Empty when the workbook
/// carries no type column.
pub fn kind_totals(table: &SalesTable) -> Vec<KindTotalsRow> {
    let ranked = rank_by_total(totals(&table.records, &[Dimension::Kind]));
    ranked
        .into_iter()
        .map(|group| {
            let revenue: f64 = table
                .records
                .iter()
                .filter(|r| r.kind.as_deref() == Some(group.label()))
                .filter_map(|r| r.revenue)
                .sum();
            KindTotalsRow {
                total_sales: format_number(group.total, 2),
                total_revenue: format_number(revenue, 2),
                kind: into_label(group),
            }
        })
        .collect()
}

/// Month-by-month totals split per year, for workbooks that span more
/// than one. Rows come out year-ascending, then calendar order.
pub fn yearly_history(table: &SalesTable) -> Vec<YearMonthRow> {
    let mut groups = totals(&table.records, &[Dimension::Year, Dimension::Month]);
    groups.sort_by_key(|g| {
        let month_key = g
            .labels
            .get(1)
            .and_then(|name| Month::from_name(name))
            .map(Month::ordinal)
            .unwrap_or(Month::ALL.len() + 1);
        (g.labels.first().cloned().unwrap_or_default(), month_key)
    });
    groups
        .into_iter()
        .map(|group| YearMonthRow {
            year: group.labels.first().cloned().unwrap_or_default(),
            month: group.labels.get(1).cloned().unwrap_or_default(),
            total: format_number(group.total, 2),
        })
        .collect()
}

/// The top-five ranking view. Requires `podium_min` ranked agencies;
/// fewer yields no podium and a warning, never an error.
pub fn agency_podium(table: &SalesTable, opts: &ReportOptions) -> Option<Vec<PodiumRow>> {
    let ranked = rank_by_total(totals(&table.records, &[Dimension::Agency]));
    if ranked.len() < opts.podium_min {
        warn!(
            agencies = ranked.len(),
            needed = opts.podium_min,
            "not enough agencies for a podium"
        );
        return None;
    }
    Some(
        top_n(&ranked, opts.podium_size)
            .iter()
            .enumerate()
            .map(|(idx, group)| PodiumRow {
                position: idx + 1,
                agency: group.label().to_string(),
                total: format_number(group.total, 2),
            })
            .collect(),
    )
}

pub fn summary(table: &SalesTable) -> SummaryStats {
    let agencies = table.agencies();
    let total_sales: f64 = table.records.iter().filter_map(|r| r.amount).sum();
    let total_revenue: f64 = table.records.iter().filter_map(|r| r.revenue).sum();
    let avg_per_agency = if agencies.is_empty() {
        0.0
    } else {
        total_sales / agencies.len() as f64
    };
    SummaryStats {
        total_sales,
        total_revenue,
        agencies: agencies.len(),
        suppliers: table.suppliers().len(),
        avg_per_agency,
        generated_at: Local::now().format("%d/%m/%Y %H:%M").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SalesRecord;

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

    fn sample_table() -> SalesTable {
        SalesTable::new(vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(100.0)),
            record("Alpha", "Affinity", Month::Janeiro, Some(50.0)),
            record("Beta", "Sakura", Month::Marco, Some(300.0)),
            record("Beta", "Sakura", Month::Janeiro, None),
            record("Gama", "Affinity", Month::Dezembro, Some(25.0)),
        ])
    }

    #[test]
    fn monthly_rows_come_out_in_calendar_order() {
        let rows = monthly_sales(&sample_table());
        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["Janeiro", "Março", "Dezembro"]);
        // Alpha sold through two suppliers in Janeiro; Beta's missing cell
        // does not make it active.
        assert_eq!(rows[0].total, "150.00");
        assert_eq!(rows[0].active_agencies, 1);
    }

    #[test]
    fn ranking_totals_sum_across_suppliers() {
        let rows = agency_ranking(&sample_table());
        assert_eq!(rows[0].agency, "Beta");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].total, "300.00");
        assert_eq!(rows[1].agency, "Alpha");
        assert_eq!(rows[1].total, "150.00");
        // 300 of 475 overall.
        assert_eq!(rows[0].share_pct, "63.16");
        // Beta has a value only in Março; the missing Janeiro cell does
        // not count as activity.
        assert_eq!(rows[0].active_months, 1);
    }

    #[test]
    fn supplier_average_excludes_missing_from_the_denominator() {
        let table = SalesTable::new(vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(200.0)),
            record("Beta", "Sakura", Month::Janeiro, None),
        ]);
        let rows = supplier_summary(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avg_sale, "200.00");
        assert_eq!(rows[0].total_sales, "200.00");
    }

    #[test]
    fn supplier_metrics_count_kinds_and_revenue() {
        let mut a = record("Alpha", "Sakura", Month::Janeiro, Some(10.0));
        a.revenue = Some(1.0);
        a.kind = Some("Direto".to_string());
        let mut b = record("Alpha", "Sakura", Month::Fevereiro, Some(20.0));
        b.revenue = Some(2.0);
        b.kind = Some("Online".to_string());
        let rows = supplier_summary(&SalesTable::new(vec![a, b]));
        assert_eq!(rows[0].total_revenue, "3.00");
        assert_eq!(rows[0].service_kinds, 2);
        assert_eq!(rows[0].active_months, 2);
    }

    #[test]
    fn kind_totals_rank_by_sales() {
        let mut direto = record("Alpha", "Sakura", Month::Janeiro, Some(10.0));
        direto.kind = Some("Direto".to_string());
        direto.revenue = Some(1.0);
        let mut online = record("Alpha", "Sakura", Month::Janeiro, Some(40.0));
        online.kind = Some("Online".to_string());
        online.revenue = Some(4.0);
        let untyped = record("Alpha", "Sakura", Month::Janeiro, Some(99.0));

        let rows = kind_totals(&SalesTable::new(vec![direto, online, untyped]));
        // Untyped records form no phantom group.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, "Online");
        assert_eq!(rows[0].total_sales, "40.00");
        assert_eq!(rows[0].total_revenue, "4.00");
        assert_eq!(rows[1].kind, "Direto");
    }

    #[test]
    fn yearly_history_orders_by_year_then_calendar() {
        let mut rows = vec![
            record("Alpha", "Sakura", Month::Marco, Some(3.0)),
            record("Alpha", "Sakura", Month::Janeiro, Some(1.0)),
            record("Alpha", "Sakura", Month::Dezembro, Some(12.0)),
        ];
        rows[0].year = Some(2024);
        rows[1].year = Some(2024);
        rows[2].year = Some(2023);

        let history = yearly_history(&SalesTable::new(rows));
        let keys: Vec<(&str, &str)> = history
            .iter()
            .map(|r| (r.year.as_str(), r.month.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("2023", "Dezembro"), ("2024", "Janeiro"), ("2024", "Março")]
        );
    }

    #[test]
    fn podium_needs_three_agencies() {
        let opts = ReportOptions::default();
        let table = sample_table();
        let podium = agency_podium(&table, &opts).unwrap();
        assert_eq!(podium.len(), 3);
        assert_eq!(podium[0].position, 1);
        assert_eq!(podium[0].agency, "Beta");

        let degenerate = SalesTable::new(vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(1.0)),
            record("Beta", "Sakura", Month::Janeiro, Some(2.0)),
        ]);
        assert!(agency_podium(&degenerate, &opts).is_none());
    }

    #[test]
    fn summary_counts_entities_and_means() {
        let stats = summary(&sample_table());
        assert_eq!(stats.agencies, 3);
        assert_eq!(stats.suppliers, 2);
        assert_eq!(stats.total_sales, 475.0);
        assert!((stats.avg_per_agency - 475.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_table_renders_empty_reports() {
        let table = SalesTable::default();
        assert!(monthly_sales(&table).is_empty());
        assert!(agency_ranking(&table).is_empty());
        assert!(supplier_summary(&table).is_empty());
        assert!(agency_podium(&table, &ReportOptions::default()).is_none());
        let stats = summary(&table);
        assert_eq!(stats.total_sales, 0.0);
        assert_eq!(stats.avg_per_agency, 0.0);
    }
}
