use crate::calendar::Month;
use serde::Serialize;
use std::collections::BTreeSet;
use tabled::Tabled;

/// One normalized sales observation: an agency's value for one month,
/// attributed to the supplier whose sheet it came from.
///
/// `amount` is `None` when the source cell was blank or unparseable;
/// the distinction between missing and zero is preserved until a
/// sum-type aggregation decides to treat missing as zero.
#[derive(Debug, Clone, Serialize)]
pub struct SalesRecord {
    #[serde(rename = "Agencia")]
    pub agency: String,
    #[serde(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "Mes")]
    pub month: Month,
    #[serde(rename = "Vendas")]
    pub amount: Option<f64>,
    #[serde(rename = "Receita")]
    pub revenue: Option<f64>,
    #[serde(rename = "Ano")]
    pub year: Option<i32>,
    #[serde(rename = "Tipo")]
    pub kind: Option<String>,
}

/// The single normalized table every report reads from. Records are kept
/// in ingestion order; nothing mutates them after load.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        SalesTable { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct agency names in first-seen order.
    pub fn agencies(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in &self.records {
            if seen.insert(r.agency.as_str()) {
                out.push(r.agency.clone());
            }
        }
        out
    }

    /// Distinct supplier names in first-seen order.
    pub fn suppliers(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in &self.records {
            if seen.insert(r.supplier.as_str()) {
                out.push(r.supplier.clone());
            }
        }
        out
    }

    /// Distinct months present in the data, in calendar order.
    pub fn months(&self) -> Vec<Month> {
        let mut set: BTreeSet<Month> = BTreeSet::new();
        for r in &self.records {
            set.insert(r.month);
        }
        set.into_iter().collect()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlySalesRow {
    #[serde(rename = "Mes")]
    #[tabled(rename = "Mes")]
    pub month: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total: String,
    #[serde(rename = "AgenciasAtivas")]
    #[tabled(rename = "AgenciasAtivas")]
    pub active_agencies: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AgencyRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Agencia")]
    #[tabled(rename = "Agencia")]
    pub agency: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total: String,
    #[serde(rename = "Participacao")]
    #[tabled(rename = "Participacao")]
    pub share_pct: String,
    #[serde(rename = "MesesAtivos")]
    #[tabled(rename = "MesesAtivos")]
    pub active_months: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SupplierSummaryRow {
    #[serde(rename = "Fornecedor")]
    #[tabled(rename = "Fornecedor")]
    pub supplier: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total_sales: String,
    #[serde(rename = "TotalReceita")]
    #[tabled(rename = "TotalReceita")]
    pub total_revenue: String,
    #[serde(rename = "TiposServico")]
    #[tabled(rename = "TiposServico")]
    pub service_kinds: usize,
    #[serde(rename = "MesesAtivos")]
    #[tabled(rename = "MesesAtivos")]
    pub active_months: usize,
    #[serde(rename = "VolumeMedio")]
    #[tabled(rename = "VolumeMedio")]
    pub avg_sale: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KindTotalsRow {
    #[serde(rename = "Tipo")]
    #[tabled(rename = "Tipo")]
    pub kind: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total_sales: String,
    #[serde(rename = "TotalReceita")]
    #[tabled(rename = "TotalReceita")]
    pub total_revenue: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearMonthRow {
    #[serde(rename = "Ano")]
    #[tabled(rename = "Ano")]
    pub year: String,
    #[serde(rename = "Mes")]
    #[tabled(rename = "Mes")]
    pub month: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PodiumRow {
    #[serde(rename = "Posicao")]
    #[tabled(rename = "Posicao")]
    pub position: usize,
    #[serde(rename = "Agencia")]
    #[tabled(rename = "Agencia")]
    pub agency: String,
    #[serde(rename = "TotalVendas")]
    #[tabled(rename = "TotalVendas")]
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_sales: f64,
    pub total_revenue: f64,
    pub agencies: usize,
    pub suppliers: usize,
    pub avg_per_agency: f64,
    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn distinct_listings_dedupe() {
        let table = SalesTable::new(vec![
            record("Alpha", "Sakura", Month::Janeiro, Some(100.0)),
            record("Beta", "Sakura", Month::Janeiro, Some(50.0)),
            record("Alpha", "Affinity", Month::Marco, None),
        ]);
        assert_eq!(table.agencies(), vec!["Alpha", "Beta"]);
        assert_eq!(table.suppliers(), vec!["Sakura", "Affinity"]);
        assert_eq!(table.months(), vec![Month::Janeiro, Month::Marco]);
    }
}
