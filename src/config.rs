// Ingest and report options.
//
// Column labels, placeholder sentinels, and the missing-header policy are
// configuration, not inference: defaults encode the conventions of the
// sales workbooks this tool was built for, and a TOML file can override
// them for workbooks that spell things differently.
use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// What to do with a sheet whose header row cannot be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingHeaderPolicy {
    /// Fail the whole load, naming the sheet. The default: a sheet that
    /// silently contributes nothing hides real data problems.
    Fail,
    /// Skip the sheet, record it in the ingest report, and keep going.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestOptions {
    /// Folded label that marks the agency column and the header row.
    pub agency_label: String,
    /// Folded label of a month-name column in long-layout sheets.
    pub month_label: String,
    /// Folded label of the sales value column in long-layout sheets.
    pub sales_label: String,
    /// Folded label of an optional revenue column.
    pub revenue_label: String,
    /// Folded label of an optional year column.
    pub year_label: String,
    /// Folded label of an optional service-type column.
    pub kind_label: String,
    /// Folded prefixes that mark a non-data row ("total", subtotal bands).
    pub placeholder_rows: Vec<String>,
    pub missing_header: MissingHeaderPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            agency_label: "agencia".to_string(),
            month_label: "mes".to_string(),
            sales_label: "vendas".to_string(),
            revenue_label: "receita".to_string(),
            year_label: "ano".to_string(),
            kind_label: "tipo".to_string(),
            placeholder_rows: vec!["total".to_string()],
            missing_header: MissingHeaderPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportOptions {
    /// Size of the leading ranking slice (the podium).
    pub podium_size: usize,
    /// Minimum ranked agencies required before a podium is rendered.
    pub podium_min: usize,
    /// Size of the top-N slice used by the ranking preview.
    pub top_n: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            podium_size: 5,
            podium_min: 3,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub ingest: IngestOptions,
    pub report: ReportOptions,
}

impl Options {
    /// Load options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Options> {
        let text = fs::read_to_string(path)?;
        let options = toml::from_str(&text)?;
        Ok(options)
    }

    /// Load from a file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Options> {
        match path {
            Some(p) => Options::from_file(p),
            None => Ok(Options::default()),
        }
    }
}
