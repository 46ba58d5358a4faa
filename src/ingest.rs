// Workbook ingestion: one heterogeneously-shaped workbook in, one
// normalized sales table out.
//
// Each sheet is a supplier. Sheets may carry title/blank rows before the
// real header, so the header row is located by content: the first row
// whose leading cell matches the agency label. Column names are folded
// before matching, which makes the accented month spellings ("Março")
// line up with their plain forms.
use crate::calendar::Month;
use crate::config::{IngestOptions, MissingHeaderPolicy};
use crate::error::{ReportError, Result};
use crate::types::{SalesRecord, SalesTable};
use crate::util::{cell_to_number, cell_to_string, fold, is_placeholder};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub sheets: usize,
    pub sheets_loaded: usize,
    pub skipped_sheets: Vec<String>,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// Non-empty value cells that failed numeric coercion (recorded as
    /// missing in the table, never as zero).
    pub missing_cells: usize,
}

/// What a header column contributes to the normalized table.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnRole {
    Agency,
    /// A wide-layout month column; one record per data row.
    Month(Month),
    /// A long-layout month-name column.
    MonthName,
    /// A long-layout sales value column.
    Sales,
    Revenue,
    Year,
    Kind,
    /// Anything else, including derived "Total" columns.
    Dropped,
}

#[derive(Debug, Default)]
struct SheetBatch {
    records: Vec<SalesRecord>,
    rows: usize,
    dropped_rows: usize,
    missing_cells: usize,
}

/// Load a workbook and normalize every sheet into one table.
///
/// Fails fast on an unreadable workbook; per-sheet header failures follow
/// `opts.missing_header`.
pub fn load_workbook(path: &Path, opts: &IngestOptions) -> Result<(SalesTable, IngestReport)> {
    info!(path = %path.display(), "loading workbook");
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ReportError::EmptyWorkbook(path.to_path_buf()));
    }

    let mut records = Vec::new();
    let mut report = IngestReport {
        sheets: sheet_names.len(),
        ..Default::default()
    };
    for name in &sheet_names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| ReportError::SheetRead {
                sheet: name.clone(),
                source: e,
            })?;
        match normalize_sheet(name, &range, opts)? {
            Some(batch) => {
                report.sheets_loaded += 1;
                report.rows_kept += batch.rows;
                report.rows_dropped += batch.dropped_rows;
                report.missing_cells += batch.missing_cells;
                records.extend(batch.records);
            }
            None => {
                report.skipped_sheets.push(name.clone());
            }
        }
    }
    info!(
        sheets = report.sheets_loaded,
        rows = report.rows_kept,
        records = records.len(),
        "workbook normalized"
    );
    Ok((SalesTable::new(records), report))
}

/// Find the first row whose leading cell matches the agency label.
fn find_header_row(range: &Range<Data>, agency_label: &str) -> Option<usize> {
    range.rows().position(|row| {
        let first = row.first().unwrap_or(&Data::Empty);
        fold(&cell_to_string(first)).contains(agency_label)
    })
}

fn classify_columns(header: &[Data], opts: &IngestOptions) -> Vec<ColumnRole> {
    header
        .iter()
        .map(|cell| {
            let label = cell_to_string(cell);
            let folded = fold(&label);
            if folded.is_empty() {
                ColumnRole::Dropped
            } else if folded.contains(&opts.agency_label) {
                ColumnRole::Agency
            } else if let Some(month) = Month::from_label(&label) {
                ColumnRole::Month(month)
            } else if folded == opts.month_label {
                ColumnRole::MonthName
            } else if folded == opts.sales_label {
                ColumnRole::Sales
            } else if folded == opts.revenue_label {
                ColumnRole::Revenue
            } else if folded == opts.year_label {
                ColumnRole::Year
            } else if folded == opts.kind_label {
                ColumnRole::Kind
            } else {
                ColumnRole::Dropped
            }
        })
        .collect()
}

/// Coerce a value cell, counting non-blank coercion failures.
fn numeric_cell(cell: &Data, missing: &mut usize) -> Option<f64> {
    let value = cell_to_number(cell);
    if value.is_none() && !matches!(cell, Data::Empty) {
        *missing += 1;
    }
    value
}

/// Normalize one sheet. `Ok(None)` means the sheet was skipped under the
/// `skip` missing-header policy.
fn normalize_sheet(
    name: &str,
    range: &Range<Data>,
    opts: &IngestOptions,
) -> Result<Option<SheetBatch>> {
    let supplier = name.trim().to_string();
    if range.get_size().0 == 0 {
        // An empty tab contributes nothing; only a sheet with content but
        // no recognizable header is a data problem.
        debug!(sheet = %supplier, "empty sheet");
        return Ok(Some(SheetBatch::default()));
    }

    let header_idx = match find_header_row(range, &opts.agency_label) {
        Some(idx) => idx,
        None => {
            return match opts.missing_header {
                MissingHeaderPolicy::Fail => Err(ReportError::MissingHeader {
                    sheet: supplier,
                    label: opts.agency_label.clone(),
                }),
                MissingHeaderPolicy::Skip => {
                    warn!(sheet = %supplier, "no header row, sheet skipped");
                    Ok(None)
                }
            };
        }
    };

    let header: Vec<Data> = range
        .rows()
        .nth(header_idx)
        .map(|row| row.to_vec())
        .unwrap_or_default();
    let roles = classify_columns(&header, opts);
    let agency_col = match roles.iter().position(|r| *r == ColumnRole::Agency) {
        Some(idx) => idx,
        // The header row matched on the agency label, so a missing agency
        // column means the match was in a cell the classifier dropped.
        None => {
            return match opts.missing_header {
                MissingHeaderPolicy::Fail => Err(ReportError::MissingHeader {
                    sheet: supplier,
                    label: opts.agency_label.clone(),
                }),
                MissingHeaderPolicy::Skip => {
                    warn!(sheet = %supplier, "no agency column, sheet skipped");
                    Ok(None)
                }
            };
        }
    };

    let month_cols: Vec<(usize, Month)> = roles
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match r {
            ColumnRole::Month(m) => Some((i, *m)),
            _ => None,
        })
        .collect();
    let month_name_col = roles.iter().position(|r| *r == ColumnRole::MonthName);
    let sales_col = roles.iter().position(|r| *r == ColumnRole::Sales);
    let revenue_col = roles.iter().position(|r| *r == ColumnRole::Revenue);
    let year_col = roles.iter().position(|r| *r == ColumnRole::Year);
    let kind_col = roles.iter().position(|r| *r == ColumnRole::Kind);

    let long_layout = month_name_col.zip(sales_col);
    if month_cols.is_empty() && long_layout.is_none() {
        warn!(sheet = %supplier, "no month or sales columns, sheet contributes nothing");
        return Ok(Some(SheetBatch::default()));
    }

    let mut batch = SheetBatch::default();
    for row in range.rows().skip(header_idx + 1) {
        let first = fold(&cell_to_string(row.first().unwrap_or(&Data::Empty)));
        if is_placeholder(&first, &opts.agency_label)
            || opts.placeholder_rows.iter().any(|p| first.starts_with(p.as_str()))
        {
            batch.dropped_rows += 1;
            continue;
        }

        let agency = cell_to_string(row.get(agency_col).unwrap_or(&Data::Empty));
        if is_placeholder(&fold(&agency), &opts.agency_label) {
            batch.dropped_rows += 1;
            continue;
        }

        let revenue = revenue_col.and_then(|i| {
            row.get(i).and_then(|c| numeric_cell(c, &mut batch.missing_cells))
        });
        let year = year_col
            .and_then(|i| row.get(i).and_then(cell_to_number))
            .map(|y| y as i32);
        let kind = kind_col
            .map(|i| cell_to_string(row.get(i).unwrap_or(&Data::Empty)))
            .filter(|s| !s.is_empty());

        if !month_cols.is_empty() {
            // Wide layout: melt each retained month column into a record.
            for (col, month) in &month_cols {
                let amount = row
                    .get(*col)
                    .and_then(|c| numeric_cell(c, &mut batch.missing_cells));
                batch.records.push(SalesRecord {
                    agency: agency.clone(),
                    supplier: supplier.clone(),
                    month: *month,
                    amount,
                    revenue,
                    year,
                    kind: kind.clone(),
                });
            }
            batch.rows += 1;
        } else if let Some((month_col, sales_col)) = long_layout {
            let month_label = cell_to_string(row.get(month_col).unwrap_or(&Data::Empty));
            let Some(month) = Month::from_label(&month_label) else {
                debug!(sheet = %supplier, label = %month_label, "unrecognized month, row dropped");
                batch.dropped_rows += 1;
                continue;
            };
            let amount = row
                .get(sales_col)
                .and_then(|c| numeric_cell(c, &mut batch.missing_cells));
            batch.records.push(SalesRecord {
                agency,
                supplier: supplier.clone(),
                month,
                amount,
                revenue,
                year,
                kind,
            });
            batch.rows += 1;
        }
    }
    debug!(
        sheet = %supplier,
        rows = batch.rows,
        dropped = batch.dropped_rows,
        "sheet normalized"
    );
    Ok(Some(batch))
}
