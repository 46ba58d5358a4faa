// Entry point and high-level CLI flow.
//
// - Option [1] loads the workbook and normalizes it, printing diagnostics.
// - Option [2] generates the report suite, the flat table export, and a
//   JSON summary.
// - Option [3] drops the cached table and re-reads the file.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod aggregate;
mod cache;
mod calendar;
mod config;
mod error;
mod ingest;
mod output;
mod reports;
mod types;
mod util;

use config::Options;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_WORKBOOK: &str = "relatorio_vendas_agencias.xlsx";

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// The prompt is reused for both the main menu and simple numeric inputs.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the workbook through the table cache and
/// print a short textual summary of what happened.
fn handle_load(path: &Path, options: &Options) {
    match cache::load(path, &options.ingest) {
        Ok(entry) => {
            let (table, report) = (&entry.0, &entry.1);
            println!(
                "Processing workbook... ({} of {} sheets loaded, {} rows kept, {} records)",
                report.sheets_loaded,
                report.sheets,
                util::format_int(report.rows_kept as i64),
                util::format_int(table.len() as i64)
            );
            if !report.skipped_sheets.is_empty() {
                println!(
                    "Note: sheets skipped (no header row): {}",
                    report.skipped_sheets.join(", ")
                );
            }
            println!(
                "Note: {} rows excluded, {} cells kept as missing.",
                util::format_int(report.rows_dropped as i64),
                util::format_int(report.missing_cells as i64)
            );
            let months = table.months();
            if let (Some(first), Some(last)) = (months.first(), months.last()) {
                println!("Months covered: {} through {}.", first, last);
            }
            println!("");
        }
        Err(e) => {
            eprintln!("Failed to load workbook: {}\n", e);
        }
    }
}

/// Handle option [2]: generate all reports and the JSON summary.
///
/// This function is intentionally side-effectful:
/// - writes one CSV file per report plus the flat table export,
/// - writes a JSON summary,
/// - and prints Markdown previews of each report to the console.
fn handle_generate_reports(path: &Path, options: &Options) {
    let entry = match cache::load(path, &options.ingest) {
        Ok(entry) => entry,
        Err(e) => {
            eprintln!("Failed to load workbook: {}\n", e);
            return;
        }
    };
    let table = &entry.0;
    if table.is_empty() {
        println!("Warning: the workbook produced no records; nothing to report.\n");
        return;
    }

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let monthly = reports::monthly_sales(table);
    let file1 = "monthly_sales.csv";
    if let Err(e) = output::write_csv(file1, &monthly) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Consolidated Monthly Sales\n");
    output::preview_table_rows(&monthly, 3);
    println!("(Full table exported to {})\n", file1);

    let ranking = reports::agency_ranking(table);
    let file2 = "agency_ranking.csv";
    if let Err(e) = output::write_csv(file2, &ranking) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Agency Sales Ranking");
    println!("(Top {} shown)\n", options.report.top_n);
    output::preview_table_rows(&ranking, options.report.top_n);
    println!("(Full table exported to {})\n", file2);

    let suppliers = reports::supplier_summary(table);
    let file3 = "supplier_summary.csv";
    if let Err(e) = output::write_csv(file3, &suppliers) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Supplier Comparison\n");
    output::preview_table_rows(&suppliers, 3);
    println!("(Full table exported to {})\n", file3);

    // Type and year breakdowns only exist for workbooks that carry
    // those columns.
    let kinds = reports::kind_totals(table);
    if !kinds.is_empty() {
        let file = "sales_by_type.csv";
        if let Err(e) = output::write_csv(file, &kinds) {
            eprintln!("Write error: {}", e);
        }
        println!("Report 4: Totals by Service Type\n");
        output::preview_table_rows(&kinds, 5);
        println!("(Full table exported to {})\n", file);
    }

    let history = reports::yearly_history(table);
    if !history.is_empty() {
        let file = "yearly_history.csv";
        if let Err(e) = output::write_csv(file, &history) {
            eprintln!("Write error: {}", e);
        }
        println!("Report 5: Monthly Sales per Year\n");
        output::preview_table_rows(&history, 3);
        println!("(Full table exported to {})\n", file);
    }

    match reports::agency_podium(table, &options.report) {
        Some(podium) => {
            println!("Podium: Top {} Agencies\n", options.report.podium_size);
            output::preview_table_rows(&podium, options.report.podium_size);
        }
        None => {
            println!(
                "Warning: fewer than {} agencies; podium not rendered.\n",
                options.report.podium_min
            );
        }
    }

    let file4 = "sales_records.csv";
    if let Err(e) = output::write_csv(file4, &table.records) {
        eprintln!("Write error: {}", e);
    }
    println!("(Normalized table exported to {})\n", file4);

    let stats = reports::summary(table);
    if let Err(e) = output::write_json("summary.json", &stats) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_sales\": {}, \"agencies\": {}, \"avg_per_agency\": {}}}",
        util::format_number(stats.total_sales, 2),
        stats.agencies,
        util::format_number(stats.avg_per_agency, 2)
    );
    println!("Report generated at {}\n", stats.generated_at);
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let mut args = std::env::args().skip(1);
    let workbook = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_WORKBOOK.to_string()));
    let config_path = args.next().map(PathBuf::from);
    let options = match Options::load(config_path.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(workbook = %workbook.display(), "startup");

    loop {
        println!("Agency Sales Reports - {}", workbook.display());
        println!("[1] Load the workbook");
        println!("[2] Generate Reports");
        println!("[3] Reload from disk\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&workbook, &options);
            }
            "2" => {
                println!("");
                handle_generate_reports(&workbook, &options);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                cache::evict(&workbook);
                handle_load(&workbook, &options);
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
