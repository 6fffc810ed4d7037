//! `paysheet`: generate per-employee piece-rate wage ledgers from a source
//! workbook.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use paysheet_report::{
    build_report, output_filename, LedgerStyle, ReportConfig, TargetMonth,
};

#[derive(Parser)]
#[command(
    name = "paysheet",
    about = "Generate one formatted wage ledger sheet per employee for a target month."
)]
struct Args {
    /// Source workbook (.xlsx/.xlsm) holding the employee roster, production
    /// records, price list and subsistence table.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Target month, YYYY-MM (dots accepted: 2025.10).
    #[arg(long, value_name = "YYYY-MM")]
    month: String,

    /// Directory the report is written into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Label used in the output filename: <month>_<label>.xlsx.
    #[arg(long, default_value = "payroll")]
    label: String,

    /// Sheet name of the employee roster.
    #[arg(long, default_value = "Employees")]
    employees_sheet: String,

    /// Sheet name of the production records.
    #[arg(long, default_value = "Production")]
    production_sheet: String,

    /// Sheet name of the price list.
    #[arg(long, default_value = "PriceList")]
    prices_sheet: String,

    /// Sheet name of the subsistence table.
    #[arg(long, default_value = "Subsistence")]
    subsistence_sheet: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let month: TargetMonth = args.month.parse()?;
    let config = ReportConfig {
        employees_sheet: args.employees_sheet,
        production_sheet: args.production_sheet,
        prices_sheet: args.prices_sheet,
        subsistence_sheet: args.subsistence_sheet,
        label: args.label,
    };

    let source = paysheet_xlsx::read_from_path(&args.input)
        .with_context(|| format!("read source workbook {}", args.input.display()))?;

    let outcome = build_report(&source, month, &config, &LedgerStyle::default())
        .context("generate report")?;

    for sheet in &outcome.sheets {
        let mut line = format!("{}: {} records", sheet.employee, sheet.record_count);
        if sheet.sheet_name != sheet.employee {
            line.push_str(&format!(" (tab '{}')", sheet.sheet_name));
        }
        if sheet.unresolved_dates > 0 {
            line.push_str(&format!(", {} unresolvable dates", sheet.unresolved_dates));
        }
        println!("{line}");
    }

    let out_path = args.out_dir.join(output_filename(month, &config.label));
    paysheet_xlsx::write_to_file(&out_path, &outcome.workbook)
        .with_context(|| format!("write report {}", out_path.display()))?;

    info!("wrote {} sheets", outcome.sheet_count());
    println!(
        "{} sheets written to {}",
        outcome.sheet_count(),
        out_path.display()
    );
    Ok(())
}
