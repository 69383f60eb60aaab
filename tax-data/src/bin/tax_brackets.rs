use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tax_core::calculations::{DependentDeductions, IncomeTaxCalculator};
use tax_core::{BracketTable, TaxComputationInput};
use tax_data::BracketTableLoader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Compute annual income tax and monthly withholding from the command line.
///
/// Uses the built-in bracket schedules unless `--file` points at a CSV with
/// the columns `schedule,upper_bound,rate,deduction`.
#[derive(Parser, Debug)]
#[command(name = "tax-brackets")]
#[command(version, about, long_about = None)]
struct Args {
    /// Annual gross income
    #[arg(long)]
    income: Decimal,

    /// Number of dependents
    #[arg(long, default_value_t = 0)]
    dependents: u32,

    /// INSS paid over the year
    #[arg(long, default_value_t = Decimal::ZERO)]
    inss: Decimal,

    /// Other deductible expenses for the year
    #[arg(long, default_value_t = Decimal::ZERO)]
    other: Decimal,

    /// CSV file with annual and monthly bracket schedules
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn")))
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    for (name, value) in [("income", args.income), ("inss", args.inss), ("other", args.other)] {
        anyhow::ensure!(value >= Decimal::ZERO, "--{name} must not be negative");
    }

    let (annual, monthly) = match &args.file {
        Some(path) => {
            let tables = BracketTableLoader::load_file(path)
                .with_context(|| format!("Failed to load brackets from: {}", path.display()))?;
            info!(path = %path.display(), "using bracket file");
            (tables.annual, tables.monthly)
        }
        None => (BracketTable::annual(), BracketTable::monthly()),
    };

    let calculator = IncomeTaxCalculator::new(annual, monthly, DependentDeductions::default());
    let result = calculator.calculate(&TaxComputationInput {
        annual_income: args.income,
        dependents: args.dependents,
        inss_paid: args.inss,
        other_deductions: args.other,
    });

    println!("Annual taxable base:  {:>12.2}", result.annual_taxable_base);
    println!("Annual tax:           {:>12.2}", result.annual_tax);
    println!("Monthly taxable base: {:>12.2}", result.monthly_taxable_base);
    println!("Monthly withholding:  {:>12.2}", result.monthly_withholding);

    Ok(())
}
