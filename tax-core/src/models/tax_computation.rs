use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A completed questionnaire, handed by value to the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationInput {
    pub annual_income: Decimal,
    pub dependents: u32,
    /// INSS contributions paid over the year.
    pub inss_paid: Decimal,
    /// School fees, health expenses and any other deductible amount.
    pub other_deductions: Decimal,
}

/// Derived annual and monthly figures.
///
/// Taxable bases may be negative when deductions exceed income; the taxes
/// themselves never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub annual_taxable_base: Decimal,
    pub annual_tax: Decimal,
    pub monthly_taxable_base: Decimal,
    pub monthly_withholding: Decimal,

    /// Rate of the annual bracket that was applied.
    pub annual_marginal_rate: Decimal,
    /// Rate of the monthly bracket that was applied.
    pub monthly_marginal_rate: Decimal,
}
