//! Progressive income tax: annual liability and monthly withholding.
//!
//! # Calculation
//!
//! | Figure                 | Formula |
//! |------------------------|---------|
//! | Annual taxable base    | income − INSS − other deductions − dependents × annual allowance |
//! | Annual tax             | annual bracket applied to the base, minimum 0 |
//! | Monthly taxable base   | (income − INSS − other deductions) / 12 − dependents × monthly allowance |
//! | Monthly withholding    | monthly bracket applied to the base, minimum 0 |
//!
//! Bases and taxes are rounded half-up to cents.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxComputationInput;
//! use tax_core::calculations::IncomeTaxCalculator;
//!
//! let input = TaxComputationInput {
//!     annual_income: dec!(85000),
//!     dependents: 2,
//!     inss_paid: dec!(6000),
//!     other_deductions: dec!(0),
//! };
//!
//! let result = IncomeTaxCalculator::default().calculate(&input);
//!
//! assert_eq!(result.annual_taxable_base, dec!(74449.84));
//! assert_eq!(result.annual_tax, dec!(10041.39));
//! assert_eq!(result.monthly_taxable_base, dec!(6204.15));
//! assert_eq!(result.monthly_withholding, dec!(810.14));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{BracketTable, TaxComputationInput, TaxComputationResult};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Fixed allowance subtracted from the taxable base for each dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentDeductions {
    pub annual: Decimal,
    pub monthly: Decimal,
}

impl Default for DependentDeductions {
    fn default() -> Self {
        Self {
            annual: Decimal::new(227508, 2),
            monthly: Decimal::new(18959, 2),
        }
    }
}

/// Applies the annual and monthly schedules to a completed questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeTaxCalculator {
    annual: BracketTable,
    monthly: BracketTable,
    dependent_deductions: DependentDeductions,
}

impl Default for IncomeTaxCalculator {
    fn default() -> Self {
        Self::new(
            BracketTable::annual(),
            BracketTable::monthly(),
            DependentDeductions::default(),
        )
    }
}

impl IncomeTaxCalculator {
    pub fn new(
        annual: BracketTable,
        monthly: BracketTable,
        dependent_deductions: DependentDeductions,
    ) -> Self {
        Self {
            annual,
            monthly,
            dependent_deductions,
        }
    }

    /// Computes annual tax and monthly withholding.
    ///
    /// Inputs are expected to be non-negative; the questionnaire only ever
    /// produces such values. The result is total: arithmetic saturates at the
    /// `Decimal` range instead of overflowing.
    pub fn calculate(
        &self,
        input: &TaxComputationInput,
    ) -> TaxComputationResult {
        let annual_taxable_base = self.annual_taxable_base(input);
        let (annual_tax, annual_marginal_rate) = Self::tax_for(&self.annual, annual_taxable_base);

        let monthly_taxable_base = self.monthly_taxable_base(input);
        let (monthly_withholding, monthly_marginal_rate) =
            Self::tax_for(&self.monthly, monthly_taxable_base);

        debug!(
            %annual_taxable_base,
            %annual_tax,
            %monthly_taxable_base,
            %monthly_withholding,
            "income tax calculated"
        );

        TaxComputationResult {
            annual_taxable_base,
            annual_tax,
            monthly_taxable_base,
            monthly_withholding,
            annual_marginal_rate,
            monthly_marginal_rate,
        }
    }

    /// Total dependent allowance for the year.
    pub fn annual_dependent_deduction(
        &self,
        dependents: u32,
    ) -> Decimal {
        Decimal::from(dependents).saturating_mul(self.dependent_deductions.annual)
    }

    /// Total dependent allowance for one month.
    pub fn monthly_dependent_deduction(
        &self,
        dependents: u32,
    ) -> Decimal {
        Decimal::from(dependents).saturating_mul(self.dependent_deductions.monthly)
    }

    fn annual_taxable_base(
        &self,
        input: &TaxComputationInput,
    ) -> Decimal {
        round_half_up(
            input
                .annual_income
                .saturating_sub(input.inss_paid)
                .saturating_sub(input.other_deductions)
                .saturating_sub(self.annual_dependent_deduction(input.dependents)),
        )
    }

    fn monthly_taxable_base(
        &self,
        input: &TaxComputationInput,
    ) -> Decimal {
        let monthly_income = input.annual_income / MONTHS_PER_YEAR;
        let monthly_inss = input.inss_paid / MONTHS_PER_YEAR;
        let monthly_other = input.other_deductions / MONTHS_PER_YEAR;

        round_half_up(
            monthly_income
                .saturating_sub(monthly_inss)
                .saturating_sub(monthly_other)
                .saturating_sub(self.monthly_dependent_deduction(input.dependents)),
        )
    }

    /// Tax owed on `base` and the rate of the bracket used.
    fn tax_for(
        table: &BracketTable,
        base: Decimal,
    ) -> (Decimal, Decimal) {
        let bracket = table.bracket_for(base);
        (round_half_up(non_negative(bracket.apply(base))), bracket.rate)
    }
}
