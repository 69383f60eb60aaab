use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of a progressive schedule.
///
/// A bracket applies to every taxable base up to and including `upper_bound`.
/// The top bracket has no upper bound. Tax owed inside a bracket is
/// `base × rate − deduction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub deduction: Decimal,
}

impl TaxBracket {
    pub const fn new(
        upper_bound: Option<Decimal>,
        rate: Decimal,
        deduction: Decimal,
    ) -> Self {
        Self {
            upper_bound,
            rate,
            deduction,
        }
    }

    /// Raw bracket formula, without any clamping.
    pub fn apply(
        &self,
        base: Decimal,
    ) -> Decimal {
        base.saturating_mul(self.rate).saturating_sub(self.deduction)
    }

    fn contains(
        &self,
        base: Decimal,
    ) -> bool {
        self.upper_bound.is_none_or(|upper| base <= upper)
    }
}

/// Errors raised when a bracket schedule is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table is empty")]
    Empty,

    #[error("bracket {index} has rate {rate}, expected a value in [0, 1]")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} has negative deduction {deduction}")]
    NegativeDeduction { index: usize, deduction: Decimal },

    #[error("bracket {index} upper bound {upper_bound} does not increase")]
    UnorderedBound { index: usize, upper_bound: Decimal },

    #[error("only the last bracket may be open-ended (bracket {0} has no upper bound)")]
    OpenBracketNotLast(usize),

    #[error("the last bracket must be open-ended")]
    MissingTopBracket,
}

/// An ordered, validated progressive schedule.
///
/// Brackets are sorted by strictly increasing upper bound and the last one is
/// open-ended, so every taxable base maps to exactly one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Builds a table after checking ordering and coverage.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] if the table is empty, a rate is outside
    /// `[0, 1]`, a deduction is negative, the bounds are not strictly
    /// increasing, or the open-ended bracket is missing or not last.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, BracketTableError> {
        if brackets.is_empty() {
            return Err(BracketTableError::Empty);
        }

        let last = brackets.len() - 1;
        let mut previous: Option<Decimal> = None;

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(BracketTableError::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }
            if bracket.deduction < Decimal::ZERO {
                return Err(BracketTableError::NegativeDeduction {
                    index,
                    deduction: bracket.deduction,
                });
            }
            match bracket.upper_bound {
                Some(upper_bound) => {
                    if previous.is_some_and(|p| upper_bound <= p) {
                        return Err(BracketTableError::UnorderedBound { index, upper_bound });
                    }
                    previous = Some(upper_bound);
                }
                None if index != last => return Err(BracketTableError::OpenBracketNotLast(index)),
                None => {}
            }
        }

        if brackets[last].upper_bound.is_some() {
            return Err(BracketTableError::MissingTopBracket);
        }

        Ok(Self { brackets })
    }

    /// Annual schedule (base, rate, deduction).
    pub fn annual() -> Self {
        Self {
            brackets: vec![
                TaxBracket::new(Some(Decimal::new(2259900, 2)), Decimal::ZERO, Decimal::ZERO),
                TaxBracket::new(
                    Some(Decimal::new(3391980, 2)),
                    Decimal::new(75, 3),
                    Decimal::new(169493, 2),
                ),
                TaxBracket::new(
                    Some(Decimal::new(4501260, 2)),
                    Decimal::new(15, 2),
                    Decimal::new(423188, 2),
                ),
                TaxBracket::new(
                    Some(Decimal::new(5597616, 2)),
                    Decimal::new(225, 3),
                    Decimal::new(760472, 2),
                ),
                TaxBracket::new(None, Decimal::new(275, 3), Decimal::new(1043232, 2)),
            ],
        }
    }

    /// Monthly withholding schedule (base, rate, deduction).
    pub fn monthly() -> Self {
        Self {
            brackets: vec![
                TaxBracket::new(Some(Decimal::new(225920, 2)), Decimal::ZERO, Decimal::ZERO),
                TaxBracket::new(
                    Some(Decimal::new(282665, 2)),
                    Decimal::new(75, 3),
                    Decimal::new(16944, 2),
                ),
                TaxBracket::new(
                    Some(Decimal::new(375105, 2)),
                    Decimal::new(15, 2),
                    Decimal::new(38144, 2),
                ),
                TaxBracket::new(
                    Some(Decimal::new(466468, 2)),
                    Decimal::new(225, 3),
                    Decimal::new(66277, 2),
                ),
                TaxBracket::new(None, Decimal::new(275, 3), Decimal::new(89600, 2)),
            ],
        }
    }

    /// Returns the first bracket whose upper bound covers `base`.
    pub fn bracket_for(
        &self,
        base: Decimal,
    ) -> &TaxBracket {
        // The open-ended top bracket always matches, so the fallback is
        // only reached for a table that skipped validation.
        self.brackets
            .iter()
            .find(|b| b.contains(base))
            .unwrap_or(&self.brackets[self.brackets.len() - 1])
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }
}
