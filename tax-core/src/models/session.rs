use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque chat-platform user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The question a session is waiting on.
///
/// There is no idle variant: a user without an open questionnaire simply has
/// no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    AwaitingDependents,
    AwaitingInss,
    AwaitingOtherDeductions,
}

impl Step {
    /// The step that follows this one, or `None` once the last answer is in.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AwaitingDependents => Some(Self::AwaitingInss),
            Self::AwaitingInss => Some(Self::AwaitingOtherDeductions),
            Self::AwaitingOtherDeductions => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingDependents => "awaiting_dependents",
            Self::AwaitingInss => "awaiting_inss",
            Self::AwaitingOtherDeductions => "awaiting_other_deductions",
        }
    }
}

/// In-progress questionnaire for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub step: Step,
    pub annual_income: Decimal,
    pub dependents: u32,
    pub inss_paid: Decimal,
    pub other_deductions: Decimal,
    pub last_touched: DateTime<Utc>,
}

impl Session {
    /// Opens a questionnaire at its first question.
    pub fn start(
        user_id: UserId,
        annual_income: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            step: Step::AwaitingDependents,
            annual_income,
            dependents: 0,
            inss_paid: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
            last_touched: now,
        }
    }
}
