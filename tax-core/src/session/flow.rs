//! The income tax questionnaire as a per-user state machine.
//!
//! ```text
//!   start_flow ──► AwaitingDependents ──► AwaitingInss ──► AwaitingOtherDeductions ──► (removed)
//! ```
//!
//! Each state is left only by a valid answer for that state, or by
//! `start_flow` replacing the session. A rejected answer changes nothing.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::IncomeTaxCalculator;
use crate::models::{Session, Step, TaxComputationInput, TaxComputationResult, UserId};
use crate::session::parse::{ParseInputError, parse_non_negative_decimal, parse_non_negative_integer};
use crate::session::store::{AfterUpdate, InMemorySessionStore, SessionStore};

/// Which answer failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    AnnualIncome,
    Dependents,
    InssPaid,
    OtherDeductions,
}

impl QuestionField {
    fn for_step(step: Step) -> Self {
        match step {
            Step::AwaitingDependents => Self::Dependents,
            Step::AwaitingInss => Self::InssPaid,
            Step::AwaitingOtherDeductions => Self::OtherDeductions,
        }
    }
}

/// A rejected answer. Always recoverable: the user is asked again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {field:?}: {reason}")]
pub struct ValidationError {
    pub field: QuestionField,
    #[source]
    pub reason: ParseInputError,
}

impl ValidationError {
    /// Corrective reply naming the expected quantity.
    pub fn message(&self) -> &'static str {
        match self.field {
            QuestionField::AnnualIncome => {
                "❌ Informe sua renda anual como um número válido. Exemplo: 85000"
            }
            QuestionField::Dependents => "❌ Digite um número válido de dependentes.",
            QuestionField::InssPaid => "❌ Digite um valor válido de INSS.",
            QuestionField::OtherDeductions => "❌ Digite um valor válido de outras deduções.",
        }
    }
}

/// The next question to put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub step: Step,
    pub text: &'static str,
}

impl Prompt {
    fn for_step(step: Step) -> Self {
        let text = match step {
            Step::AwaitingDependents => {
                "👨‍🏫 Quantos **dependentes** você tem? (Digite apenas o número)"
            }
            Step::AwaitingInss => "💰 Quanto você pagou de **INSS no ano**? (A soma total em R$)",
            Step::AwaitingOtherDeductions => {
                "🧾 Tem **outras deduções**? (mensalidade escolar, saúde, etc). Se não tiver, responda 0."
            }
        };
        Self { step, text }
    }
}

/// A finished questionnaire: the answers as given plus the computed figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutcome {
    pub user_id: UserId,
    pub input: TaxComputationInput,
    pub result: TaxComputationResult,
}

/// What happened to a message routed into the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Answer accepted; ask the next question.
    Prompt(Prompt),
    /// Last answer accepted; the session is gone.
    Terminal(Box<TerminalOutcome>),
    /// Answer rejected; the session is unchanged.
    Invalid(ValidationError),
    /// The user has no open questionnaire. Not an error.
    NotInFlow,
}

/// How one answer moved a session.
enum Transition {
    Rejected(Step, ParseInputError),
    Advanced(Step, Step),
    Completed(Session),
}

/// Owns the open sessions and the calculator they finish with.
pub struct SessionFlow<S = InMemorySessionStore> {
    store: S,
    calculator: IncomeTaxCalculator,
}

impl Default for SessionFlow {
    fn default() -> Self {
        Self::new(InMemorySessionStore::new(), IncomeTaxCalculator::default())
    }
}

impl<S: SessionStore> SessionFlow<S> {
    pub fn new(
        store: S,
        calculator: IncomeTaxCalculator,
    ) -> Self {
        Self { store, calculator }
    }

    pub fn calculator(&self) -> &IncomeTaxCalculator {
        &self.calculator
    }

    /// Opens (or restarts) the questionnaire for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `raw_income` is not a non-negative
    /// number. No session is created or touched in that case.
    pub fn start_flow(
        &self,
        user_id: UserId,
        raw_income: &str,
    ) -> Result<Prompt, ValidationError> {
        let annual_income = parse_non_negative_decimal(raw_income).map_err(|reason| {
            warn!(user = %user_id, %reason, "rejected annual income");
            ValidationError {
                field: QuestionField::AnnualIncome,
                reason,
            }
        })?;

        if self.store.get(&user_id).is_some() {
            debug!(user = %user_id, "restarting open questionnaire");
        }
        info!(user = %user_id, %annual_income, "questionnaire started");

        let session = Session::start(user_id, annual_income, Utc::now());
        let prompt = Prompt::for_step(session.step);
        self.store.put(session);

        Ok(prompt)
    }

    /// Feeds one answer into the user's open questionnaire.
    ///
    /// The answer is checked and applied under the store's per-user entry, so
    /// an idle sweep running at the same time either sees the session before
    /// the answer or after it, never half-way.
    pub fn advance(
        &self,
        user_id: &UserId,
        raw_text: &str,
    ) -> FlowOutcome {
        let transition = self.store.update(user_id, |session| {
            let step = session.step;
            if let Err(reason) = Self::accept_answer(session, raw_text) {
                return (Transition::Rejected(step, reason), AfterUpdate::Keep);
            }
            match step.next() {
                Some(next) => {
                    session.step = next;
                    session.last_touched = Utc::now();
                    (Transition::Advanced(step, next), AfterUpdate::Keep)
                }
                None => (Transition::Completed(session.clone()), AfterUpdate::Remove),
            }
        });

        match transition {
            None => FlowOutcome::NotInFlow,
            Some(Transition::Rejected(step, reason)) => {
                warn!(user = %user_id, step = step.as_str(), %reason, "rejected answer");
                FlowOutcome::Invalid(ValidationError {
                    field: QuestionField::for_step(step),
                    reason,
                })
            }
            Some(Transition::Advanced(from, to)) => {
                debug!(user = %user_id, from = from.as_str(), to = to.as_str(), "step advanced");
                FlowOutcome::Prompt(Prompt::for_step(to))
            }
            Some(Transition::Completed(session)) => self.finish(session),
        }
    }

    /// Drops the user's open questionnaire. Returns `false` if there was none.
    pub fn cancel(
        &self,
        user_id: &UserId,
    ) -> bool {
        let removed = self.store.delete(user_id).is_some();
        if removed {
            info!(user = %user_id, "questionnaire cancelled");
        }
        removed
    }

    pub fn is_in_flow(
        &self,
        user_id: &UserId,
    ) -> bool {
        self.store.get(user_id).is_some()
    }

    /// A copy of the user's open session, if any.
    pub fn session(
        &self,
        user_id: &UserId,
    ) -> Option<Session> {
        self.store.get(user_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// Removes sessions idle for `max_idle` or longer.
    pub fn evict_idle(
        &self,
        max_idle: Duration,
    ) -> usize {
        self.evict_idle_at(Utc::now(), max_idle)
    }

    fn evict_idle_at(
        &self,
        now: DateTime<Utc>,
        max_idle: Duration,
    ) -> usize {
        let evicted = self.store.evict_idle(now - max_idle);
        if evicted > 0 {
            info!(evicted, "evicted idle questionnaires");
        }
        evicted
    }

    /// Writes the answer for the session's current step into the session.
    fn accept_answer(
        session: &mut Session,
        raw_text: &str,
    ) -> Result<(), ParseInputError> {
        match session.step {
            Step::AwaitingDependents => session.dependents = parse_non_negative_integer(raw_text)?,
            Step::AwaitingInss => session.inss_paid = parse_non_negative_decimal(raw_text)?,
            Step::AwaitingOtherDeductions => {
                session.other_deductions = parse_non_negative_decimal(raw_text)?
            }
        }
        Ok(())
    }

    /// Computes the result for a session the store has already dropped.
    fn finish(
        &self,
        session: Session,
    ) -> FlowOutcome {
        let input = TaxComputationInput {
            annual_income: session.annual_income,
            dependents: session.dependents,
            inss_paid: session.inss_paid,
            other_deductions: session.other_deductions,
        };
        let result = self.calculator.calculate(&input);

        info!(
            user = %session.user_id,
            annual_tax = %result.annual_tax,
            monthly_withholding = %result.monthly_withholding,
            "questionnaire completed"
        );

        FlowOutcome::Terminal(Box::new(TerminalOutcome {
            user_id: session.user_id,
            input,
            result,
        }))
    }
}
