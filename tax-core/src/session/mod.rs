//! Per-user questionnaire sessions.
//!
//! [`SessionFlow`] drives the questionnaire; [`SessionStore`] holds the
//! sessions it is working on.

pub mod flow;
pub mod parse;
pub mod store;

pub use flow::{FlowOutcome, Prompt, QuestionField, SessionFlow, TerminalOutcome, ValidationError};
pub use parse::{MAX_AMOUNT, ParseInputError, parse_non_negative_decimal, parse_non_negative_integer};
pub use store::{AfterUpdate, InMemorySessionStore, SessionStore};
