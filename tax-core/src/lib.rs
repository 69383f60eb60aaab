pub mod calculations;
pub mod models;
pub mod session;

pub use models::*;
pub use session::{
    FlowOutcome, InMemorySessionStore, Prompt, SessionFlow, SessionStore, TerminalOutcome,
    ValidationError,
};
