//! Routes inbound chat messages to the calculators and the questionnaire.

use std::sync::Arc;

use chrono::Local;
use tax_core::calculations::estimate_load_time;
use tax_core::session::parse_non_negative_decimal;
use tax_core::{FlowOutcome, InMemorySessionStore, SessionFlow, SessionStore, TerminalOutcome};
use tracing::{debug, warn};

use crate::commands::{self, Command, CommandParser};
use crate::report;
use crate::transport::{ChatTransport, Inbound};

/// What the dispatcher did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Bot author, or plain text from a user with no open questionnaire.
    Ignored,
    /// A reply (prompt, answer or correction) was sent.
    Replied,
    /// A questionnaire finished and the report was sent.
    Completed,
}

pub struct Dispatcher<T, S = InMemorySessionStore> {
    flow: Arc<SessionFlow<S>>,
    commands: CommandParser,
    transport: T,
}

impl<T, S> Dispatcher<T, S>
where
    T: ChatTransport,
    S: SessionStore,
{
    pub fn new(
        flow: Arc<SessionFlow<S>>,
        commands: CommandParser,
        transport: T,
    ) -> Self {
        Self {
            flow,
            commands,
            transport,
        }
    }

    pub fn flow(&self) -> &SessionFlow<S> {
        &self.flow
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handles one inbound message.
    ///
    /// Delivery failures are logged and swallowed; they never roll back a
    /// questionnaire transition.
    pub async fn handle(
        &self,
        message: &Inbound,
    ) -> Dispatched {
        if message.author_is_bot {
            return Dispatched::Ignored;
        }

        match self.commands.parse(&message.text) {
            Some(Command::LoadTime(arg)) => self.load_time(message, arg).await,
            Some(Command::IncomeTax(arg)) => self.start_income_tax(message, arg).await,
            Some(Command::Cancel) => self.cancel(message).await,
            None => self.answer(message).await,
        }
    }

    async fn load_time(
        &self,
        message: &Inbound,
        arg: Option<&str>,
    ) -> Dispatched {
        let estimate = arg
            .and_then(|raw| parse_non_negative_decimal(raw).ok())
            .and_then(|pixels| estimate_load_time(pixels).ok());

        let text = match estimate {
            Some(time) => {
                format!("🕒 O tempo para carregar todos os seus pixels é **{time}**")
            }
            None => format!(
                "❌ Por favor, digite um número válido. Ex: {}",
                self.commands.example(commands::LOAD_TIME, "900")
            ),
        };
        self.send(message, &text).await
    }

    async fn start_income_tax(
        &self,
        message: &Inbound,
        arg: Option<&str>,
    ) -> Dispatched {
        let Some(raw_income) = arg else {
            let text = format!(
                "❌ Informe sua renda anual. Exemplo: {}",
                self.commands.example(commands::INCOME_TAX, "85000")
            );
            return self.send(message, &text).await;
        };

        match self.flow.start_flow(message.user_id.clone(), raw_income) {
            Ok(prompt) => self.send(message, prompt.text).await,
            Err(err) => self.send(message, err.message()).await,
        }
    }

    async fn cancel(
        &self,
        message: &Inbound,
    ) -> Dispatched {
        let text = if self.flow.cancel(&message.user_id) {
            "🛑 Cálculo do imposto de renda cancelado."
        } else {
            "Nenhum cálculo em andamento."
        };
        self.send(message, text).await
    }

    async fn answer(
        &self,
        message: &Inbound,
    ) -> Dispatched {
        match self.flow.advance(&message.user_id, &message.text) {
            FlowOutcome::NotInFlow => {
                debug!(user = %message.user_id, "ignoring message outside a questionnaire");
                Dispatched::Ignored
            }
            FlowOutcome::Prompt(prompt) => self.send(message, prompt.text).await,
            FlowOutcome::Invalid(err) => self.send(message, err.message()).await,
            FlowOutcome::Terminal(done) => self.deliver_report(message, &done).await,
        }
    }

    async fn deliver_report(
        &self,
        message: &Inbound,
        outcome: &TerminalOutcome,
    ) -> Dispatched {
        self.send(message, &report::summary(outcome)).await;

        let document = report::render(outcome, Local::now());
        if let Err(error) = self.transport.attach(message, &document).await {
            warn!(user = %message.user_id, file = %document.file_name, %error, "report delivery failed");
        }
        Dispatched::Completed
    }

    async fn send(
        &self,
        message: &Inbound,
        text: &str,
    ) -> Dispatched {
        if let Err(error) = self.transport.reply(message, text).await {
            warn!(user = %message.user_id, %error, "reply delivery failed");
        }
        Dispatched::Replied
    }
}
