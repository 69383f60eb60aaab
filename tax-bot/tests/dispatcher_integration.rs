//! End-to-end conversations driven through the dispatcher.
//!
//! A recording transport stands in for the chat platform so each test can
//! inspect exactly what the bot sent back.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_bot::commands::CommandParser;
use tax_bot::report::ReportDocument;
use tax_bot::{ChatTransport, Dispatched, Dispatcher, Inbound, TransportError};
use tax_core::{SessionFlow, Step, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Reply(String),
    Attach(ReportDocument),
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(UserId, Sent)>>,
    fail: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(
        &self,
        to: &Inbound,
        sent: Sent,
    ) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Delivery("platform unavailable".into()));
        }
        self.sent.lock().unwrap().push((to.user_id.clone(), sent));
        Ok(())
    }

    fn replies(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, sent)| match sent {
                Sent::Reply(text) => Some(text.clone()),
                Sent::Attach(_) => None,
            })
            .collect()
    }

    fn documents(&self) -> Vec<ReportDocument> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, sent)| match sent {
                Sent::Attach(doc) => Some(doc.clone()),
                Sent::Reply(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn reply(
        &self,
        to: &Inbound,
        text: &str,
    ) -> Result<(), TransportError> {
        self.record(to, Sent::Reply(text.to_string()))
    }

    async fn attach(
        &self,
        to: &Inbound,
        document: &ReportDocument,
    ) -> Result<(), TransportError> {
        self.record(to, Sent::Attach(document.clone()))
    }
}

fn dispatcher_with(transport: RecordingTransport) -> Dispatcher<RecordingTransport> {
    Dispatcher::new(
        Arc::new(SessionFlow::default()),
        CommandParser::new(".").unwrap(),
        transport,
    )
}

fn dispatcher() -> Dispatcher<RecordingTransport> {
    dispatcher_with(RecordingTransport::default())
}

async fn say(
    dispatcher: &Dispatcher<RecordingTransport>,
    user: &str,
    text: &str,
) -> Dispatched {
    dispatcher.handle(&Inbound::from_user(user, text)).await
}

// ============================================================================
// Full questionnaire
// ============================================================================

#[tokio::test]
async fn test_questionnaire_runs_to_completion() {
    let d = dispatcher();

    assert_eq!(say(&d, "ana", ".imposto-de-renda 85000").await, Dispatched::Replied);
    assert_eq!(say(&d, "ana", "2").await, Dispatched::Replied);
    assert_eq!(say(&d, "ana", "6000").await, Dispatched::Replied);
    assert_eq!(say(&d, "ana", "0").await, Dispatched::Completed);

    let replies = d.transport().replies();
    assert_eq!(replies.len(), 4);
    assert!(replies[0].contains("**dependentes**"));
    assert!(replies[1].contains("**INSS no ano**"));
    assert!(replies[2].contains("**outras deduções**"));
    assert!(replies[3].contains("Base de cálculo: **R$ 74449.84**"));
    assert!(replies[3].contains("Imposto devido: **R$ 10041.39**"));
    assert!(replies[3].contains("Retenção mensal estimada: **R$ 810.14**"));

    let documents = d.transport().documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].file_name, "imposto-de-renda-ana.md");
    assert!(documents[0].contents.contains("| Imposto devido | R$ 10041.39 |"));

    assert!(!d.flow().is_in_flow(&UserId::new("ana")));
}

#[tokio::test]
async fn test_answer_after_completion_is_ignored() {
    let d = dispatcher();
    for text in [".imposto-de-renda 85000", "2", "6000", "0"] {
        say(&d, "ana", text).await;
    }

    assert_eq!(say(&d, "ana", "0").await, Dispatched::Ignored);
}

#[tokio::test]
async fn test_low_income_owes_nothing() {
    let d = dispatcher();
    for text in [".imposto-de-renda 20000", "0", "0", "0"] {
        say(&d, "bia", text).await;
    }

    let replies = d.transport().replies();
    assert!(replies.last().unwrap().contains("Imposto devido: **R$ 0.00**"));
}

// ============================================================================
// Invalid answers and restarts
// ============================================================================

#[tokio::test]
async fn test_invalid_answer_keeps_step() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;

    say(&d, "ana", "dois").await;
    say(&d, "ana", "1.5").await;

    let replies = d.transport().replies();
    assert_eq!(replies[1], "❌ Digite um número válido de dependentes.");
    assert_eq!(replies[2], "❌ Digite um número válido de dependentes.");

    let session = d.flow().session(&UserId::new("ana")).unwrap();
    assert_eq!(session.step, Step::AwaitingDependents);
}

#[tokio::test]
async fn test_invalid_income_opens_no_session() {
    let d = dispatcher();

    say(&d, "ana", ".imposto-de-renda muito").await;

    assert!(!d.flow().is_in_flow(&UserId::new("ana")));
    assert!(d.transport().replies()[0].contains("renda anual"));
}

#[tokio::test]
async fn test_restart_discards_previous_answers() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;
    say(&d, "ana", "3").await;

    say(&d, "ana", ".imposto-de-renda 50000").await;

    let session = d.flow().session(&UserId::new("ana")).unwrap();
    assert_eq!(session.step, Step::AwaitingDependents);
    assert_eq!(session.annual_income, dec!(50000));
    assert_eq!(session.dependents, 0);
}

#[tokio::test]
async fn test_cancel_closes_questionnaire() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;

    say(&d, "ana", ".cancelar").await;
    say(&d, "ana", ".cancelar").await;

    let replies = d.transport().replies();
    assert!(replies[1].starts_with("🛑"));
    assert_eq!(replies[2], "Nenhum cálculo em andamento.");
    assert_eq!(say(&d, "ana", "2").await, Dispatched::Ignored);
}

// ============================================================================
// Isolation between users and authors
// ============================================================================

#[tokio::test]
async fn test_users_progress_independently() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;
    say(&d, "bia", ".imposto-de-renda 40000").await;

    say(&d, "ana", "2").await;

    assert_eq!(
        d.flow().session(&UserId::new("ana")).unwrap().step,
        Step::AwaitingInss
    );
    assert_eq!(
        d.flow().session(&UserId::new("bia")).unwrap().step,
        Step::AwaitingDependents
    );
}

#[tokio::test]
async fn test_bot_authored_messages_never_advance() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;
    let mut echo = Inbound::from_user("ana", "2");
    echo.author_is_bot = true;

    assert_eq!(d.handle(&echo).await, Dispatched::Ignored);
    assert_eq!(
        d.flow().session(&UserId::new("ana")).unwrap().step,
        Step::AwaitingDependents
    );
}

#[tokio::test]
async fn test_load_time_works_during_questionnaire() {
    let d = dispatcher();
    say(&d, "ana", ".imposto-de-renda 85000").await;

    say(&d, "ana", ".calc 120").await;

    assert_eq!(
        d.transport().replies()[1],
        "🕒 O tempo para carregar todos os seus pixels é **1h:00m**"
    );
    assert_eq!(
        d.flow().session(&UserId::new("ana")).unwrap().step,
        Step::AwaitingDependents
    );
}

// ============================================================================
// Delivery failures
// ============================================================================

#[tokio::test]
async fn test_delivery_failure_does_not_reopen_session() {
    let d = dispatcher_with(RecordingTransport::failing());
    for text in [".imposto-de-renda 85000", "2", "6000"] {
        say(&d, "ana", text).await;
    }

    assert_eq!(say(&d, "ana", "0").await, Dispatched::Completed);
    assert!(!d.flow().is_in_flow(&UserId::new("ana")));
}
