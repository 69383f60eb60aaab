//! The seam between the bot and whatever chat platform carries its messages.

use async_trait::async_trait;
use tax_core::UserId;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::report::ReportDocument;

/// A message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: UserId,
    pub author_is_bot: bool,
    pub text: String,
}

impl Inbound {
    pub fn from_user(
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: UserId::new(user_id),
            author_is_bot: false,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound capabilities the bot needs from a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a plain text reply to the author of `to`.
    async fn reply(
        &self,
        to: &Inbound,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Sends a generated document to the author of `to`.
    async fn attach(
        &self,
        to: &Inbound,
        document: &ReportDocument,
    ) -> Result<(), TransportError>;
}

/// Writes replies and documents to a terminal (or any async writer).
pub struct ConsoleTransport<W> {
    out: Mutex<W>,
}

impl ConsoleTransport<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_block(
        &self,
        block: String,
    ) -> Result<(), TransportError> {
        let mut out = self.out.lock().await;
        out.write_all(block.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W> ChatTransport for ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn reply(
        &self,
        to: &Inbound,
        text: &str,
    ) -> Result<(), TransportError> {
        self.write_block(format!("@{} {text}\n", to.user_id)).await
    }

    async fn attach(
        &self,
        to: &Inbound,
        document: &ReportDocument,
    ) -> Result<(), TransportError> {
        self.write_block(format!(
            "@{} 📎 {}\n{}\n",
            to.user_id,
            document.file_name,
            document.contents.trim_end()
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn reply_is_addressed_to_the_author() {
        let transport = ConsoleTransport::new(Vec::new());

        transport
            .reply(&Inbound::from_user("ana", "oi"), "olá")
            .await
            .unwrap();

        let written = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(written, "@ana olá\n");
    }

    #[tokio::test]
    async fn attach_prints_file_name_and_contents() {
        let transport = ConsoleTransport::new(Vec::new());
        let document = ReportDocument {
            file_name: "r.md".to_string(),
            contents: "# R\n\nbody\n".to_string(),
        };

        transport
            .attach(&Inbound::from_user("ana", "0"), &document)
            .await
            .unwrap();

        let written = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(written, "@ana 📎 r.md\n# R\n\nbody\n");
    }
}
