//! Line-oriented chat simulator used by the binary.
//!
//! Each input line is `<user>: <message>`. A user name ending in `[bot]`
//! marks the author as a bot, e.g. `helper[bot]: .calc 900`.

use anyhow::Result;
use tax_core::SessionStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::transport::{ChatTransport, Inbound};

const BOT_SUFFIX: &str = "[bot]";

/// Parses one console line. Returns `None` for blank or malformed lines.
pub fn parse_line(line: &str) -> Option<Inbound> {
    let (author, text) = line.split_once(':')?;
    let author = author.trim();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (name, author_is_bot) = match author.strip_suffix(BOT_SUFFIX) {
        Some(name) => (name.trim_end(), true),
        None => (author, false),
    };
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }

    let mut message = Inbound::from_user(name, text);
    message.author_is_bot = author_is_bot;
    Some(message)
}

/// Feeds every line from `input` through the dispatcher until end of input.
///
/// Returns the number of messages dispatched.
pub async fn run<R, T, S>(
    input: R,
    dispatcher: &Dispatcher<T, S>,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    T: ChatTransport,
    S: SessionStore,
{
    let mut lines = input.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(message) = parse_line(&line) else {
            warn!(line = %line, "expected '<user>: <message>'");
            continue;
        };

        let outcome = dispatcher.handle(&message).await;
        debug!(user = %message.user_id, ?outcome, "message dispatched");
        handled += 1;
    }

    Ok(handled)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tax_core::{SessionFlow, UserId};

    use super::*;
    use crate::commands::CommandParser;
    use crate::transport::ConsoleTransport;

    #[test]
    fn parses_user_and_text() {
        let message = parse_line("ana: .calc 900").unwrap();

        assert_eq!(message, Inbound::from_user("ana", ".calc 900"));
    }

    #[test]
    fn bot_suffix_marks_bot_author() {
        let message = parse_line("helper[bot]: .calc 900").unwrap();

        assert_eq!(message.user_id, UserId::new("helper"));
        assert!(message.author_is_bot);
    }

    #[test]
    fn text_may_contain_colons() {
        let message = parse_line("ana: R$: 10").unwrap();

        assert_eq!(message.text, "R$: 10");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_line("no separator"), None);
        assert_eq!(parse_line(": 900"), None);
        assert_eq!(parse_line("ana:   "), None);
        assert_eq!(parse_line("two words: hi"), None);
    }

    #[tokio::test]
    async fn run_dispatches_each_well_formed_line() {
        let dispatcher = Dispatcher::new(
            Arc::new(SessionFlow::default()),
            CommandParser::new(".").unwrap(),
            ConsoleTransport::new(Vec::new()),
        );
        let input = "ana: .calc 900\n\nnot a message\nbia: olá\n";

        let handled = run(input.as_bytes(), &dispatcher).await.unwrap();

        assert_eq!(handled, 2);
    }
}
