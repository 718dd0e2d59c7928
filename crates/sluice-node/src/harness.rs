//! Line-based console transport for exercising the engine locally.
//!
//! Real deployments implement [`Messenger`] and the chain clients against
//! their actual transport; this harness stands in for both so the binary
//! can be driven from a terminal:
//!
//! ```text
//! <account-id> /start
//! <account-id> !button claim_token_sepolia
//! <account-id> !photo file-abc123
//! <account-id> any other text
//! ```

use async_trait::async_trait;
use sluice_engine::{Action, ConversationEngine, Event, EventKind, Messenger, PhotoRef};
use sluice_types::{AccountId, ChatId, MessageId, Result as SluiceResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Prints outbound messages to stdout and treats every account as a
/// channel member.
#[derive(Default)]
pub struct ConsoleMessenger {
    next_id: AtomicI64,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn print_actions(actions: &[Action]) {
        for action in actions {
            match action {
                Action::Callback { label, data } => println!("    [{}] -> {}", label, data),
                Action::Url { label, url } => println!("    [{}] -> {}", label, url),
            }
        }
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(&self, chat: ChatId, text: &str) -> SluiceResult<MessageId> {
        let id = self.next();
        println!("-> {} (#{}): {}", chat, id, text);
        Ok(id)
    }

    async fn send_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        actions: &[Action],
    ) -> SluiceResult<MessageId> {
        let id = self.next();
        println!("-> {} (#{}): {}", chat, id, text);
        Self::print_actions(actions);
        Ok(id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: &str,
        actions: &[Action],
    ) -> SluiceResult<MessageId> {
        let id = self.next();
        println!("-> {} (#{}) [photo {}]: {}", chat, id, photo.0, caption);
        Self::print_actions(actions);
        Ok(id)
    }

    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str) -> SluiceResult<()> {
        println!("~> {} (#{} edited): {}", chat, message, text);
        Ok(())
    }

    async fn is_channel_member(&self, _channel: ChatId, _account: AccountId) -> SluiceResult<bool> {
        Ok(true)
    }
}

fn parse_line(line: &str, now: i64) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (account_str, rest) = line.split_once(' ')?;
    let account = AccountId(account_str.parse::<i64>().ok()?);

    let kind = if let Some(data) = rest.strip_prefix("!button ") {
        EventKind::Button(data.trim().to_string())
    } else if let Some(file) = rest.strip_prefix("!photo ") {
        EventKind::Photo(PhotoRef(file.trim().to_string()))
    } else {
        EventKind::Text(rest.to_string())
    };

    Some(Event {
        account,
        display_name: format!("console-{}", account),
        username: None,
        timestamp: now,
        kind,
    })
}

/// Read events from stdin until EOF and feed them to the engine.
pub async fn run(engine: Arc<ConversationEngine>) -> anyhow::Result<()> {
    info!("🎛️ Console harness ready; format: '<account-id> <text | !button data | !photo ref>'");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let now = chrono::Utc::now().timestamp();
        let Some(event) = parse_line(&line, now) else {
            warn!(line, "Unparseable console input, expected '<account-id> <input>'");
            continue;
        };
        if let Err(e) = engine.handle_event(event).await {
            warn!(error = %e, "Event handling failed");
        }
    }

    info!("Console input closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_button_and_photo() {
        let event = parse_line("1001 /start", 5).unwrap();
        assert!(matches!(event.kind, EventKind::Text(ref t) if t == "/start"));
        assert_eq!(event.account, AccountId(1001));
        assert_eq!(event.timestamp, 5);

        let event = parse_line("1001 !button claim_token_sepolia", 5).unwrap();
        assert!(matches!(event.kind, EventKind::Button(ref d) if d == "claim_token_sepolia"));

        let event = parse_line("1001 !photo file-9", 5).unwrap();
        assert!(matches!(event.kind, EventKind::Photo(ref p) if p.0 == "file-9"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_line("", 0).is_none());
        assert!(parse_line("no-account-id", 0).is_none());
        assert!(parse_line("abc /start", 0).is_none());
    }
}
