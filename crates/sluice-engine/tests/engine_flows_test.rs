use async_trait::async_trait;
use sluice_chain::{ClientSet, PayoutExecutor, SimulatedChainClient};
use sluice_engine::{
    Action, AuthPolicy, ConversationEngine, EngineConfig, Event, EventKind, Messenger, PhotoRef,
    SocialTasksConfig,
};
use sluice_store::{MemoryStore, StateStore};
use sluice_types::{
    AccountId, Address, ChatId, MessageId, NetworkConfig, NetworkId, Networks, Result, SluiceError,
    TokenAmount,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

const REVIEW_CHANNEL: ChatId = ChatId(-900);
const OWNER: AccountId = AccountId(999);
const REVIEWER: AccountId = AccountId(888);

const ADDR_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const ADDR_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
const SENDER: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";

#[derive(Debug, Clone)]
struct Outbound {
    chat: ChatId,
    text: String,
    actions: Vec<Action>,
}

/// Records everything the engine sends; individual chats can be scripted
/// to fail delivery.
#[derive(Default)]
struct RecordingMessenger {
    outbox: Mutex<Vec<Outbound>>,
    edits: Mutex<Vec<(ChatId, MessageId, String)>>,
    failing_chats: Mutex<HashSet<ChatId>>,
    next_id: AtomicI64,
}

impl RecordingMessenger {
    async fn record(&self, chat: ChatId, text: &str, actions: &[Action]) -> Result<MessageId> {
        if self.failing_chats.lock().await.contains(&chat) {
            return Err(SluiceError::Storage(format!("delivery to {} failed", chat)));
        }
        self.outbox.lock().await.push(Outbound {
            chat,
            text: text.to_string(),
            actions: actions.to_vec(),
        });
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn fail_chat(&self, chat: ChatId) {
        self.failing_chats.lock().await.insert(chat);
    }

    async fn messages_to(&self, chat: ChatId) -> Vec<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .filter(|m| m.chat == chat)
            .map(|m| m.text.clone())
            .collect()
    }

    async fn last_message_to(&self, chat: ChatId) -> String {
        self.messages_to(chat)
            .await
            .last()
            .cloned()
            .unwrap_or_default()
    }

    async fn last_actions_to(&self, chat: ChatId) -> Vec<Action> {
        self.outbox
            .lock()
            .await
            .iter()
            .filter(|m| m.chat == chat)
            .map(|m| m.actions.clone())
            .last()
            .unwrap_or_default()
    }

    async fn edits_to(&self, chat: ChatId) -> Vec<String> {
        self.edits
            .lock()
            .await
            .iter()
            .filter(|(c, _, _)| *c == chat)
            .map(|(_, _, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        self.record(chat, text, &[]).await
    }

    async fn send_with_actions(
        &self,
        chat: ChatId,
        text: &str,
        actions: &[Action],
    ) -> Result<MessageId> {
        self.record(chat, text, actions).await
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        _photo: &PhotoRef,
        caption: &str,
        actions: &[Action],
    ) -> Result<MessageId> {
        self.record(chat, caption, actions).await
    }

    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str) -> Result<()> {
        self.edits
            .lock()
            .await
            .push((chat, message, text.to_string()));
        Ok(())
    }

    async fn is_channel_member(&self, _channel: ChatId, _account: AccountId) -> Result<bool> {
        Ok(true)
    }
}

struct Harness {
    engine: ConversationEngine,
    messenger: Arc<RecordingMessenger>,
    chain: Arc<SimulatedChainClient>,
    store: Arc<MemoryStore>,
}

fn networks() -> Networks {
    let mut map = BTreeMap::new();
    map.insert(
        NetworkId::new("sepolia"),
        NetworkConfig {
            display_name: "Eth Sepolia".to_string(),
            currency_symbol: "ETH".to_string(),
            faucet_enabled: true,
            purchase_enabled: true,
            faucet_amount: TokenAmount::from_display(0.05),
            task_reward_amount: None,
            chain_id: 11155111,
            rpc_url: "http://localhost:8545".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
        },
    );
    map.insert(
        NetworkId::new("monad"),
        NetworkConfig {
            display_name: "Monad Testnet".to_string(),
            currency_symbol: "MON".to_string(),
            faucet_enabled: true,
            purchase_enabled: false,
            faucet_amount: TokenAmount::from_display(0.2),
            task_reward_amount: TokenAmount::from_display(0.4),
            chain_id: 10143,
            rpc_url: "http://localhost:8546".to_string(),
            explorer_url: "https://testnet.monadexplorer.com".to_string(),
        },
    );
    Networks::new(map)
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let messenger = Arc::new(RecordingMessenger::default());
    let chain = Arc::new(SimulatedChainClient::new());

    let mut clients = ClientSet::new();
    clients.insert(NetworkId::new("sepolia"), chain.clone());
    clients.insert(NetworkId::new("monad"), chain.clone());

    let sender = Address::parse(SENDER).unwrap();
    let executor = Arc::new(PayoutExecutor::new(clients, networks(), sender));

    let config = EngineConfig {
        review_channel: REVIEW_CHANNEL,
        gate_channel: None,
        gate_invite_url: None,
        owner_contact: "@faucet_admin".to_string(),
        promo_link: "https://t.me/sluice_faucet_bot".to_string(),
        social: SocialTasksConfig {
            follow_primary: "@sluice_faucet".to_string(),
            follow_secondary: "@sluice_partner".to_string(),
            promo_hashtags: "#faucet #testnet".to_string(),
            partner_bot_url: "https://t.me/partner_bot".to_string(),
        },
    };

    let engine = ConversationEngine::new(
        store.clone() as Arc<dyn StateStore>,
        executor,
        messenger.clone(),
        networks(),
        AuthPolicy::new([OWNER], [REVIEWER]),
        config,
    );

    Harness {
        engine,
        messenger,
        chain,
        store,
    }
}

fn text(account: AccountId, t: i64, body: &str) -> Event {
    Event {
        account,
        display_name: format!("User {}", account),
        username: Some(format!("user{}", account)),
        timestamp: t,
        kind: EventKind::Text(body.to_string()),
    }
}

fn button(account: AccountId, t: i64, data: &str) -> Event {
    Event {
        account,
        display_name: format!("User {}", account),
        username: Some(format!("user{}", account)),
        timestamp: t,
        kind: EventKind::Button(data.to_string()),
    }
}

fn photo(account: AccountId, t: i64, file_id: &str) -> Event {
    Event {
        account,
        display_name: format!("User {}", account),
        username: Some(format!("user{}", account)),
        timestamp: t,
        kind: EventKind::Photo(PhotoRef(file_id.to_string())),
    }
}

async fn claim(h: &Harness, account: AccountId, t: i64, address: &str) {
    h.engine
        .handle_event(button(account, t, "claim_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, t, address)).await.unwrap();
}

/// Walk the social branch up to and including the post-link submission.
async fn submit_social_task(h: &Harness, account: AccountId, t: i64, address: &str) {
    h.engine
        .handle_event(button(account, t, "menu_earn"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, t, "select_reward_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, t, address)).await.unwrap();
    h.engine
        .handle_event(button(account, t, "select_task_social"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, t, "social_follow_1_done"))
        .await
        .unwrap();
    h.engine
        .handle_event(text(account, t, "@somehandle"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, t, "social_follow_2_done"))
        .await
        .unwrap();
    h.engine
        .handle_event(text(account, t, "https://x.com/somehandle/status/123456"))
        .await
        .unwrap();
}

// --- claim flow ---

#[tokio::test]
async fn test_claim_succeeds_then_rate_limits_with_wait_message() {
    let h = harness();
    let account = AccountId(1001);

    claim(&h, account, 1000, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 1);
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("Success"), "unexpected reply: {reply}");
    assert!(reply.contains("/tx/0x"));

    claim(&h, account, 2000, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 1);
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(
        reply.contains("23 hours, 43 minutes"),
        "unexpected reply: {reply}"
    );
}

#[tokio::test]
async fn test_claim_cooldown_boundary() {
    let h = harness();
    let account = AccountId(1001);

    claim(&h, account, 1000, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 1);

    // One second inside the window: refused.
    claim(&h, account, 1000 + 86_399, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 1);

    // Past the window: allowed.
    claim(&h, account, 1000 + 86_401, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 2);
}

#[tokio::test]
async fn test_invalid_claim_address_reprompts_without_ending_flow() {
    let h = harness();
    let account = AccountId(1001);

    h.engine
        .handle_event(button(account, 1000, "claim_token_sepolia"))
        .await
        .unwrap();
    h.engine
        .handle_event(text(account, 1000, "definitely not an address"))
        .await
        .unwrap();
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("doesn't look like a valid wallet address"));
    assert_eq!(h.chain.sent_count().await, 0);

    // Same session still accepts a corrected address.
    h.engine.handle_event(text(account, 1000, ADDR_A)).await.unwrap();
    assert_eq!(h.chain.sent_count().await, 1);
}

#[tokio::test]
async fn test_failed_send_reports_cause_and_consumes_nothing() {
    let h = harness();
    let account = AccountId(1001);

    h.chain.fail_next_send("rpc unreachable");
    claim(&h, account, 1000, ADDR_A).await;

    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("Failed to send token"));
    assert!(reply.contains("rpc unreachable"));

    // Cooldown untouched: an immediate retry goes through.
    let record = h.store.get_account(account).await.unwrap().unwrap();
    assert!(record.last_claim_times.is_empty());

    claim(&h, account, 1001, ADDR_A).await;
    assert_eq!(h.chain.sent_count().await, 1);
}

#[tokio::test]
async fn test_cancel_discards_claim_session() {
    let h = harness();
    let account = AccountId(1001);

    h.engine
        .handle_event(button(account, 1000, "claim_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 1000, "/cancel")).await.unwrap();
    h.engine.handle_event(text(account, 1000, ADDR_A)).await.unwrap();

    assert_eq!(h.chain.sent_count().await, 0);
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("/start"));
}

// --- purchase flow ---

#[tokio::test]
async fn test_purchase_inquiry_notifies_reviewer_without_payout() {
    let h = harness();
    let account = AccountId(1001);
    h.chain
        .fund(
            &Address::parse(SENDER).unwrap(),
            TokenAmount::from_display(10.0).unwrap(),
        )
        .await;

    h.engine
        .handle_event(button(account, 1000, "menu_purchase"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "buy_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 1000, "0.5")).await.unwrap();

    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("We can fulfill"));
    assert!(reply.contains("@faucet_admin"));

    let review = h.messenger.last_message_to(REVIEW_CHANNEL).await;
    assert!(review.contains("NEW PURCHASE REQUEST"));
    assert_eq!(h.chain.sent_count().await, 0);
}

#[tokio::test]
async fn test_purchase_amount_must_be_positive_number() {
    let h = harness();
    let account = AccountId(1001);

    h.engine
        .handle_event(button(account, 1000, "menu_purchase"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "buy_token_sepolia"))
        .await
        .unwrap();

    for bad in ["abc", "-3", "0"] {
        h.engine.handle_event(text(account, 1000, bad)).await.unwrap();
        let reply = h.messenger.last_message_to(account.into()).await;
        assert!(reply.contains("positive number"), "input {bad}: {reply}");
    }
}

#[tokio::test]
async fn test_purchase_insufficient_treasury() {
    let h = harness();
    let account = AccountId(1001);
    // Treasury left at zero.

    h.engine
        .handle_event(button(account, 1000, "menu_purchase"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "buy_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 1000, "0.5")).await.unwrap();

    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("does not hold enough"));
    assert!(h.messenger.messages_to(REVIEW_CHANNEL).await.is_empty());
}

// --- earn-reward flow ---

#[tokio::test]
async fn test_social_submission_reaches_reviewer_and_approval_pays_once() {
    let h = harness();
    let account = AccountId(2002);

    submit_social_task(&h, account, 1000, ADDR_A).await;
    assert_eq!(h.engine.queue.len().await, 1);
    assert_eq!(h.chain.sent_count().await, 0);

    let review = h.messenger.last_message_to(REVIEW_CHANNEL).await;
    assert!(review.contains("NEW TASK VERIFICATION REQUEST"));
    assert!(review.contains("First time (reward eligible)"));

    // The review message carries the decision actions.
    let actions = h.messenger.last_actions_to(REVIEW_CHANNEL).await;
    assert!(actions.iter().any(
        |a| matches!(a, Action::Callback { data, .. } if data == "admin_approve_task_2002")
    ));
    assert!(actions.iter().any(
        |a| matches!(a, Action::Callback { data, .. } if data == "admin_reject_task_2002")
    ));

    h.engine
        .handle_event(button(REVIEWER, 2000, "admin_approve_task_2002"))
        .await
        .unwrap();

    assert_eq!(h.chain.sent_count().await, 1);
    assert_eq!(h.store.redemption_count().await.unwrap(), 1);
    let record = h.store.get_account(account).await.unwrap().unwrap();
    assert!(record.campaign_done("earn_reward"));

    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("APPROVED"));
    assert!(reply.contains("reward has been sent"));

    // Acting twice on the same submission: no second payout.
    h.engine
        .handle_event(button(REVIEWER, 2001, "admin_approve_task_2002"))
        .await
        .unwrap();
    assert_eq!(h.chain.sent_count().await, 1);
    let reply = h.messenger.last_message_to(ChatId::from(REVIEWER)).await;
    assert!(reply.contains("already processed"));
}

#[tokio::test]
async fn test_duplicate_address_rejected_before_task_branch() {
    let h = harness();

    submit_social_task(&h, AccountId(2002), 1000, ADDR_A).await;
    h.engine
        .handle_event(button(REVIEWER, 1500, "admin_approve_task_2002"))
        .await
        .unwrap();
    assert_eq!(h.store.redemption_count().await.unwrap(), 1);

    // A different account submits the same address.
    let intruder = AccountId(3003);
    h.engine
        .handle_event(button(intruder, 2000, "menu_earn"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(intruder, 2000, "select_reward_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(intruder, 2000, ADDR_A)).await.unwrap();

    let reply = h.messenger.last_message_to(intruder.into()).await;
    assert!(reply.contains("already been used"));
    // Rejected at the address step: the task choice was never shown.
    assert!(!reply.contains("select which task"));
    assert_eq!(h.chain.sent_count().await, 1);
    assert_eq!(h.engine.queue.len().await, 0);
}

#[tokio::test]
async fn test_reentry_approval_never_pays_or_rebinds() {
    let h = harness();
    let account = AccountId(2002);

    submit_social_task(&h, account, 1000, ADDR_A).await;
    h.engine
        .handle_event(button(REVIEWER, 1500, "admin_approve_task_2002"))
        .await
        .unwrap();
    assert_eq!(h.chain.sent_count().await, 1);

    // Re-enter with the same (own) address, this time via the screenshot
    // branch.
    h.engine
        .handle_event(button(account, 2000, "menu_earn"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 2000, "select_reward_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 2000, ADDR_A)).await.unwrap();

    // The re-entry warning precedes the task choice message.
    let all = h.messenger.messages_to(account.into()).await;
    assert!(all
        .iter()
        .any(|m| m.contains("no further rewards will be distributed")));
    assert!(all.last().unwrap().contains("select which task"));

    h.engine
        .handle_event(button(account, 2000, "select_task_screenshot"))
        .await
        .unwrap();
    h.engine
        .handle_event(photo(account, 2000, "file-123"))
        .await
        .unwrap();

    let review = h.messenger.last_message_to(REVIEW_CHANNEL).await;
    assert!(review.contains("Re-entry (no reward)"));

    h.engine
        .handle_event(button(REVIEWER, 2500, "admin_approve_task_2002"))
        .await
        .unwrap();

    // Approved, but nothing sent and nothing rebound.
    assert_eq!(h.chain.sent_count().await, 1);
    assert_eq!(h.store.redemption_count().await.unwrap(), 1);
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("no further rewards"));
}

#[tokio::test]
async fn test_screenshot_branch_requires_image() {
    let h = harness();
    let account = AccountId(2002);

    h.engine
        .handle_event(button(account, 1000, "menu_earn"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "select_reward_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 1000, ADDR_A)).await.unwrap();
    h.engine
        .handle_event(button(account, 1000, "select_task_screenshot"))
        .await
        .unwrap();

    // Text instead of an image: re-prompt, session preserved.
    h.engine
        .handle_event(text(account, 1000, "here is my proof"))
        .await
        .unwrap();
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("send an image"));
    assert_eq!(h.engine.queue.len().await, 0);

    h.engine
        .handle_event(photo(account, 1000, "file-456"))
        .await
        .unwrap();
    assert_eq!(h.engine.queue.len().await, 1);
}

#[tokio::test]
async fn test_invalid_post_link_reprompts() {
    let h = harness();
    let account = AccountId(2002);

    h.engine
        .handle_event(button(account, 1000, "menu_earn"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "select_reward_token_sepolia"))
        .await
        .unwrap();
    h.engine.handle_event(text(account, 1000, ADDR_A)).await.unwrap();
    h.engine
        .handle_event(button(account, 1000, "select_task_social"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "social_follow_1_done"))
        .await
        .unwrap();
    h.engine
        .handle_event(text(account, 1000, "@somehandle"))
        .await
        .unwrap();
    h.engine
        .handle_event(button(account, 1000, "social_follow_2_done"))
        .await
        .unwrap();

    h.engine
        .handle_event(text(account, 1000, "https://example.com/not/a/post"))
        .await
        .unwrap();
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("valid post link"));
    assert_eq!(h.engine.queue.len().await, 0);

    h.engine
        .handle_event(text(account, 1000, "https://x.com/somehandle/status/42"))
        .await
        .unwrap();
    assert_eq!(h.engine.queue.len().await, 1);
}

#[tokio::test]
async fn test_resubmission_replaces_pending_and_annotates_stale() {
    let h = harness();
    let account = AccountId(2002);

    submit_social_task(&h, account, 1000, ADDR_A).await;
    submit_social_task(&h, account, 1100, ADDR_A).await;

    assert_eq!(h.engine.queue.len().await, 1);
    let edits = h.messenger.edits_to(REVIEW_CHANNEL).await;
    assert!(edits.iter().any(|e| e.contains("Superseded")));
}

#[tokio::test]
async fn test_failed_reward_payout_leaves_submission_pending() {
    let h = harness();
    let account = AccountId(2002);

    submit_social_task(&h, account, 1000, ADDR_A).await;
    h.chain.fail_next_send("rpc unreachable");

    h.engine
        .handle_event(button(REVIEWER, 1500, "admin_approve_task_2002"))
        .await
        .unwrap();

    // Ledgers and queue are as they were before the attempt.
    assert_eq!(h.chain.sent_count().await, 0);
    assert_eq!(h.store.redemption_count().await.unwrap(), 0);
    assert_eq!(h.engine.queue.len().await, 1);
    let record = h.store.get_account(account).await.unwrap().unwrap();
    assert!(!record.campaign_done("earn_reward"));

    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("issue sending your reward"));
    assert!(reply.contains("rpc unreachable"));

    // The reviewer can retry the approval.
    h.engine
        .handle_event(button(REVIEWER, 1600, "admin_approve_task_2002"))
        .await
        .unwrap();
    assert_eq!(h.chain.sent_count().await, 1);
    assert_eq!(h.store.redemption_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rejection_notifies_submitter_with_guidance() {
    let h = harness();
    let account = AccountId(2002);

    submit_social_task(&h, account, 1000, ADDR_A).await;
    h.engine
        .handle_event(button(REVIEWER, 1500, "admin_reject_task_2002"))
        .await
        .unwrap();

    assert_eq!(h.chain.sent_count().await, 0);
    assert_eq!(h.engine.queue.len().await, 0);
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("REJECTED"));
    assert!(reply.contains("@sluice_faucet"));
}

#[tokio::test]
async fn test_unauthorized_reviewer_action_changes_nothing() {
    let h = harness();
    submit_social_task(&h, AccountId(2002), 1000, ADDR_A).await;

    h.engine
        .handle_event(button(AccountId(3003), 1500, "admin_approve_task_2002"))
        .await
        .unwrap();

    assert_eq!(h.chain.sent_count().await, 0);
    assert_eq!(h.engine.queue.len().await, 1);
    let reply = h
        .messenger
        .last_message_to(ChatId::from(AccountId(3003)))
        .await;
    assert!(reply.contains("not authorized"));
}

// --- owner commands and maintenance ---

#[tokio::test]
async fn test_owner_send_bypasses_gating() {
    let h = harness();

    h.engine
        .handle_event(text(OWNER, 1000, &format!("/send 0.5 eth {}", ADDR_B)))
        .await
        .unwrap();
    assert_eq!(h.chain.sent_count().await, 1);

    // No cooldown applies; a second manual send goes straight through.
    h.engine
        .handle_event(text(OWNER, 1001, &format!("/send 0.5 eth {}", ADDR_B)))
        .await
        .unwrap();
    assert_eq!(h.chain.sent_count().await, 2);
}

#[tokio::test]
async fn test_owner_commands_refused_for_others() {
    let h = harness();
    let account = AccountId(1001);

    for command in [
        format!("/send 0.5 eth {}", ADDR_B),
        "/stat".to_string(),
        "/broadcast hi".to_string(),
        "/maintenance on".to_string(),
    ] {
        h.engine.handle_event(text(account, 1000, &command)).await.unwrap();
        let reply = h.messenger.last_message_to(account.into()).await;
        assert!(reply.contains("not authorized"), "command {command}");
    }
    assert_eq!(h.chain.sent_count().await, 0);
    assert!(!h.engine.maintenance.is_on());
}

#[tokio::test]
async fn test_maintenance_mode_blocks_non_owner_flows() {
    let h = harness();
    let account = AccountId(1001);

    h.engine
        .handle_event(text(OWNER, 1000, "/maintenance on"))
        .await
        .unwrap();
    assert!(h.engine.maintenance.is_on());

    h.engine
        .handle_event(button(account, 1001, "claim_token_sepolia"))
        .await
        .unwrap();
    let reply = h.messenger.last_message_to(account.into()).await;
    assert!(reply.contains("maintenance mode"));

    // The owner still gets through.
    h.engine
        .handle_event(text(OWNER, 1002, "/stat"))
        .await
        .unwrap();
    let reply = h.messenger.last_message_to(ChatId::from(OWNER)).await;
    assert!(reply.contains("Statistics"));

    h.engine
        .handle_event(text(OWNER, 1003, "/maintenance off"))
        .await
        .unwrap();
    assert!(!h.engine.maintenance.is_on());
}

#[tokio::test]
async fn test_stat_reports_counts() {
    let h = harness();

    claim(&h, AccountId(1001), 1000, ADDR_A).await;
    submit_social_task(&h, AccountId(2002), 1000, ADDR_B).await;

    h.engine.handle_event(text(OWNER, 2000, "/stat")).await.unwrap();
    let reply = h.messenger.last_message_to(ChatId::from(OWNER)).await;
    assert!(reply.contains("Total accounts: 3"));
    assert!(reply.contains("Pending verifications: 1"));
}

#[tokio::test]
async fn test_broadcast_continues_past_failures() {
    let h = harness();

    // Three known accounts plus the owner.
    claim(&h, AccountId(1001), 1000, ADDR_A).await;
    h.engine.handle_event(text(AccountId(2002), 1000, "hi")).await.unwrap();
    h.engine.handle_event(text(AccountId(3003), 1000, "hi")).await.unwrap();

    h.messenger.fail_chat(ChatId::from(AccountId(2002))).await;

    h.engine
        .handle_event(text(OWNER, 2000, "/broadcast service maintenance at noon"))
        .await
        .unwrap();

    let reply = h.messenger.last_message_to(ChatId::from(OWNER)).await;
    assert!(reply.contains("Failed for 1"), "unexpected reply: {reply}");
    let delivered = h.messenger.messages_to(ChatId::from(AccountId(3003))).await;
    assert!(delivered
        .iter()
        .any(|m| m.contains("service maintenance at noon")));
}

#[tokio::test]
async fn test_balance_report_lists_each_network() {
    let h = harness();
    h.chain
        .fund(
            &Address::parse(SENDER).unwrap(),
            TokenAmount::from_display(1.5).unwrap(),
        )
        .await;

    h.engine
        .handle_event(button(AccountId(1001), 1000, "menu_balance"))
        .await
        .unwrap();
    let reply = h
        .messenger
        .last_message_to(ChatId::from(AccountId(1001)))
        .await;
    assert!(reply.contains("Eth Sepolia"));
    assert!(reply.contains("Monad Testnet"));
}
