//! Chat session - the persisted message log between a customer and the FAQ bot.
//!
//! The session owns the log; the [`Responder`] stays stateless. Every append is
//! written to storage before the session moves on, so the user's message is
//! durable even if the reply never arrives.

use crate::{
    core::responder::{DEFAULT_SUGGESTIONS, Responder},
    errors::Result,
    storage::{self, KeyValueStore},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::debug;
use uuid::Uuid;

const WELCOME_MESSAGE: &str =
    "Hi! I'm the farm assistant. Ask me anything about our eggs, poultry, prices or delivery.";

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message id
    pub id: Uuid,
    /// Message body
    pub text: String,
    /// Whether the bot wrote this message
    pub is_from_bot: bool,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// Topic keys offered with a bot message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_topics: Option<Vec<String>>,
}

impl ChatMessage {
    fn from_user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_from_bot: false,
            timestamp: Utc::now(),
            suggested_topics: None,
        }
    }

    fn from_bot(text: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_from_bot: true,
            timestamp: Utc::now(),
            suggested_topics: (!suggestions.is_empty()).then_some(suggestions),
        }
    }

    fn welcome() -> Self {
        Self::from_bot(
            WELCOME_MESSAGE,
            DEFAULT_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect(),
        )
    }
}

/// A customer's conversation with the FAQ bot.
#[derive(Debug)]
pub struct ChatSession<S> {
    store: Arc<S>,
    responder: Arc<Responder>,
    key: String,
    typing_delay: Duration,
    messages: Vec<ChatMessage>,
}

impl<S: KeyValueStore> ChatSession<S> {
    /// Loads the log stored under `key`.
    ///
    /// A missing or malformed log starts a fresh conversation with a welcome message.
    pub async fn open(
        store: Arc<S>,
        responder: Arc<Responder>,
        key: impl Into<String>,
        typing_delay: Duration,
    ) -> Result<Self> {
        let key = key.into();
        let messages: Vec<ChatMessage> = storage::read_json_or_default(&*store, &key).await;
        debug!("Opened chat '{}' with {} message(s)", key, messages.len());

        let mut session = Self {
            store,
            responder,
            key,
            typing_delay,
            messages,
        };
        if session.messages.is_empty() {
            session.append(ChatMessage::welcome()).await?;
        }
        Ok(session)
    }

    /// Messages in the order they were appended.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The responder answering this session
    #[must_use]
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Sends a customer message and waits for the bot's reply.
    ///
    /// Blank input is ignored and returns `None`. The user message is persisted
    /// before the typing delay starts; dropping the returned future during the
    /// delay cancels only the reply.
    pub async fn send(&mut self, text: &str) -> Result<Option<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.append(ChatMessage::from_user(text)).await?;
        self.pause().await;

        let reply = self.responder.respond(text);
        debug!("Chat '{}' answered with {:?}", self.key, reply.matched);
        let message = ChatMessage::from_bot(reply.text, reply.suggestions);
        self.append(message.clone()).await?;
        Ok(Some(message))
    }

    /// Records that the customer picked the suggested topic `key`, and answers it.
    pub async fn choose_topic(&mut self, key: &str) -> Result<ChatMessage> {
        let title = self.responder.title_of(key).to_string();
        self.append(ChatMessage::from_user(title)).await?;
        self.pause().await;

        let reply = self.responder.respond_to_topic(key);
        let message = ChatMessage::from_bot(reply.text, reply.suggestions);
        self.append(message.clone()).await?;
        Ok(message)
    }

    /// Deletes the persisted log and starts over with a welcome message.
    pub async fn clear(&mut self) -> Result<()> {
        self.store.remove(&self.key).await?;
        self.messages.clear();
        self.append(ChatMessage::welcome()).await
    }

    async fn pause(&self) {
        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }
    }

    async fn append(&mut self, message: ChatMessage) -> Result<()> {
        self.messages.push(message);
        storage::write_json(&*self.store, &self.key, &self.messages).await
    }
}
