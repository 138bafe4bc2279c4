//! Per-browser conversation sessions
//!
//! Each session owns one append-only [`Conversation`] whose first message is
//! always the persona's system prompt, plus an optional TOPIK level. Sessions
//! live in an in-memory TTL cache and disappear once idle past the TTL; there
//! is no other deletion path.
//!
//! Every operation is a read-modify-write of the whole session. Concurrent
//! requests on the same session are not serialized, so the last write wins.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{Message, Role};
use crate::persona::Persona;
use crate::{Error, Result};

/// Opaque identifier carried in the browser's session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied identifier if it is well formed
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(|id| Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// TOPIK proficiency level, 1 through 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct TopikLevel(u8);

impl TopikLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// Validate a level
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the level is outside 1..=6
    pub fn new(value: i64) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "TOPIK level must be between {} and {}, got {value}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TopikLevel {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TopikLevel> for u8 {
    fn from(level: TopikLevel) -> Self {
        level.0
    }
}

impl fmt::Display for TopikLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chronological, append-only list of messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Conversation holding only the persona's system message
    fn seeded(persona: &Persona) -> Self {
        Self {
            messages: vec![Message::system(persona.system_prompt.clone())],
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Conversation state for one browser
#[derive(Debug, Clone)]
pub struct Session {
    pub conversation: Conversation,
    pub level: Option<TopikLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(persona: &Persona) -> Self {
        let now = Utc::now();
        Self {
            conversation: Conversation::seeded(persona),
            level: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Messages as sent to the model
    ///
    /// With a level on record, the level prompt is placed right after the
    /// leading system message. It is never stored in the conversation.
    #[must_use]
    pub fn request_messages(&self, persona: &Persona) -> Vec<Message> {
        let mut messages = self.conversation.messages().to_vec();
        if let Some(level) = self.level {
            let at = usize::from(messages.first().is_some_and(|m| m.role == Role::System));
            messages.insert(at, Message::system(persona.level_prompt(level)));
        }
        messages
    }
}

/// Session store tuning
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Idle time after which a session is dropped
    pub idle_ttl: Duration,
    /// Maximum number of live sessions; past this the cache evicts
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(31 * 24 * 60 * 60),
            max_sessions: 10_000,
        }
    }
}

/// Thread-safe map from session identifier to session state
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<SessionId, Session>,
    persona: Arc<Persona>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new(persona: Arc<Persona>, config: SessionConfig) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(config.max_sessions)
                .time_to_idle(config.idle_ttl)
                .build(),
            persona,
        }
    }

    /// Persona used to seed and render conversations
    #[must_use]
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Current state of a session, if it exists
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id)
    }

    fn load(&self, id: &SessionId) -> Session {
        self.sessions
            .get(id)
            .unwrap_or_else(|| Session::new(&self.persona))
    }

    fn save(&self, id: &SessionId, mut session: Session) {
        session.touch();
        self.sessions.insert(id.clone(), session);
    }

    /// Reset the conversation to the system prompt plus the opening turn
    ///
    /// Clears any recorded level. Returns the messages to send to the model.
    pub fn start(&self, id: &SessionId) -> Vec<Message> {
        let mut session = self.load(id);
        session.conversation = Conversation::seeded(&self.persona);
        session.conversation.push(Message::user(self.persona.opening_message.clone()));
        session.level = None;

        let request = session.request_messages(&self.persona);
        self.save(id, session);
        tracing::debug!(session = %id, "conversation reset");
        request
    }

    /// Record a level and append the level-confirmation turn
    ///
    /// Returns the messages to send to the model, level prompt included.
    pub fn set_level(&self, id: &SessionId, level: TopikLevel) -> Vec<Message> {
        let mut session = self.load(id);
        session.level = Some(level);
        session
            .conversation
            .push(Message::user(self.persona.level_confirmation(level)));

        let request = session.request_messages(&self.persona);
        self.save(id, session);
        tracing::debug!(session = %id, level = level.get(), "level recorded");
        request
    }

    /// Append a learner turn
    ///
    /// Only the single most recent stored message is compared; an identical
    /// message separated by any other turn is accepted.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTurn` if the previous message is the same user text
    pub fn append_user_turn(&self, id: &SessionId, text: &str) -> Result<Vec<Message>> {
        let mut session = self.load(id);
        if session
            .conversation
            .last()
            .is_some_and(|m| m.role == Role::User && m.content == text)
        {
            return Err(Error::DuplicateTurn);
        }
        session.conversation.push(Message::user(text));

        let request = session.request_messages(&self.persona);
        self.save(id, session);
        Ok(request)
    }

    /// Append a tutor reply
    pub fn append_assistant_turn(&self, id: &SessionId, text: &str) {
        let mut session = self.load(id);
        session.conversation.push(Message::assistant(text));
        self.save(id, session);
    }

    /// Number of live sessions (approximate until pending tasks run)
    #[must_use]
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
