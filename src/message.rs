//! Chat transcript types.
//!
//! The history is append-only and chronologically ordered. It is replayed
//! into every SQL-generation prompt, so order and speaker attribution matter.

use std::fmt;

/// Greeting every new session starts with.
pub const GREETING: &str = "Hello! I'm a MySQL assistant. Ask me anything about your database.";

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Ai,
}

impl Role {
    /// Speaker label used when history is replayed into a prompt.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Role::Human => "User",
            Role::Ai => "AI",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => write!(f, "Human"),
            Role::Ai => write!(f, "AI"),
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only chat history.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    /// Empty history, without the greeting.
    pub fn new() -> Self {
        Self::default()
    }

    /// History seeded with the assistant greeting.
    pub fn with_greeting() -> Self {
        let mut history = Self::new();
        history.push(Message::ai(GREETING));
        history
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// One `Label: content` line per message, oldest first.
    pub fn render_for_prompt(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.prompt_label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
