use edbot_llm::Message;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One committed message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: TurnRole,
    text: String,
}

impl Turn {
    #[must_use]
    pub fn role(&self) -> TurnRole {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn to_message(&self) -> Message {
        match self.role {
            TurnRole::User => Message::user(self.text.clone()),
            TurnRole::Assistant => Message::assistant(self.text.clone()),
        }
    }
}

/// Append-only chronological history for one session.
#[derive(Debug, Clone)]
pub struct Conversation {
    greeting: Option<String>,
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation, seeded with an assistant `greeting` if given.
    #[must_use]
    pub fn new(greeting: Option<&str>) -> Self {
        let mut conversation = Self {
            greeting: greeting.map(str::to_owned),
            turns: Vec::new(),
        };
        conversation.reset();
        conversation
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Commit a completed user/assistant pair.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::User,
            text: user.into(),
        });
        self.turns.push(Turn {
            role: TurnRole::Assistant,
            text: assistant.into(),
        });
    }

    /// Discard every turn and restore the initial greeting.
    pub fn reset(&mut self) {
        self.turns.clear();
        if let Some(greeting) = &self.greeting {
            self.turns.push(Turn {
                role: TurnRole::Assistant,
                text: greeting.clone(),
            });
        }
    }

    /// History as model messages, oldest first.
    #[must_use]
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(Turn::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use edbot_llm::Role;

    use super::*;

    #[test]
    fn plain_conversation_starts_empty() {
        let c = Conversation::new(None);
        assert!(c.is_empty());
    }

    #[test]
    fn greeting_is_first_turn() {
        let c = Conversation::new(Some("Hello!"));
        assert_eq!(c.len(), 1);
        assert_eq!(c.turns()[0].role(), TurnRole::Assistant);
        assert_eq!(c.turns()[0].text(), "Hello!");
    }

    #[test]
    fn exchanges_alternate_in_order() {
        let mut c = Conversation::new(Some("Hello!"));
        c.push_exchange("q1", "a1");
        c.push_exchange("q2", "a2");
        let texts: Vec<&str> = c.turns().iter().map(Turn::text).collect();
        assert_eq!(texts, ["Hello!", "q1", "a1", "q2", "a2"]);

        let roles: Vec<Role> = c.to_messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn reset_restores_greeting_only() {
        let mut c = Conversation::new(Some("Hello!"));
        c.push_exchange("q1", "a1");
        c.reset();
        assert_eq!(c.len(), 1);
        assert!(c.turns().iter().all(|t| t.role() == TurnRole::Assistant));

        let mut plain = Conversation::new(None);
        plain.push_exchange("q1", "a1");
        plain.reset();
        assert!(plain.is_empty());
    }
}
