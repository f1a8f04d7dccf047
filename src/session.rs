//! In-memory chat transcript with named snapshots.
//!
//! Snapshots live only as long as the client process.

use crate::error::SessionError;
use crate::models::{ChatMessage, Sender};

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    saved: Vec<(String, Vec<ChatMessage>)>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(sender, text));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Snapshot the current transcript as `"Session N"` and return the name.
    pub fn save(&mut self) -> String {
        let name = format!("Session {}", self.saved.len() + 1);
        self.saved.push((name.clone(), self.messages.clone()));
        name
    }

    /// Replace the current transcript with a copy of a snapshot.
    pub fn load(&mut self, name: &str) -> Result<(), SessionError> {
        let (_, messages) = self
            .saved
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| SessionError::UnknownSession(name.to_string()))?;
        self.messages = messages.clone();
        Ok(())
    }

    pub fn saved_names(&self) -> Vec<&str> {
        self.saved.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Drop the current transcript. Snapshots are kept.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_restores_exact_sequence() {
        let mut session = ChatSession::new();
        session.push(Sender::User, "What is in the report?");
        session.push(Sender::Bot, "Quarterly numbers.");
        let before = session.messages().to_vec();

        let name = session.save();
        assert_eq!(name, "Session 1");

        session.push(Sender::User, "Something else");
        session.load("Session 1").unwrap();
        assert_eq!(session.messages(), before.as_slice());
    }

    #[test]
    fn test_names_follow_save_order() {
        let mut session = ChatSession::new();
        session.save();
        session.push(Sender::User, "hi");
        session.save();
        assert_eq!(session.saved_names(), vec!["Session 1", "Session 2"]);
    }

    #[test]
    fn test_clear_keeps_snapshots() {
        let mut session = ChatSession::new();
        session.push(Sender::User, "hi");
        session.save();
        session.clear();
        assert!(session.messages().is_empty());

        session.load("Session 1").unwrap();
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_unknown_session() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.load("Session 9"),
            Err(SessionError::UnknownSession("Session 9".to_string()))
        );
    }
}
