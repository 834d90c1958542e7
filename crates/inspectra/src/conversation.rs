//! JSON-file persistence for conversations.
//!
//! One file per conversation under `conversations/`. Files are rewritten
//! whole on each save; concurrent writers to the same id race and the last
//! writer wins.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::types::{ChatMessage, Conversation, SpecialistType};

pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create conversations dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", conversation_id))
    }

    pub fn new_conversation_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn exists(&self, conversation_id: &str) -> bool {
        self.path_for(conversation_id).exists()
    }

    pub fn load(&self, conversation_id: &str) -> Result<Conversation> {
        let path = self.path_for(conversation_id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Conversation {} not found", conversation_id))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse conversation file {}", path.display()))
    }

    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        let path = self.path_for(&conversation.conversation_id);
        let json = serde_json::to_string_pretty(conversation)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write conversation file {}", path.display()))?;
        Ok(())
    }

    /// Load the conversation or start a fresh one with the given identity.
    pub fn load_or_create(
        &self,
        conversation_id: &str,
        specialist: SpecialistType,
        user_email: &str,
        user_name: Option<&str>,
    ) -> Result<Conversation> {
        if self.exists(conversation_id) {
            self.load(conversation_id)
        } else {
            Ok(Conversation::new(
                conversation_id.to_string(),
                specialist,
                user_email.to_string(),
                user_name.map(str::to_string),
            ))
        }
    }

    /// Append a message and persist immediately.
    pub fn append(&self, conversation: &mut Conversation, message: ChatMessage) -> Result<()> {
        conversation.push(message);
        self.save(conversation)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use tempfile::TempDir;

    #[test]
    fn save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = ConversationStore::new(tmp.path().join("conversations")).unwrap();

        let id = ConversationStore::new_conversation_id();
        let mut conversation = store
            .load_or_create(&id, SpecialistType::SubseaEngineer, "a.b@example.com", None)
            .unwrap();
        store
            .append(
                &mut conversation,
                ChatMessage::now(MessageRole::User, "Flange seal question"),
            )
            .unwrap();

        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded.message_count, 1);
        assert_eq!(loaded.specialist_type, SpecialistType::SubseaEngineer);
        assert_eq!(loaded.messages[0].content, "Flange seal question");
    }

    #[test]
    fn missing_conversation_errors() {
        let tmp = TempDir::new().unwrap();
        let store = ConversationStore::new(tmp.path()).unwrap();
        assert!(store.load("no-such-id").is_err());
    }

    #[test]
    fn load_or_create_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let store = ConversationStore::new(tmp.path()).unwrap();
        let conversation = store
            .load_or_create(
                "fresh",
                SpecialistType::DisciplineHead,
                "x@example.com",
                Some("X"),
            )
            .unwrap();
        assert!(conversation.messages.is_empty());
        assert!(!store.exists("fresh"));
    }
}
