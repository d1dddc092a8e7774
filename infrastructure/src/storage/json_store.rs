//! Single-file JSON conversation store
//!
//! All conversations live in one pretty-printed JSON array at
//! `<data_dir>/conversations.json`, newest first.

use async_trait::async_trait;
use colloquy_application::ports::conversation_repository::{
    ConversationRepository, RepositoryError,
};
use colloquy_domain::Conversation;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub const CONVERSATIONS_FILE: &str = "conversations.json";

/// [`ConversationRepository`] backed by a JSON file.
///
/// Every operation reads (and, for writes, rewrites) the whole file while
/// holding the store's lock, so one instance never interleaves its own
/// updates. Separate instances on the same file are not coordinated.
#[derive(Debug)]
pub struct JsonFileConversationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileConversationStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(CONVERSATIONS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Conversation>, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, conversations: &[Conversation]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(conversations)?;

        // Write-then-rename: readers never see a half-written store.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            "Stored {} conversations at {}",
            conversations.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for JsonFileConversationStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut conversations = self.load().await?;

        match conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation.clone(),
            None => conversations.insert(0, conversation.clone()),
        }

        self.store(&conversations).await
    }

    async fn get(&self, id: &str) -> Result<Conversation, RepositoryError> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut conversations = self.load().await?;
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        self.store(&conversations).await
    }
}
