//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory holding `conversations.json` and transcripts.
    /// Defaults to `<platform data dir>/colloquy`.
    pub data_dir: Option<PathBuf>,
    /// Write a JSONL transcript per session under `<data_dir>/transcripts`.
    pub transcripts: bool,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            transcripts: true,
        }
    }
}

impl FileStorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("colloquy")
        })
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("transcripts")
    }
}
