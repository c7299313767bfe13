use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::WatermarkState;
use crate::errors::{BotError, BotResult};
use crate::storage::traits::WatermarkStore;

/// Watermark state kept as a single JSON document on disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, state: &WatermarkState) -> BotResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;

        // Write beside the target and rename so a crash never leaves half a file
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl WatermarkStore for JsonFileStore {
    fn load(&self) -> WatermarkState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting fresh");
                return WatermarkState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read state file, starting fresh");
                return WatermarkState::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file is not valid, starting fresh");
                WatermarkState::default()
            }
        }
    }

    fn save(&self, state: &WatermarkState) -> BotResult<()> {
        self.write(state)
            .map_err(|e| BotError::Persist(format!("{}: {}", self.path.display(), e)))
    }
}
