use crate::session::SessionContainer;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// JSON file holding one client's session container between CLI invocations
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the container; a missing file is an empty session
    pub async fn load(&self) -> Result<SessionContainer> {
        if !async_fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("Session file {:?} does not exist yet", self.path);
            return Ok(SessionContainer::new());
        }

        let content = async_fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read session file {:?}", self.path))?;
        if content.trim().is_empty() {
            return Ok(SessionContainer::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Session file {:?} is not valid JSON", self.path))
    }

    /// Write the container atomically (temp file + rename)
    pub async fn save(&self, container: &SessionContainer) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            async_fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(container).context("Failed to encode session")?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = async_fs::File::create(&temp_path)
            .await
            .with_context(|| format!("Failed to create {:?}", temp_path))?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write session data")?;
        file.sync_all().await.context("Failed to sync session data")?;
        drop(file);

        async_fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to move session file into place at {:?}", self.path))?;

        debug!("Saved session file {:?} ({} bytes)", self.path, json.len());
        Ok(())
    }
}
