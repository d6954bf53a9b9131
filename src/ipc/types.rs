use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::{CredentialStore, StaticCredentials};
use crate::config::{self, ConfigSource, PortalConfig};
use crate::scores::ScoreDir;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub config: PortalConfig,
    pub credentials: Box<dyn CredentialStore>,
}

impl AppState {
    pub fn new() -> Self {
        let config = PortalConfig::default();
        let credentials = Box::new(StaticCredentials::from_config(&config));
        Self {
            workspace: None,
            config,
            credentials,
        }
    }

    /// Points the portal at a data directory and reloads its `portal.json`.
    /// On error the previous workspace stays active.
    pub fn select_workspace(&mut self, path: &Path) -> anyhow::Result<ConfigSource> {
        if !path.is_dir() {
            anyhow::bail!("workspace is not a directory: {}", path.to_string_lossy());
        }
        let (cfg, source) = config::load_for_workspace(path)?;
        self.credentials = Box::new(StaticCredentials::from_config(&cfg));
        self.config = cfg;
        self.workspace = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn score_dir(&self) -> Option<ScoreDir> {
        self.workspace
            .as_ref()
            .map(|w| ScoreDir::new(w.clone(), self.config.score_extensions.clone()))
    }
}
