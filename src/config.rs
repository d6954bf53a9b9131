use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "portal.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub name: String,
    pub address: String,
}

impl Default for Institution {
    fn default() -> Self {
        Self {
            name: "IGBOBI COLLEGE YABA".to_string(),
            address: "Igobobi College Road, Fadeyi, Lagos".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: String,
    pub password: String,
}

impl Default for AdminAccount {
    fn default() -> Self {
        Self {
            id: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalConfig {
    /// Ordered; ranking ties resolve in this order.
    pub roster: Vec<String>,
    pub student_password: String,
    pub admin: AdminAccount,
    pub institution: Institution,
    pub logo_file: String,
    /// `{id}` is replaced with the student identifier.
    pub photo_pattern: String,
    pub score_extensions: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            roster: ["Adams", "Bala", "Deji", "Ngozi"]
                .into_iter()
                .map(String::from)
                .collect(),
            student_password: "123456".to_string(),
            admin: AdminAccount::default(),
            institution: Institution::default(),
            logo_file: "ICY.png".to_string(),
            photo_pattern: "{id} Image.png".to_string(),
            score_extensions: ["xlsx", "xls", "ods", "csv"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    File,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Defaults => "defaults",
            ConfigSource::File => "file",
        }
    }
}

impl PortalConfig {
    pub fn logo_path(&self, workspace: &Path) -> Option<PathBuf> {
        existing(workspace.join(&self.logo_file))
    }

    pub fn photo_path(&self, workspace: &Path, student_id: &str) -> Option<PathBuf> {
        existing(workspace.join(self.photo_pattern.replace("{id}", student_id)))
    }
}

fn existing(p: PathBuf) -> Option<PathBuf> {
    p.is_file().then_some(p)
}

/// `portal.json` from the workspace, or the built-in defaults when absent.
pub fn load_for_workspace(workspace: &Path) -> anyhow::Result<(PortalConfig, ConfigSource)> {
    let path = workspace.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok((PortalConfig::default(), ConfigSource::Defaults));
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let cfg: PortalConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.to_string_lossy()))?;
    Ok((cfg, ConfigSource::File))
}
