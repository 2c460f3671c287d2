// Configuration files for the sync engine.
//
// Global settings: `<base>/config.toml`
// Sync document:   `<repo>/sync-config.json`, shape `{ "gitConfig": { ... } }`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skillsync_common::types::GitIdentity;
use tracing::warn;

use crate::git::worker::DEFAULT_GIT_PROGRAM;
use crate::security::{ensure_owner_only_dir, ensure_owner_only_file};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Auto-sync commit";
const DEFAULT_MIN_INTERVAL_SEC: u64 = 30;
const MIN_MIN_INTERVAL_SEC: u64 = 5;
const DEFAULT_TICK_INTERVAL_SEC: u64 = 60;

// ── Global settings ────────────────────────────────────────────────

/// Process-wide settings at `<base>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Repository root override (defaults to `<base>/repo`).
    pub repo_dir: Option<PathBuf>,
    /// Git binary to invoke.
    pub git_program: String,
    /// Message used for automatic commits.
    pub commit_message: String,
    /// Background sync policy.
    pub scheduler: SchedulerConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            repo_dir: None,
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load from the resolved base directory. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        crate::paths::global_config_path()
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::ParseToml)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Cool-down and tick settings for automatic sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum seconds between automatic sync cycles.
    pub min_interval_sec: u64,
    /// How often the standalone daemon asks for a sync.
    pub tick_interval_sec: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_sec: DEFAULT_MIN_INTERVAL_SEC,
            tick_interval_sec: DEFAULT_TICK_INTERVAL_SEC,
        }
    }
}

impl SchedulerConfig {
    /// Cool-down, never shorter than 5 seconds.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_sec.max(MIN_MIN_INTERVAL_SEC))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_sec.max(1))
    }
}

// ── Sync document ──────────────────────────────────────────────────

/// Remotes and identity for the sync repository. `remote_urls[0]`, when
/// present, is the canonical remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub identity: GitIdentity,
    pub remote_urls: Vec<String>,
}

impl RepositoryConfig {
    pub fn canonical_url(&self) -> Option<&str> {
        self.remote_urls.first().map(String::as_str)
    }
}

/// On-disk form of the sync document. Unknown top-level keys survive a
/// load/save cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncDocument {
    #[serde(rename = "gitConfig", default)]
    pub git_config: GitConfigSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitConfigSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Legacy single remote; read only.
    #[serde(default, skip_serializing)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote_urls: Vec<String>,
}

impl From<GitConfigSection> for RepositoryConfig {
    fn from(section: GitConfigSection) -> Self {
        let mut remote_urls: Vec<String> = section
            .remote_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if remote_urls.is_empty() {
            if let Some(legacy) = section.remote_url.map(|url| url.trim().to_string()) {
                if !legacy.is_empty() {
                    remote_urls.push(legacy);
                }
            }
        }

        Self {
            identity: GitIdentity {
                user_name: non_blank(section.user_name),
                user_email: non_blank(section.user_email),
            },
            remote_urls,
        }
    }
}

impl From<&RepositoryConfig> for GitConfigSection {
    fn from(config: &RepositoryConfig) -> Self {
        Self {
            user_name: config.identity.user_name.clone(),
            user_email: config.identity.user_email.clone(),
            remote_url: None,
            remote_urls: config.remote_urls.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads and writes the sync document.
#[derive(Debug, Clone)]
pub struct SyncConfigStore {
    path: PathBuf,
}

impl SyncConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load: missing or malformed files are errors.
    pub fn load(&self) -> Result<RepositoryConfig, ConfigError> {
        self.load_document().map(|doc| doc.git_config.into())
    }

    /// Fail-soft load: any error yields an empty config.
    pub fn get_config(&self) -> RepositoryConfig {
        match self.load() {
            Ok(config) => config,
            Err(error) => {
                if !error.is_not_found() {
                    warn!(path = %self.path.display(), %error, "ignoring unreadable sync config");
                }
                RepositoryConfig::default()
            }
        }
    }

    /// Write `config`, keeping any unrelated keys already in the document.
    pub fn save(&self, config: &RepositoryConfig) -> Result<(), ConfigError> {
        let mut document = self.load_document().unwrap_or_default();
        document.git_config = config.into();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
            ensure_owner_only_dir(parent)
                .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))?;
        }
        let mut contents = serde_json::to_string_pretty(&document)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        contents.push('\n');
        std::fs::write(&self.path, contents).map_err(ConfigError::Io).and_then(|_| {
            ensure_owner_only_file(&self.path)
                .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))
        })
    }

    /// Write a default document if none exists. Returns true if one was created.
    pub fn ensure_exists(&self) -> Result<bool, ConfigError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&RepositoryConfig::default())?;
        Ok(true)
    }

    fn load_document(&self) -> Result<SyncDocument, ConfigError> {
        let contents = std::fs::read_to_string(&self.path).map_err(ConfigError::Io)?;
        serde_json::from_str(&contents).map_err(ConfigError::Parse)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    ParseToml(toml::de::Error),
    Serialize(String),
}

impl ConfigError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::ParseToml(e) => write!(f, "settings parse error: {e}"),
            Self::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SyncConfigStore {
        SyncConfigStore::new(dir.path().join("repo").join("sync-config.json"))
    }

    // ── Sync document ──────────────────────────────────────────────

    #[test]
    fn missing_document_fails_soft() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.load().unwrap_err().is_not_found());
        assert_eq!(store.get_config(), RepositoryConfig::default());
    }

    #[test]
    fn malformed_document_fails_soft() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
        assert!(store.get_config().remote_urls.is_empty());
    }

    #[test]
    fn legacy_remote_url_is_folded_into_list() {
        let section: GitConfigSection =
            serde_json::from_str(r#"{"remoteUrl": "git@example.com:me/skills.git"}"#).unwrap();
        let config = RepositoryConfig::from(section);
        assert_eq!(config.remote_urls, vec!["git@example.com:me/skills.git"]);
    }

    #[test]
    fn legacy_remote_url_ignored_when_list_present() {
        let section: GitConfigSection = serde_json::from_str(
            r#"{"remoteUrl": "https://old.example.com/x.git", "remoteUrls": ["https://new.example.com/x.git"]}"#,
        )
        .unwrap();
        let config = RepositoryConfig::from(section);
        assert_eq!(config.remote_urls, vec!["https://new.example.com/x.git"]);
    }

    #[test]
    fn blank_entries_are_dropped() {
        let section: GitConfigSection = serde_json::from_str(
            r#"{"userName": "  ", "remoteUrls": ["", " https://a.example.com/x.git "]}"#,
        )
        .unwrap();
        let config = RepositoryConfig::from(section);
        assert_eq!(config.remote_urls, vec!["https://a.example.com/x.git"]);
        assert!(config.identity.user_name.is_none());
    }

    #[test]
    fn save_then_load_preserves_config_and_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"gitConfig": {"remoteUrl": "https://legacy.example.com/x.git"}, "proxy": {"port": 8080}}"#,
        )
        .unwrap();

        let config = RepositoryConfig {
            identity: GitIdentity {
                user_name: Some("Ada".into()),
                user_email: Some("ada@example.com".into()),
            },
            remote_urls: vec![
                "https://a.example.com/x.git".into(),
                "https://b.example.com/x.git".into(),
            ],
        };
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap())
            .unwrap();
        assert_eq!(raw["proxy"]["port"], 8080);
        assert!(raw["gitConfig"].get("remoteUrl").is_none());
        assert_eq!(raw["gitConfig"]["userEmail"], "ada@example.com");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = SyncConfigStore::new(dir.path().join("deep").join("nested").join("c.json"));

        store.save(&RepositoryConfig::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn ensure_exists_only_writes_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.ensure_exists().unwrap());
        assert!(!store.ensure_exists().unwrap());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"gitConfig\""));
    }

    // ── Global settings ────────────────────────────────────────────

    #[test]
    fn global_config_defaults() {
        let cfg = GlobalConfig::default();
        assert!(cfg.repo_dir.is_none());
        assert_eq!(cfg.git_program, "git");
        assert_eq!(cfg.commit_message, "Auto-sync commit");
        assert_eq!(cfg.scheduler.min_interval(), Duration::from_secs(30));
    }

    #[test]
    fn global_config_partial_toml_uses_defaults() {
        let cfg: GlobalConfig = toml::from_str(
            r#"
git_program = "/usr/local/bin/git"

[scheduler]
tick_interval_sec = 300
"#,
        )
        .unwrap();
        assert_eq!(cfg.git_program, "/usr/local/bin/git");
        assert_eq!(cfg.scheduler.tick_interval(), Duration::from_secs(300));
        assert_eq!(cfg.scheduler.min_interval_sec, 30);
    }

    #[test]
    fn min_interval_has_a_floor() {
        let cfg = SchedulerConfig { min_interval_sec: 1, tick_interval_sec: 0 };
        assert_eq!(cfg.min_interval(), Duration::from_secs(5));
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn global_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = GlobalConfig {
            repo_dir: Some(PathBuf::from("/data/sync")),
            commit_message: "sync: laptop".into(),
            ..GlobalConfig::default()
        };

        cfg.save_to(&path).unwrap();
        assert_eq!(GlobalConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn global_config_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(GlobalConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
