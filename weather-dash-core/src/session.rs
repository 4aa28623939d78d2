//! Single bearer-token session storage.
//!
//! The session is one value stored under the `token` key. Presence of that
//! value is the only authentication signal; there is no expiry tracking.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use parking_lot::RwLock;

/// Key of the single persisted entry.
pub const TOKEN_KEY: &str = "token";

pub trait SessionStore: Send + Sync + Debug {
    /// Store `token`, replacing any previous one.
    fn set(&self, token: &str);
    fn clear(&self);
    fn get(&self) -> Option<String>;

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

/// Shared handle passed to every client that reads or writes the session.
pub type SharedSession = Arc<dyn SessionStore>;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }
}

impl SessionStore for MemorySessionStore {
    fn set(&self, token: &str) {
        *self.token.write() = Some(token.to_owned());
    }

    fn clear(&self) {
        *self.token.write() = None;
    }

    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }
}

/// Token persisted as `{"token": "..."}` in a JSON file.
///
/// The in-memory copy is authoritative for the running process; a failed
/// write is logged and the process keeps its session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing or unreadable file means "no session".
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = match read_token(&path) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable session file");
                None
            }
        };
        Self { path, token: RwLock::new(token) }
    }

    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dash", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, token: Option<&str>) -> Result<()> {
        match token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create session directory: {}", parent.display())
                    })?;
                }
                let entry = BTreeMap::from([(TOKEN_KEY, token)]);
                let json = serde_json::to_string(&entry).context("Failed to serialize session")?;
                fs::write(&self.path, json).with_context(|| {
                    format!("Failed to write session file: {}", self.path.display())
                })
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path).with_context(|| {
                        format!("Failed to remove session file: {}", self.path.display())
                    })?;
                }
                Ok(())
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn set(&self, token: &str) {
        let mut guard = self.token.write();
        *guard = Some(token.to_owned());
        if let Err(err) = self.persist(Some(token)) {
            tracing::warn!(error = %err, "session kept in memory only");
        }
    }

    fn clear(&self) {
        let mut guard = self.token.write();
        *guard = None;
        if let Err(err) = self.persist(None) {
            tracing::warn!(error = %err, "stale session file left on disk");
        }
    }

    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }
}

fn read_token(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let mut entry: BTreeMap<String, String> =
        serde_json::from_str(&contents).context("Failed to parse session file")?;

    Ok(entry.remove(TOKEN_KEY).filter(|t| !t.is_empty()))
}
