use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::domain::Session;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::warn;
use url::Url;

/// Key under which the serialized session record lives.
pub const SESSION_KEY: &str = "skripts.auth.session";

/// Durable string key-value storage scoped to one origin.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// A JSON object on disk. Every write replaces the file through a temp file + rename.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store for the origin of `api_url` under `data_dir/sessions`.
    pub fn for_origin(data_dir: &Path, api_url: &Url) -> Self {
        Self::new(data_dir.join("sessions").join(origin_file_name(api_url)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read '{}'", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed key-value file '{}'", self.path.display()))
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err)
                    .with_context(|| format!("failed to remove '{}'", self.path.display())),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory '{}'", parent.display())
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, body).with_context(|| format!("failed to write '{}'", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace '{}'", self.path.display()))?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.load()?;
        apply(&mut entries);
        self.persist(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// File name for the per-origin store, e.g. `api.example.com_443.json`.
pub fn origin_file_name(api_url: &Url) -> String {
    let host = api_url
        .host_str()
        .unwrap_or("local")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect::<String>();
    match api_url.port_or_known_default() {
        Some(port) => format!("{host}_{port}.json"),
        None => format!("{host}.json"),
    }
}

/// Session persistence over an optional durable store.
///
/// Without a store every operation is a no-op and `read` reports no session.
#[derive(Clone, Default)]
pub struct SessionStore {
    backend: Option<Arc<dyn KeyValueStore>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn detached() -> Self {
        Self { backend: None }
    }

    pub fn is_durable(&self) -> bool {
        self.backend.is_some()
    }

    pub fn read(&self) -> Option<Session> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(%error, "session store: read failed");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(error) => {
                warn!(%error, "session store: ignoring malformed session record");
                None
            }
        }
    }

    pub fn write(&self, session: &Session) {
        let Some(backend) = &self.backend else {
            return;
        };
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "session store: failed to encode session");
                return;
            }
        };
        if let Err(error) = backend.set(SESSION_KEY, &raw) {
            warn!(%error, "session store: write failed");
        }
    }

    pub fn clear(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(error) = backend.remove(SESSION_KEY) {
            warn!(%error, "session store: clear failed");
        }
    }

    /// The session if one exists and has not expired at `now`. Expired records are removed.
    pub fn current(&self, now: DateTime<Utc>) -> Option<Session> {
        let session = self.read()?;
        if session.is_expired(now) {
            self.clear();
            return None;
        }
        Some(session)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
