//! Session and theme state behind an injected key-value store.
//!
//! [`SessionContext`] owns the signed-in user and the colour theme and
//! persists both through whatever [`KeyValueStore`] it is handed, so there
//! is no process-wide session state.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Store key for the persisted auth state.
pub const AUTH_KEY: &str = "auth-storage";

/// Store key for the persisted theme.
pub const THEME_KEY: &str = "theme-storage";

// =============================================================================
// Key-value stores
// =============================================================================

/// Persistence for small JSON documents keyed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory store, for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` for storage; it is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(&value)?)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

// =============================================================================
// Session state
// =============================================================================

/// A signed-in dashboard user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: String,
}

/// Colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedAuth {
    user: Option<User>,
    is_authenticated: bool,
    #[serde(default)]
    signed_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTheme {
    is_dark_mode: bool,
}

/// Snapshot of the session, as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub signed_in_at: Option<DateTime<Utc>>,
    pub theme: Theme,
}

/// Session and theme state persisted through an injected store.
#[derive(Debug)]
pub struct SessionContext<S: KeyValueStore> {
    store: S,
    user: Option<User>,
    signed_in_at: Option<DateTime<Utc>>,
    theme: Theme,
}

impl<S: KeyValueStore> SessionContext<S> {
    /// Rehydrate from the store. Missing or unreadable entries fall back to
    /// a signed-out, light-theme session.
    pub fn load(store: S) -> StoreResult<Self> {
        let auth: PersistedAuth = read_or_default(&store, AUTH_KEY)?;
        let theme: PersistedTheme = read_or_default(&store, THEME_KEY)?;

        // a user without the authenticated flag is treated as signed out
        let (user, signed_in_at) = match auth.user {
            Some(user) if auth.is_authenticated => (Some(user), auth.signed_in_at),
            _ => (None, None),
        };

        Ok(Self {
            store,
            user,
            signed_in_at,
            theme: if theme.is_dark_mode { Theme::Dark } else { Theme::Light },
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            user: self.user.clone(),
            is_authenticated: self.is_authenticated(),
            signed_in_at: self.signed_in_at,
            theme: self.theme,
        }
    }

    pub fn sign_in(&mut self, user: User) -> StoreResult<()> {
        self.user = Some(user);
        self.signed_in_at = Some(Utc::now());
        self.save_auth()
    }

    pub fn sign_out(&mut self) -> StoreResult<()> {
        self.user = None;
        self.signed_in_at = None;
        self.store.remove(AUTH_KEY)
    }

    pub fn set_theme(&mut self, theme: Theme) -> StoreResult<()> {
        self.theme = theme;
        let persisted = PersistedTheme {
            is_dark_mode: theme == Theme::Dark,
        };
        self.store.set(THEME_KEY, serde_json::to_value(persisted)?)
    }

    pub fn toggle_theme(&mut self) -> StoreResult<Theme> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Hand the store back, e.g. to reload it elsewhere.
    pub fn into_store(self) -> S {
        self.store
    }

    fn save_auth(&mut self) -> StoreResult<()> {
        let persisted = PersistedAuth {
            user: self.user.clone(),
            is_authenticated: self.user.is_some(),
            signed_in_at: self.signed_in_at,
        };
        self.store.set(AUTH_KEY, serde_json::to_value(persisted)?)
    }
}

fn read_or_default<S, T>(store: &S, key: &str) -> StoreResult<T>
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    match store.get(key)? {
        Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
        None => Ok(T::default()),
    }
}
