//! Username/password accounts for the terminal client.
//!
//! Passwords are stored as unsalted SHA-256 hex digests in a flat JSON map.
//! This gates the chat commands; it is not a security boundary.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuthError;

/// Narrow persistence interface for credentials.
pub trait UserStore: Send + Sync {
    fn get(&self, username: &str) -> Result<Option<String>>;
    fn put(&self, username: &str, password_hash: &str) -> Result<()>;

    fn contains(&self, username: &str) -> Result<bool> {
        Ok(self.get(username)?.is_some())
    }
}

/// Hex-encoded SHA-256 of the password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Credentials kept in a single JSON object: `{"username": "<sha256 hex>"}`.
///
/// A missing file is an empty store. Every `put` rewrites the whole file via
/// a temp file and rename.
pub struct JsonFileUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse user store: {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read user store: {}", self.path.display())),
        }
    }

    fn write_all(&self, users: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(users)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        std::fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl UserStore for JsonFileUserStore {
    fn get(&self, username: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(self.read_all()?.remove(username))
    }

    fn put(&self, username: &str, password_hash: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        let mut users = self.read_all()?;
        users.insert(username.to_string(), password_hash.to_string());
        self.write_all(&users)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<String, String>>,
}

impl UserStore for MemoryUserStore {
    fn get(&self, username: &str) -> Result<Option<String>> {
        let users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(users.get(username).cloned())
    }

    fn put(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        users.insert(username.to_string(), password_hash.to_string());
        Ok(())
    }
}

pub struct Authenticator<S> {
    store: S,
}

impl<S: UserStore> Authenticator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new account. On success the caller is logged in.
    pub fn sign_up(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.store.contains(username)? {
            return Err(AuthError::UsernameTaken);
        }
        self.store.put(username, &hash_password(password))?;
        tracing::info!(username, "account created");
        Ok(())
    }

    /// Unknown users and wrong passwords fail the same way.
    pub fn log_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        match self.store.get(username)? {
            Some(stored) if stored == hash_password(password) => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}
