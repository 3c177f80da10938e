//! Physical key-value backings behind the credential store.
//!
//! [`CookieJar`] mirrors browser cookies: every value carries an expiry and
//! reads past it behave as if the key were never written. [`LocalStore`]
//! mirrors local storage: values live until removed. Both can be file-backed
//! (one JSON document rewritten on every change) or purely in-memory.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Minimal key-value contract shared by both backings.
pub trait Backing: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Cookie-like backing where each value expires `ttl` after it is written.
#[derive(Debug)]
pub struct CookieJar {
    entries: DashMap<String, CookieEntry>,
    ttl: Duration,
    path: Option<PathBuf>,
}

impl CookieJar {
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            path: None,
        }
    }

    /// Open (or create on first write) a jar persisted at `path`.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let path = path.into();
        let entries = DashMap::new();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if !raw.trim().is_empty() {
                let stored: BTreeMap<String, CookieEntry> = serde_json::from_str(&raw)?;
                for (key, entry) in stored {
                    entries.insert(key, entry);
                }
            }
        }
        Ok(Self {
            entries,
            ttl,
            path: Some(path),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write a value with an explicit expiry instead of the jar's TTL.
    pub fn set_expiring(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CookieEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        self.flush()
    }

    /// Expiry of a live value.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(key)
            .map(|e| e.expires_at)
            .filter(|at| *at > Utc::now())
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let now = Utc::now();
        let snapshot: BTreeMap<String, CookieEntry> = self
            .entries
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        write_json(path, &snapshot)
    }
}

impl Backing for CookieJar {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // Only drop the value that was seen expired; a concurrent `set` wins.
        if self
            .entries
            .remove_if(key, |_, e| e.expires_at <= now)
            .is_some()
        {
            tracing::debug!(key, "Dropping expired cookie");
        }
        None
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_expiring(key, value, Utc::now() + self.ttl)
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Local-storage-like backing without expiry.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: DashMap<String, String>,
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = DashMap::new();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if !raw.trim().is_empty() {
                let stored: BTreeMap<String, String> = serde_json::from_str(&raw)?;
                for (key, value) in stored {
                    entries.insert(key, value);
                }
            }
        }
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        write_json(path, &snapshot)
    }
}

impl Backing for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
