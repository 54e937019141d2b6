use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use vs_core::ResultCache;

use crate::error::{Result, StoreError};
use crate::schema;

/// Current UTC time as Unix seconds.
pub fn now_unix_secs() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Persistent result cache. An entry is live while its age is under the TTL.
pub struct Store {
    conn: Connection,
    ttl_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub fresh: u64,
    pub expired: u64,
    pub ttl_secs: Option<u64>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidData(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::debug!(path = %path.display(), "opened cache store");
        Ok(Self {
            conn,
            ttl_secs: None,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            ttl_secs: None,
        })
    }

    /// Entries expire `ttl_secs` after they were written. `0` disables expiry.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = (ttl_secs > 0).then_some(ttl_secs);
        self
    }

    // --- Cache entries ---

    fn cutoff(&self, now: i64) -> Option<i64> {
        self.ttl_secs
            .map(|ttl| now.saturating_sub(i64::try_from(ttl).unwrap_or(i64::MAX)))
    }

    /// Read an entry as of `now`.
    pub fn get_at(&self, key: &str, now: i64) -> Result<Option<String>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, created_at FROM cache_entries WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((value, created_at)) = row else {
            return Ok(None);
        };
        match self.cutoff(now) {
            Some(cutoff) if created_at <= cutoff => {
                tracing::debug!(key, created_at, "cache entry expired");
                Ok(None)
            }
            _ => Ok(Some(value)),
        }
    }

    pub fn put_at(&self, key: &str, value: &str, now: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, created_at) VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.stats_at(now_unix_secs())
    }

    pub fn stats_at(&self, now: i64) -> Result<CacheStats> {
        let entries: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        let expired: i64 = match self.cutoff(now) {
            Some(cutoff) => self.conn.query_row(
                "SELECT COUNT(*) FROM cache_entries WHERE created_at <= ?1",
                [cutoff],
                |row| row.get(0),
            )?,
            None => 0,
        };
        let entries = u64::try_from(entries).unwrap_or(0);
        let expired = u64::try_from(expired).unwrap_or(0);
        Ok(CacheStats {
            entries,
            fresh: entries.saturating_sub(expired),
            expired,
            ttl_secs: self.ttl_secs,
        })
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM cache_entries", [])?;
        tracing::info!(removed, "cleared result cache");
        Ok(removed)
    }

    pub fn purge(&self) -> Result<usize> {
        self.purge_expired(now_unix_secs())
    }

    /// Remove entries that have outlived the TTL as of `now`.
    pub fn purge_expired(&self, now: i64) -> Result<usize> {
        let Some(cutoff) = self.cutoff(now) else {
            return Ok(0);
        };
        let removed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE created_at <= ?1", [cutoff])?;
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        Ok(removed)
    }
}

impl ResultCache for Store {
    fn get(&self, key: &str) -> Option<String> {
        match self.get_at(key, now_unix_secs()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    /// Writes also sweep entries that have outlived the TTL.
    fn put(&mut self, key: &str, value: &str) {
        let now = now_unix_secs();
        if let Err(e) = self.put_at(key, value, now) {
            tracing::warn!("cache write failed: {e}");
        }
        if let Err(e) = self.purge_expired(now) {
            tracing::warn!("cache purge failed: {e}");
        }
    }
}
