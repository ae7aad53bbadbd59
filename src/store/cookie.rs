//! Cookie-jar-backed consent store.
//!
//! Each record is a cookie scoped to the site root with `SameSite=Lax` and an
//! expiry `ttl_days` from the moment it was written (default 365). Expired
//! records read as absent; expiry is enforced at read time, no background
//! eviction runs.
//!
//! The jar lives in memory behind a `Mutex`. With [`CookieJarStore::with_file`]
//! the whole jar is additionally persisted to a single JSON file, loaded
//! tolerantly on open (an unreadable or corrupt file yields an empty jar) and
//! rewritten after every mutation. File writes are not atomic; a failed write
//! is reported to the caller and logged, never panicked on.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::config::{COOKIE_PATH, COOKIE_SAME_SITE};
use crate::errors::ConsentError;
use crate::store::ConsentStore;

/// A consent record as kept in the jar and serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieRecord {
    value: String,
    /// Path scoping; always `"/"` for consent records.
    path: String,
    /// SameSite policy; always `"Lax"` for consent records.
    same_site: String,
    /// Expiration timestamp, RFC 3339.
    expires: String,
}

impl CookieRecord {
    fn expired(&self, now: OffsetDateTime) -> bool {
        match OffsetDateTime::parse(&self.expires, &Rfc3339) {
            Ok(at) => at <= now,
            // Unparseable expiry makes the whole record malformed.
            Err(_) => true,
        }
    }
}

/// On-disk representation of the jar.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CookieJarFile {
    cookies: HashMap<String, CookieRecord>,
}

/// Consent store backed by an expiring cookie jar.
pub struct CookieJarStore {
    ttl_days: u32,
    path: Option<PathBuf>,
    jar: Mutex<HashMap<String, CookieRecord>>,
}

impl CookieJarStore {
    /// In-memory jar with the given record lifetime in days.
    pub fn in_memory(ttl_days: u32) -> Self {
        Self {
            ttl_days,
            path: None,
            jar: Mutex::new(HashMap::new()),
        }
    }

    /// Jar persisted to a JSON file at `path`. Existing contents are loaded
    /// if the file parses; anything else starts an empty jar.
    pub fn with_file(path: PathBuf, ttl_days: u32) -> Self {
        let cookies = fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<CookieJarFile>(&s).ok())
            .map(|f| f.cookies)
            .unwrap_or_default();

        Self {
            ttl_days,
            path: Some(path),
            jar: Mutex::new(cookies),
        }
    }

    fn save(&self, jar: &HashMap<String, CookieRecord>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = CookieJarFile { cookies: jar.clone() };
        let contents = serde_json::to_string_pretty(&file).context("serialize cookie jar")?;
        fs::write(path, contents).map_err(|e| {
            ConsentError::StorageUnavailable(format!("cookie jar at {}: {e}", path.display())).into()
        })
    }
}

impl ConsentStore for CookieJarStore {
    fn read(&self, key: &str) -> Option<String> {
        let jar = self.jar.lock().ok()?;
        let record = jar.get(key)?;
        if record.expired(OffsetDateTime::now_utc()) {
            return None;
        }
        Some(record.value.clone())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let expires = OffsetDateTime::now_utc() + Duration::days(i64::from(self.ttl_days));
        let record = CookieRecord {
            value: value.to_string(),
            path: COOKIE_PATH.to_string(),
            same_site: COOKIE_SAME_SITE.to_string(),
            expires: expires.format(&Rfc3339).context("format cookie expiry")?,
        };

        let mut jar = self
            .jar
            .lock()
            .map_err(|_| ConsentError::StorageUnavailable("cookie jar lock poisoned".into()))?;
        jar.insert(key.to_string(), record);
        self.save(&jar)
    }
}
