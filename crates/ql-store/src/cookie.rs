//! Fallback store: a cookie jar on disk.
//!
//! One cookie per line, in `Set-Cookie` shape:
//!
//! ```text
//! quantumLoveState=%7B%22user%22...; expires=Wed, 11 Mar 2026 03:15:00 GMT; path=/; SameSite=Strict
//! ```
//!
//! Values are URL-encoded. Expired cookies are ignored on read and dropped
//! on the next write.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;

const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    /// Decoded value.
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|e| e <= now)
    }

    fn to_line(&self) -> String {
        let mut line = format!("{}={}", self.name, urlencoding::encode(&self.value));
        if let Some(expires) = self.expires {
            line.push_str(&format!("; expires={}", expires.format(EXPIRES_FORMAT)));
        }
        line.push_str("; path=/; SameSite=Strict");
        line
    }

    /// Parse one jar line. Attributes other than `expires` are ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split(';').map(str::trim);
        let pair = parts.next().unwrap_or_default();
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| StoreError::InvalidData(format!("cookie without '=': {pair}")))?;
        let value = urlencoding::decode(raw)
            .map_err(|e| StoreError::InvalidData(format!("cookie '{name}' is not URL-encoded: {e}")))?
            .into_owned();

        let mut expires = None;
        for attr in parts {
            let Some((k, v)) = attr.split_once('=') else {
                continue;
            };
            if k.trim().eq_ignore_ascii_case("expires") {
                let at = NaiveDateTime::parse_from_str(v.trim(), EXPIRES_FORMAT).map_err(|e| {
                    StoreError::InvalidData(format!("cookie '{name}' has a bad expiry: {e}"))
                })?;
                expires = Some(at.and_utc());
            }
        }

        Ok(Self {
            name: name.trim().to_string(),
            value,
            expires,
        })
    }
}

pub struct CookieJar {
    path: PathBuf,
    expiry: Duration,
}

impl CookieJar {
    pub fn new(path: impl Into<PathBuf>, expiry_days: i64) -> Self {
        Self {
            path: path.into(),
            expiry: Duration::days(expiry_days.max(1)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every parseable cookie in the jar, expired or not. Unparseable lines
    /// are skipped with a warning.
    pub fn cookies(&self) -> Result<Vec<Cookie>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match Cookie::parse(line) {
                Ok(c) => out.push(c),
                Err(e) => tracing::warn!(path = %self.path.display(), "skipping cookie line: {e}"),
            }
        }
        Ok(out)
    }

    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        Ok(self
            .cookies()?
            .into_iter()
            .find(|c| c.name == key && !c.is_expired(now))
            .map(|c| c.value))
    }

    pub fn set_at(&mut self, key: &str, value: &str, now: DateTime<Utc>) -> Result<()> {
        let mut cookies: Vec<Cookie> = self
            .cookies()?
            .into_iter()
            .filter(|c| c.name != key && !c.is_expired(now))
            .collect();
        cookies.push(Cookie {
            name: key.to_string(),
            value: value.to_string(),
            expires: Some(now + self.expiry),
        });
        self.write(&cookies)
    }

    fn write(&self, cookies: &[Cookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut text = String::new();
        for c in cookies {
            text.push_str(&c.to_line());
            text.push('\n');
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for CookieJar {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_at(key, Utc::now())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_at(key, value, Utc::now())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let now = Utc::now();
        let cookies: Vec<Cookie> = self
            .cookies()?
            .into_iter()
            .filter(|c| c.name != key && !c.is_expired(now))
            .collect();
        self.write(&cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn jar(dir: &tempfile::TempDir) -> CookieJar {
        CookieJar::new(dir.path().join("cookies.txt"), DEFAULT_EXPIRY_DAYS)
    }

    #[test]
    fn test_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut jar = jar(&dir);
        jar.set_at("quantumLoveState", "{\"a\": 1}", at("2026-02-11T03:15:00Z"))
            .unwrap();
        let text = fs::read_to_string(jar.path()).unwrap();
        assert_eq!(
            text.trim_end(),
            "quantumLoveState=%7B%22a%22%3A%201%7D; expires=Fri, 13 Mar 2026 03:15:00 GMT; path=/; SameSite=Strict"
        );
    }

    #[test]
    fn test_roundtrip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut jar = jar(&dir);
        let now = at("2026-02-11T03:15:00Z");
        jar.set_at("k", "one; two=three", now).unwrap();
        jar.set_at("other", "x", now).unwrap();
        jar.set_at("k", "ünïcode", now).unwrap();
        assert_eq!(jar.get_at("k", now).unwrap().as_deref(), Some("ünïcode"));
        assert_eq!(jar.cookies().unwrap().len(), 2);
    }

    #[test]
    fn test_expired_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut jar = jar(&dir);
        jar.set_at("k", "v", at("2026-01-01T00:00:00Z")).unwrap();
        assert!(jar.get_at("k", at("2026-01-30T00:00:00Z")).unwrap().is_some());
        assert!(jar.get_at("k", at("2026-02-01T00:00:00Z")).unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(jar(&dir).get("k").unwrap(), None);
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let jar = jar(&dir);
        fs::write(jar.path(), "garbage\nk=v; path=/\n").unwrap();
        assert_eq!(jar.get_at("k", Utc::now()).unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut jar = jar(&dir);
        jar.set("k", "v").unwrap();
        jar.remove("k").unwrap();
        assert_eq!(jar.get("k").unwrap(), None);
    }
}
