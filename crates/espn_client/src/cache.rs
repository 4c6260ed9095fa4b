//! Flat on-disk cache of raw HTTP responses.
//!
//! Responses are not written when fetched. The caller inspects the body
//! first and decides whether it is final enough to keep, then calls
//! [`CacheableContent::save_if_necessary`].

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use common::Error;
use tracing::debug;

use crate::query::QueryParams;

/// Filesystem-safe cache key for a request.
///
/// Separators `:`, `/`, `\` and `.` are stripped from `url + query`.
pub fn cache_key(url: &str, params: Option<&QueryParams>) -> String {
    let query = params.map(QueryParams::serialize).unwrap_or_default();
    format!("{}{}", url, query)
        .chars()
        .filter(|c| !matches!(c, ':' | '/' | '\\' | '.'))
        .collect()
}

/// Read a cached response, `None` on a miss.
pub(crate) async fn read_cached(path: &Path) -> Result<Option<Vec<u8>>, Error> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// A fetched body that may or may not end up in the cache.
#[derive(Debug, Clone)]
pub struct CacheableContent {
    data: Vec<u8>,
    save_path: PathBuf,
    from_cache: bool,
}

impl CacheableContent {
    pub(crate) fn new(data: Vec<u8>, save_path: PathBuf, from_cache: bool) -> Self {
        Self {
            data,
            save_path,
            from_cache,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the body was served from disk without a network call.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Persist the body unless a file already exists at the cache key.
    ///
    /// Returns whether anything was written. An existing entry is left
    /// untouched and is not an error.
    pub async fn save_if_necessary(&self) -> Result<bool, Error> {
        if self.from_cache {
            return Ok(false);
        }
        let written = write_new(&self.save_path, &self.data).await?;
        if written {
            debug!(
                "Cached {} bytes at {}",
                self.data.len(),
                self.save_path.display()
            );
        } else {
            debug!("Cache entry already present: {}", self.save_path.display());
        }
        Ok(written)
    }
}

/// Write `data` to `path` only if nothing is there yet.
///
/// The bytes go to a temp file in the same directory first and are linked
/// into place without overwriting, so `path` never holds a partial write.
/// Returns `false` when `path` already exists.
pub async fn write_new(path: &Path, data: &[u8]) -> Result<bool, Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let path = path.to_path_buf();
    let data = data.to_vec();
    tokio::task::spawn_blocking(move || -> Result<bool, Error> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(Error::Io(e.error)),
        }
    })
    .await
    .map_err(|e| Error::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_strips_separators() {
        let params = QueryParams::new().with("dates", "20200105").with("groups", 50);
        let key = cache_key(
            "https://site.api.espn.com/apis/site/v2/sports/basketball/mens-college-basketball/scoreboard",
            Some(&params),
        );
        assert_eq!(
            key,
            "httpssiteapiespncomapisitev2sportsbasketballmens-college-basketballscoreboarddates=20200105&groups=50"
        );
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_cache_key_without_params() {
        assert_eq!(cache_key("http://a.b/c", None), "httpabc");
        assert_eq!(
            cache_key("http://a.b/c", Some(&QueryParams::new())),
            cache_key("http://a.b/c", None)
        );
    }

    #[tokio::test]
    async fn test_save_if_necessary_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web").join("key");

        let first = CacheableContent::new(b"first".to_vec(), path.clone(), false);
        assert!(first.save_if_necessary().await.unwrap());

        let second = CacheableContent::new(b"second".to_vec(), path.clone(), false);
        assert!(!second.save_if_necessary().await.unwrap());

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first");
        assert_eq!(read_cached(&path).await.unwrap().as_deref(), Some(&b"first"[..]));
    }

    #[tokio::test]
    async fn test_read_cached_miss() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_cached(&dir.path().join("missing")).await.unwrap().is_none());
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_write_new_leaves_only_complete_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry");

        assert!(write_new(&path, b"complete body").await.unwrap());
        assert!(!write_new(&path, b"other").await.unwrap());

        // No temp files survive a write or a refused overwrite.
        assert_eq!(entries(dir.path()), vec!["entry".to_string()]);
        assert_eq!(std::fs::read(&path).unwrap(), b"complete body");
    }

    #[tokio::test]
    async fn test_write_new_failure_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a file, so nothing can be written.
        let blocker = dir.path().join("web");
        std::fs::write(&blocker, b"not a dir").unwrap();

        assert!(write_new(&blocker.join("key"), b"body").await.is_err());
        assert_eq!(entries(dir.path()), vec!["web".to_string()]);
    }
}
