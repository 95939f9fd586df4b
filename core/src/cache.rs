//! Per-document record of the facts last applied to the indexes.

use crate::error::{Error, Result};
use crate::facts::DocumentFacts;
use crate::paths::sha256_hex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Modification time in epoch milliseconds, `None` if the file is absent.
pub fn modify_time(path: &Path) -> Result<Option<u64>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    let mtime = meta.modified().map_err(|e| Error::io(path, e))?;
    let millis = mtime.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
    Ok(Some(millis))
}

/// One JSON file per document, named by the SHA-256 of its id.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    root: PathBuf,
}

impl DocumentCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn entry_path(&self, doc_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", sha256_hex(doc_id)))
    }

    /// Time the entry was last written; 0 when there is none.
    pub fn modify_time(&self, doc_id: &str) -> Result<u64> {
        Ok(modify_time(&self.entry_path(doc_id))?.unwrap_or(0))
    }

    pub fn read(&self, doc_id: &str) -> Result<Option<DocumentFacts>> {
        let path = self.entry_path(doc_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::parse(format!("document cache for {doc_id}"), e))
    }

    pub fn write(&self, doc_id: &str, facts: &DocumentFacts) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(&self.root, e))?;
        let path = self.entry_path(doc_id);
        let content = serde_json::to_string_pretty(facts)
            .map_err(|e| Error::parse(format!("document cache for {doc_id}"), e))?;
        fs::write(&path, content).map_err(|e| Error::io(path, e))
    }

    pub fn remove(&self, doc_id: &str) -> Result<()> {
        let path = self.entry_path(doc_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// A document is stale when its source is newer than its cache entry.
    /// A missing cache entry counts as infinitely old.
    pub fn should_update(&self, source: &Path, doc_id: &str) -> Result<bool> {
        let source_time = modify_time(source)?.unwrap_or(0);
        Ok(source_time > self.modify_time(doc_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn touch_future(path: &Path) {
        let f = fs::File::options().write(true).open(path).unwrap();
        f.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    }

    #[test]
    fn missing_entry_reads_as_none_and_time_zero() {
        let dir = tempdir().unwrap();
        let cache = DocumentCache::new(dir.path().join("documents"));
        assert_eq!(cache.read("a.md").unwrap(), None);
        assert_eq!(cache.modify_time("a.md").unwrap(), 0);
        cache.remove("a.md").unwrap();
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let cache = DocumentCache::new(dir.path().join("documents"));
        let mut facts = DocumentFacts::default();
        facts.full_text_terms.insert("he".into(), 1);
        cache.write("notes/a.md", &facts).unwrap();

        let file_name = cache.entry_path("notes/a.md").file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(file_name, format!("{}.json", sha256_hex("notes/a.md")));
        assert_eq!(cache.read("notes/a.md").unwrap(), Some(facts));
        assert!(cache.modify_time("notes/a.md").unwrap() > 0);
    }

    #[test]
    fn malformed_entry_is_fatal() {
        let dir = tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());
        fs::write(cache.entry_path("x.md"), "[1,").unwrap();
        assert!(matches!(cache.read("x.md"), Err(Error::Parse { .. })));
    }

    #[test]
    fn staleness_follows_modify_times() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.md");
        fs::write(&source, "hello").unwrap();
        let cache = DocumentCache::new(dir.path().join("documents"));

        assert!(cache.should_update(&source, "a.md").unwrap());
        cache.write("a.md", &DocumentFacts::default()).unwrap();
        assert!(!cache.should_update(&source, "a.md").unwrap());

        touch_future(&source);
        assert!(cache.should_update(&source, "a.md").unwrap());
    }
}
