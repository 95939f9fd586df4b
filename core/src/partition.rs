//! Sharded key/value persistence.
//!
//! A logical index is split into up to 256 shards. The shard holding a key is
//! the first two hex digits of the key's SHA-256; the shard payload is a JSON
//! object mapping the full key to its value. An empty shard is never stored.

use crate::error::{Error, Result};
use crate::paths::sha256_hex;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SHARD_PREFIX_LEN: usize = 2;

/// Decoded payload of one shard.
pub type Shard<T> = BTreeMap<String, T>;

pub fn shard_id(key: &str) -> String {
    let mut hex = sha256_hex(key);
    hex.truncate(SHARD_PREFIX_LEN);
    hex
}

pub fn decode_shard<T: DeserializeOwned>(shard: &str, raw: &str) -> Result<Shard<T>> {
    serde_json::from_str(raw).map_err(|e| Error::parse(format!("partition {shard}"), e))
}

/// Read access to raw shard payloads. `Ok(None)` means the shard does not exist.
pub trait PartitionBackend {
    fn read(&self, shard: &str) -> Result<Option<String>>;
}

pub trait PartitionBackendMut: PartitionBackend {
    fn write(&self, shard: &str, content: &str) -> Result<()>;
    fn delete(&self, shard: &str) -> Result<()>;
}

/// One `<shard>.json` file per shard under a root directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Like [`FsBackend::new`] but creates the root directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let backend = Self::new(root);
        fs::create_dir_all(&backend.root).map_err(|e| Error::io(&backend.root, e))?;
        Ok(backend)
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn file_path(&self, shard: &str) -> PathBuf {
        self.root.join(format!("{shard}.json"))
    }
}

impl PartitionBackend for FsBackend {
    fn read(&self, shard: &str) -> Result<Option<String>> {
        let path = self.file_path(shard);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

impl PartitionBackendMut for FsBackend {
    fn write(&self, shard: &str, content: &str) -> Result<()> {
        let path = self.file_path(shard);
        fs::write(&path, content).map_err(|e| Error::io(path, e))
    }

    fn delete(&self, shard: &str) -> Result<()> {
        let path = self.file_path(shard);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

/// In-process backend, handy for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    shards: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.shards.lock().clone()
    }

    pub fn contains(&self, shard: &str) -> bool {
        self.shards.lock().contains_key(shard)
    }
}

impl PartitionBackend for MemoryBackend {
    fn read(&self, shard: &str) -> Result<Option<String>> {
        Ok(self.shards.lock().get(shard).cloned())
    }
}

impl PartitionBackendMut for MemoryBackend {
    fn write(&self, shard: &str, content: &str) -> Result<()> {
        self.shards.lock().insert(shard.to_string(), content.to_string());
        Ok(())
    }

    fn delete(&self, shard: &str) -> Result<()> {
        self.shards.lock().remove(shard);
        Ok(())
    }
}

/// Typed lookups of single keys in a sharded index.
pub struct PartitionReader<T, B> {
    backend: B,
    _payload: PhantomData<fn() -> T>,
}

impl<T, B> PartitionReader<T, B> {
    pub fn new(backend: B) -> Self {
        Self { backend, _payload: PhantomData }
    }

    pub fn backend(&self) -> &B { &self.backend }
}

impl<T: DeserializeOwned, B: PartitionBackend> PartitionReader<T, B> {
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        let partition = self.read_shard(&shard_id(key))?;
        Ok(partition.and_then(|mut p| p.remove(key)))
    }

    fn read_shard(&self, shard: &str) -> Result<Option<Shard<T>>> {
        match self.backend.read(shard)? {
            Some(raw) => decode_shard(shard, &raw).map(Some),
            None => Ok(None),
        }
    }
}

/// Read-modify-write access to a sharded index.
///
/// Every mutation rewrites the whole shard without any concurrency check, so
/// a given index must only have one writer at a time.
pub struct PartitionWriter<T, B> {
    reader: PartitionReader<T, B>,
}

impl<T, B> PartitionWriter<T, B> {
    pub fn new(backend: B) -> Self {
        Self { reader: PartitionReader::new(backend) }
    }

    pub fn backend(&self) -> &B { self.reader.backend() }
}

impl<T, B> PartitionWriter<T, B>
where
    T: Serialize + DeserializeOwned,
    B: PartitionBackendMut,
{
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        self.reader.get(key)
    }

    pub fn write(&self, key: &str, value: T) -> Result<()> {
        let shard = shard_id(key);
        let mut partition = self.reader.read_shard(&shard)?.unwrap_or_default();
        partition.insert(key.to_string(), value);
        self.persist(&shard, &partition)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let shard = shard_id(key);
        let Some(mut partition) = self.reader.read_shard(&shard)? else {
            return Ok(());
        };
        if partition.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&shard, &partition)
    }

    fn persist(&self, shard: &str, partition: &Shard<T>) -> Result<()> {
        if partition.is_empty() {
            debug!(shard, "dropping empty partition");
            return self.backend().delete(shard);
        }
        let content = serde_json::to_string_pretty(partition)
            .map_err(|e| Error::parse(format!("partition {shard}"), e))?;
        self.backend().write(shard, &content)
    }
}
