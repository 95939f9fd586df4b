//! Offline site build: the single-writer batch pass over the data root.

use crate::cache::DocumentCache;
use crate::error::{Error, Result};
use crate::facts::DocId;
use crate::loader::{load_source_file, ExtractorRegistry};
use crate::maintainer::Indexes;
use crate::partition::{FsBackend, PartitionBackendMut};
use crate::paths::{doc_id, SitePaths};
use crate::tree::collect_documents;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

/// Documents indexed by the last completed build.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub documents: BTreeSet<DocId>,
    #[serde(default)]
    pub built_at: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| Error::parse("build manifest", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::parse("build manifest", e))?;
        fs::write(path, content).map_err(|e| Error::io(path, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Cache entry is newer than the source; nothing touched.
    Fresh,
    Indexed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub indexed: usize,
    pub fresh: usize,
    pub removed: usize,
}

pub struct SiteIndexer<B> {
    paths: SitePaths,
    indexes: Indexes<B>,
    cache: DocumentCache,
    registry: ExtractorRegistry,
}

impl SiteIndexer<FsBackend> {
    pub fn open(paths: SitePaths) -> Result<Self> {
        let indexes = Indexes::open(&paths)?;
        Ok(Self::new(paths, indexes, ExtractorRegistry::default()))
    }
}

impl<B> SiteIndexer<B> {
    pub fn new(paths: SitePaths, indexes: Indexes<B>, registry: ExtractorRegistry) -> Self {
        let cache = DocumentCache::new(paths.documents_dir());
        Self { paths, indexes, cache, registry }
    }

    pub fn paths(&self) -> &SitePaths { &self.paths }
    pub fn indexes(&self) -> &Indexes<B> { &self.indexes }
    pub fn cache(&self) -> &DocumentCache { &self.cache }
}

impl<B: PartitionBackendMut> SiteIndexer<B> {
    /// Re-index one document if its source changed since it was last indexed.
    ///
    /// Old facts are reverted and the cache entry dropped before the source is
    /// extracted; the new cache entry is written last. If extraction or apply
    /// fails in between, the document is absent from every index and has no
    /// cache entry, so the next run indexes it from scratch.
    pub fn index_document(&self, doc_path: &[String]) -> Result<IndexOutcome> {
        let id = doc_id(doc_path);
        let source = self.paths.source_path(doc_path);
        if !self.cache.should_update(&source, &id)? {
            debug!(doc = %id, "document is fresh");
            return Ok(IndexOutcome::Fresh);
        }

        if let Some(previous) = self.cache.read(&id)? {
            self.indexes.revert(&id, &previous)?;
            self.cache.remove(&id)?;
        }

        let loaded = load_source_file(&self.registry, &self.paths, doc_path)?;
        self.indexes.apply(&id, &loaded.facts)?;
        self.cache.write(&id, &loaded.facts)?;

        info!(doc = %id, terms = loaded.facts.full_text_terms.len(), medias = loaded.medias.len(), "indexed document");
        Ok(IndexOutcome::Indexed)
    }

    /// Revert a document that no longer exists. Returns whether it had been indexed.
    pub fn remove_document(&self, id: &str) -> Result<bool> {
        let Some(previous) = self.cache.read(id)? else {
            return Ok(false);
        };
        self.indexes.revert(id, &previous)?;
        self.cache.remove(id)?;
        info!(doc = %id, "removed document");
        Ok(true)
    }

    pub fn build(&self) -> Result<BuildSummary> {
        let documents = collect_documents(&self.paths.data_root, &self.registry)?;
        let previous = Manifest::load(&self.paths.manifest())?;

        let mut summary = BuildSummary::default();
        let mut current = BTreeSet::new();
        for doc in &documents {
            match self.index_document(doc) {
                Ok(IndexOutcome::Indexed) => summary.indexed += 1,
                Ok(IndexOutcome::Fresh) => summary.fresh += 1,
                Err(err) => {
                    self.record_partial_build(&previous, current);
                    return Err(err);
                }
            }
            current.insert(doc_id(doc));
        }

        for gone in previous.documents.difference(&current) {
            match self.remove_document(gone) {
                Ok(true) => summary.removed += 1,
                Ok(false) => {}
                Err(err) => {
                    self.record_partial_build(&previous, current.clone());
                    return Err(err);
                }
            }
        }

        let built_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        Manifest { documents: current, built_at }.save(&self.paths.manifest())?;

        info!(indexed = summary.indexed, fresh = summary.fresh, removed = summary.removed, "build complete");
        Ok(summary)
    }
}

impl<B> SiteIndexer<B> {
    /// Manifest after an aborted build: the previous documents plus those
    /// indexed before the failure.
    fn record_partial_build(&self, previous: &Manifest, indexed: BTreeSet<DocId>) {
        let mut documents = previous.documents.clone();
        documents.extend(indexed);
        let partial = Manifest { documents, built_at: previous.built_at.clone() };
        if let Err(err) = partial.save(&self.paths.manifest()) {
            warn!(error = %err, "could not record partially built documents");
        }
    }

    /// Documents the next build would re-index, without touching anything.
    pub fn stale_documents(&self) -> Result<Vec<Vec<String>>> {
        let mut stale = Vec::new();
        for doc in collect_documents(&self.paths.data_root, &self.registry)? {
            if self.cache.should_update(&self.paths.source_path(&doc), &doc_id(&doc))? {
                stale.push(doc);
            }
        }
        Ok(stale)
    }

    /// Documents of the last build whose source has since disappeared.
    pub fn pending_removals(&self) -> Result<Vec<DocId>> {
        let present: BTreeSet<DocId> = collect_documents(&self.paths.data_root, &self.registry)?
            .iter()
            .map(|d| doc_id(d))
            .collect();
        let manifest = Manifest::load(&self.paths.manifest())?;
        Ok(manifest.documents.difference(&present).cloned().collect())
    }
}
