//! Indexing and partitioned storage for a static documentation site.
//!
//! Source documents are turned into facts (full-text terms and front-matter
//! properties), which are applied to three sharded indexes published as JSON
//! under the site's assets. A per-document cache remembers what was applied so
//! a changed document can be reverted before it is re-applied.

pub mod cache;
pub mod context;
pub mod error;
pub mod extract;
pub mod facts;
pub mod loader;
pub mod maintainer;
pub mod markdown;
pub mod media;
pub mod partition;
pub mod paths;
pub mod query;
pub mod site;
pub mod tree;

pub use cache::DocumentCache;
pub use context::{DocumentContext, ExtractionContext, LoadedDocument, MediaRef};
pub use error::{Error, Result};
pub use facts::{reference_key, DocId, DocumentFacts, Presence, References, TermPostings, ValueCounts};
pub use loader::{load_source_file, DocumentExtractor, ExtractorRegistry};
pub use maintainer::Indexes;
pub use partition::{
    decode_shard, shard_id, FsBackend, MemoryBackend, PartitionBackend, PartitionBackendMut, PartitionReader, PartitionWriter,
};
pub use paths::SitePaths;
pub use query::IndexReader;
pub use site::{BuildSummary, IndexOutcome, SiteIndexer};
