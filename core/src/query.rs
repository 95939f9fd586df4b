//! Read side of the indexes.

use crate::error::Result;
use crate::extract::normalize;
use crate::facts::{reference_key, DocId, References, TermPostings, ValueCounts};
use crate::partition::{FsBackend, PartitionBackend, PartitionReader};
use crate::paths::{ASSET_FULL_TEXT, ASSET_PROPERTY_REFERENCES, ASSET_PROPERTY_VALUES};
use std::collections::BTreeSet;
use std::path::Path;

/// Whitespace-split query terms, normalized, empties and repeats dropped.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    normalize(query)
        .split_whitespace()
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// Documents matching ANY of the given postings.
///
/// Multi-term queries are a union, not an intersection.
pub fn union_documents<I>(postings: I) -> Vec<DocId>
where
    I: IntoIterator<Item = TermPostings>,
{
    let docs: BTreeSet<DocId> = postings.into_iter().flat_map(|p| p.0.into_keys()).collect();
    docs.into_iter().collect()
}

pub struct IndexReader<B> {
    full_text: PartitionReader<TermPostings, B>,
    property_values: PartitionReader<ValueCounts, B>,
    property_references: PartitionReader<References, B>,
}

impl<B> IndexReader<B> {
    pub fn new(full_text: B, property_values: B, property_references: B) -> Self {
        Self {
            full_text: PartitionReader::new(full_text),
            property_values: PartitionReader::new(property_values),
            property_references: PartitionReader::new(property_references),
        }
    }
}

impl IndexReader<FsBackend> {
    /// Reader over the partitions published under an assets root.
    pub fn from_assets<P: AsRef<Path>>(assets_root: P) -> Self {
        let root = assets_root.as_ref();
        Self::new(
            FsBackend::new(root.join(ASSET_FULL_TEXT)),
            FsBackend::new(root.join(ASSET_PROPERTY_VALUES)),
            FsBackend::new(root.join(ASSET_PROPERTY_REFERENCES)),
        )
    }
}

impl<B: PartitionBackend> IndexReader<B> {
    pub fn full_text(&self, term: &str) -> Result<TermPostings> {
        Ok(self.full_text.get(term)?.unwrap_or_default())
    }

    pub fn property_values(&self, property: &str) -> Result<ValueCounts> {
        Ok(self.property_values.get(property)?.unwrap_or_default())
    }

    pub fn property_references(&self, property: &str, value: &str) -> Result<Vec<DocId>> {
        let refs = self.property_references.get(&reference_key(property, value))?.unwrap_or_default();
        Ok(refs.0.into_keys().collect())
    }

    pub fn search(&self, query: &str) -> Result<Vec<DocId>> {
        let postings = query_terms(query)
            .iter()
            .map(|term| self.full_text(term))
            .collect::<Result<Vec<_>>>()?;
        Ok(union_documents(postings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_terms_split_and_dedupe() {
        assert_eq!(query_terms("  rust  中文 rust\t"), vec!["rust", "中文"]);
        assert!(query_terms("   ").is_empty());
    }

    #[test]
    fn union_keeps_every_document_once() {
        let a = TermPostings([("x.md".to_string(), 1), ("y.md".to_string(), 2)].into_iter().collect());
        let b = TermPostings([("y.md".to_string(), 5), ("z.md".to_string(), 1)].into_iter().collect());
        assert_eq!(union_documents(vec![a, b]), vec!["x.md", "y.md", "z.md"]);
    }
}
