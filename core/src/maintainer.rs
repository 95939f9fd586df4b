//! Applying and reverting a document's facts against the three logical indexes.

use crate::error::Result;
use crate::facts::{reference_key, DocumentFacts, Presence, References, TermPostings, ValueCounts};
use crate::partition::{FsBackend, PartitionBackendMut, PartitionWriter};
use crate::paths::{SitePaths, ASSET_FULL_TEXT, ASSET_PROPERTY_REFERENCES, ASSET_PROPERTY_VALUES};
use tracing::debug;

/// One partition store handle per logical index.
pub struct Indexes<B> {
    /// term -> {doc: count}
    pub full_text: PartitionWriter<TermPostings, B>,
    /// property -> {value: count}
    pub property_values: PartitionWriter<ValueCounts, B>,
    /// "property/value" -> {doc: 1}
    pub property_references: PartitionWriter<References, B>,
}

impl<B> Indexes<B> {
    pub fn new(full_text: B, property_values: B, property_references: B) -> Self {
        Self {
            full_text: PartitionWriter::new(full_text),
            property_values: PartitionWriter::new(property_values),
            property_references: PartitionWriter::new(property_references),
        }
    }
}

impl Indexes<FsBackend> {
    /// Handles on the partition directories under the assets root, without creating them.
    pub fn at(paths: &SitePaths) -> Self {
        Self::new(
            FsBackend::new(paths.asset_dir(ASSET_FULL_TEXT)),
            FsBackend::new(paths.asset_dir(ASSET_PROPERTY_VALUES)),
            FsBackend::new(paths.asset_dir(ASSET_PROPERTY_REFERENCES)),
        )
    }

    /// Open (creating as needed) the partition directories under the assets root.
    pub fn open(paths: &SitePaths) -> Result<Self> {
        Ok(Self::new(
            FsBackend::open(paths.asset_dir(ASSET_FULL_TEXT))?,
            FsBackend::open(paths.asset_dir(ASSET_PROPERTY_VALUES))?,
            FsBackend::open(paths.asset_dir(ASSET_PROPERTY_REFERENCES))?,
        ))
    }
}

impl<B: PartitionBackendMut> Indexes<B> {
    pub fn apply(&self, doc: &str, facts: &DocumentFacts) -> Result<()> {
        for (term, count) in &facts.full_text_terms {
            let mut postings = self.full_text.get(term)?.unwrap_or_default();
            postings.0.insert(doc.to_string(), *count);
            self.full_text.write(term, postings)?;
        }

        for (property, values) in &facts.properties {
            if values.is_empty() {
                continue;
            }
            let mut counts = self.property_values.get(property)?.unwrap_or_default();
            for value in values {
                *counts.0.entry(value.clone()).or_insert(0) += 1;

                let key = reference_key(property, value);
                let mut refs = self.property_references.get(&key)?.unwrap_or_default();
                refs.0.insert(doc.to_string(), Presence);
                self.property_references.write(&key, refs)?;
            }
            self.property_values.write(property, counts)?;
        }

        debug!(doc, terms = facts.full_text_terms.len(), properties = facts.properties.len(), "applied facts");
        Ok(())
    }

    /// Exact inverse of [`Indexes::apply`] for the same `facts`.
    pub fn revert(&self, doc: &str, facts: &DocumentFacts) -> Result<()> {
        for term in facts.full_text_terms.keys() {
            let Some(mut postings) = self.full_text.get(term)? else {
                continue;
            };
            if postings.0.remove(doc).is_none() {
                continue;
            }
            if postings.0.is_empty() {
                self.full_text.delete(term)?;
            } else {
                self.full_text.write(term, postings)?;
            }
        }

        for (property, values) in &facts.properties {
            if values.is_empty() {
                continue;
            }
            let mut counts = self.property_values.get(property)?.unwrap_or_default();
            for value in values {
                let remaining = counts.0.get(value).map_or(0, |n| n.saturating_sub(1));
                if remaining == 0 {
                    counts.0.remove(value);
                } else {
                    counts.0.insert(value.clone(), remaining);
                }

                let key = reference_key(property, value);
                if let Some(mut refs) = self.property_references.get(&key)? {
                    if refs.0.remove(doc).is_some() {
                        if refs.0.is_empty() {
                            self.property_references.delete(&key)?;
                        } else {
                            self.property_references.write(&key, refs)?;
                        }
                    }
                }
            }
            if counts.0.is_empty() {
                self.property_values.delete(property)?;
            } else {
                self.property_values.write(property, counts)?;
            }
        }

        debug!(doc, terms = facts.full_text_terms.len(), properties = facts.properties.len(), "reverted facts");
        Ok(())
    }
}
