use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Logical document id, the `/`-joined path below the data root.
pub type DocId = String;

/// Searchable facts extracted from one document at a point in time.
///
/// This is also the on-disk shape of a document cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFacts {
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub full_text_terms: BTreeMap<String, u32>,
}

impl DocumentFacts {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.full_text_terms.is_empty()
    }
}

/// Full-text index payload: document -> occurrence count of the term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermPostings(pub BTreeMap<DocId, u32>);

/// Property-value index payload: value -> number of documents holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueCounts(pub BTreeMap<String, u32>);

/// Property-reference index payload: document -> presence marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct References(pub BTreeMap<DocId, Presence>);

impl References {
    pub fn documents(&self) -> impl Iterator<Item = &DocId> {
        self.0.keys()
    }
}

/// Existence marker, stored as the number `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence;

impl Serialize for Presence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(1)
    }
}

impl<'de> Deserialize<'de> for Presence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u64::deserialize(deserializer)? {
            1 => Ok(Presence),
            other => Err(serde::de::Error::custom(Error::InvalidPresence(other))),
        }
    }
}

/// Key of the property-reference index.
pub fn reference_key(property: &str, value: &str) -> String {
    format!("{property}/{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_use_camel_case_on_disk() {
        let mut facts = DocumentFacts::default();
        facts.full_text_terms.insert("ru".into(), 2);
        facts.properties.insert("tag".into(), vec!["rust".into()]);
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["fullTextTerms"]["ru"], 2);
        assert_eq!(json["properties"]["tag"][0], "rust");
    }

    #[test]
    fn presence_is_the_number_one() {
        let mut refs = References::default();
        refs.0.insert("a.md".into(), Presence);
        assert_eq!(serde_json::to_string(&refs).unwrap(), r#"{"a.md":1}"#);
        assert!(serde_json::from_str::<References>(r#"{"a.md":2}"#).is_err());
        let back: References = serde_json::from_str(r#"{"a.md":1}"#).unwrap();
        assert_eq!(back, refs);
    }
}
