use crate::facts::DocumentFacts;
use crate::paths::{asset_url, sha256_hex, ASSET_MEDIA};
use std::collections::BTreeMap;
use std::path::Path;

/// Capabilities a document extractor may call while loading a source file.
pub trait ExtractionContext {
    fn set_title(&mut self, title: &str);
    fn add_property(&mut self, name: &str, value: &str);
    /// Register a media file referenced by the document and return its public URL.
    fn add_media(&mut self, relative_name: &str) -> String;
    fn add_full_text_term(&mut self, term: &str);
}

/// A media file to publish: source path below the data root and published file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub source: String,
    pub name: String,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File extension including the dot, e.g. `.md`.
    pub category: String,
    pub title: String,
    pub content: String,
    pub facts: DocumentFacts,
    pub medias: Vec<MediaRef>,
}

/// Accumulates extractor calls for a single document.
#[derive(Debug, Default)]
pub struct DocumentContext {
    parent: Vec<String>,
    title: Option<String>,
    facts: DocumentFacts,
    medias: BTreeMap<String, String>,
}

impl DocumentContext {
    pub fn new(parent: &[String]) -> Self {
        Self { parent: parent.to_vec(), ..Self::default() }
    }

    pub fn finalize(self, category: String, default_title: String, content: String) -> LoadedDocument {
        LoadedDocument {
            category,
            title: self.title.unwrap_or(default_title),
            content,
            facts: self.facts,
            medias: self
                .medias
                .into_iter()
                .map(|(source, name)| MediaRef { source, name })
                .collect(),
        }
    }

    // `/x` is relative to the data root, anything else to the document's directory.
    fn resolve(&self, name: &str) -> String {
        let mut segments: Vec<&str> = match name.strip_prefix('/') {
            Some(_) => Vec::new(),
            None => self.parent.iter().map(String::as_str).collect(),
        };
        for seg in name.split('/') {
            match seg {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }
}

impl ExtractionContext for DocumentContext {
    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn add_property(&mut self, name: &str, value: &str) {
        self.facts.properties.entry(name.to_string()).or_default().push(value.to_string());
    }

    fn add_media(&mut self, relative_name: &str) -> String {
        let relative = self.resolve(relative_name);
        let ext = Path::new(&relative)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let name = format!("{}{}", sha256_hex(&relative), ext);
        let url = asset_url(ASSET_MEDIA, &name);
        self.medias.insert(relative, name);
        url
    }

    fn add_full_text_term(&mut self, term: &str) {
        *self.facts.full_text_terms.entry(term.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(segs: &[&str]) -> Vec<String> {
        segs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accumulates_terms_and_properties() {
        let mut ctx = DocumentContext::new(&[]);
        ctx.add_full_text_term("ru");
        ctx.add_full_text_term("ru");
        ctx.add_property("tag", "a");
        ctx.add_property("tag", "b");
        let doc = ctx.finalize(".md".into(), "a.md".into(), String::new());
        assert_eq!(doc.title, "a.md");
        assert_eq!(doc.facts.full_text_terms["ru"], 2);
        assert_eq!(doc.facts.properties["tag"], vec!["a", "b"]);
    }

    #[test]
    fn media_is_resolved_against_parent() {
        let mut ctx = DocumentContext::new(&parent(&["notes", "rust"]));
        let url = ctx.add_media("img/logo.png");
        let expected = format!("{}.png", sha256_hex("notes/rust/img/logo.png"));
        assert_eq!(url, format!("/assets/medias/{expected}"));

        ctx.add_media("../shared/a.jpg");
        ctx.add_media("/root.gif");
        ctx.set_title("Rust");
        let doc = ctx.finalize(".md".into(), "x.md".into(), String::new());
        let sources: Vec<_> = doc.medias.iter().map(|m| m.source.as_str()).collect();
        assert_eq!(sources, vec!["notes/rust/img/logo.png", "notes/shared/a.jpg", "root.gif"]);
        assert_eq!(doc.title, "Rust");
    }
}
