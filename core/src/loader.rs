use crate::context::{DocumentContext, ExtractionContext, LoadedDocument};
use crate::error::{Error, Result};
use crate::markdown::MarkdownExtractor;
use crate::media::publish_medias;
use crate::paths::SitePaths;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Format-specific loader. It reports what it finds through the context and
/// returns the document content.
pub trait DocumentExtractor: Send + Sync {
    fn load(&self, ctx: &mut dyn ExtractionContext, source: &str) -> Result<String>;
}

/// File category (extension with its dot) -> extractor.
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Box<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self { extractors: BTreeMap::new() }
    }

    pub fn register<E: DocumentExtractor + 'static>(&mut self, category: &str, extractor: E) {
        self.extractors.insert(category.to_string(), Box::new(extractor));
    }

    pub fn get(&self, category: &str) -> Option<&dyn DocumentExtractor> {
        self.extractors.get(category).map(|e| e.as_ref())
    }

    pub fn can_load(&self, path: &Path) -> bool {
        category_of(path).is_some_and(|c| self.extractors.contains_key(&c))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(".md", MarkdownExtractor);
        registry
    }
}

pub fn category_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Load one document of the data root, extract its facts and publish its media.
pub fn load_source_file(registry: &ExtractorRegistry, paths: &SitePaths, doc_path: &[String]) -> Result<LoadedDocument> {
    let source_path = paths.source_path(doc_path);
    let category = category_of(&source_path).unwrap_or_default();
    let extractor = registry
        .get(&category)
        .ok_or_else(|| Error::UnsupportedCategory(category.clone()))?;

    let source = fs::read_to_string(&source_path).map_err(|e| Error::io(&source_path, e))?;
    let parent = &doc_path[..doc_path.len().saturating_sub(1)];
    let mut ctx = DocumentContext::new(parent);
    let content = extractor.load(&mut ctx, &source)?;

    let default_title = doc_path.last().cloned().unwrap_or_default();
    let loaded = ctx.finalize(category, default_title, content);
    publish_medias(paths, &loaded.medias)?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ASSET_MEDIA;
    use tempfile::tempdir;

    #[test]
    fn only_registered_categories_load() {
        let registry = ExtractorRegistry::default();
        assert!(registry.can_load(Path::new("a/b.md")));
        assert!(!registry.can_load(Path::new("a/b.txt")));
        assert!(!registry.can_load(Path::new("Makefile")));
    }

    #[test]
    fn loads_markdown_and_copies_media() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path().join("data"), dir.path().join("assets"), dir.path().join("cache"));
        fs::create_dir_all(paths.data_root.join("guide")).unwrap();
        fs::write(paths.data_root.join("guide/intro.md"), "# Intro\n![pic](pic.png)\n").unwrap();
        fs::write(paths.data_root.join("guide/pic.png"), b"png").unwrap();

        let doc_path = vec!["guide".to_string(), "intro.md".to_string()];
        let loaded = load_source_file(&ExtractorRegistry::default(), &paths, &doc_path).unwrap();
        assert_eq!(loaded.category, ".md");
        assert_eq!(loaded.title, "Intro");
        assert!(loaded.facts.full_text_terms.contains_key("In"));
        assert!(paths.asset_path(ASSET_MEDIA, &loaded.medias[0].name).exists());
    }

    #[test]
    fn unsupported_category_is_reported() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), dir.path().join("assets"), dir.path().join("cache"));
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let err = load_source_file(&ExtractorRegistry::default(), &paths, &["notes.txt".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCategory(c) if c == ".txt"));
    }
}
