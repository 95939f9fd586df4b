use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Published asset families under the assets root.
pub const ASSET_MEDIA: &str = "medias";
pub const ASSET_FULL_TEXT: &str = "fullText";
pub const ASSET_PROPERTY_VALUES: &str = "propertyValues";
pub const ASSET_PROPERTY_REFERENCES: &str = "propertyReferences";

/// URL prefix the assets root is served under.
pub const ASSETS_URL_PREFIX: &str = "/assets";

/// The three roots a site build reads from and writes to.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub data_root: PathBuf,
    pub assets_root: PathBuf,
    pub cache_root: PathBuf,
}

impl SitePaths {
    pub fn new<D, A, C>(data_root: D, assets_root: A, cache_root: C) -> Self
    where
        D: AsRef<Path>,
        A: AsRef<Path>,
        C: AsRef<Path>,
    {
        Self {
            data_root: data_root.as_ref().to_path_buf(),
            assets_root: assets_root.as_ref().to_path_buf(),
            cache_root: cache_root.as_ref().to_path_buf(),
        }
    }

    pub fn asset_dir(&self, name: &str) -> PathBuf { self.assets_root.join(name) }
    pub fn asset_path(&self, name: &str, file: &str) -> PathBuf { self.asset_dir(name).join(file) }
    pub fn documents_dir(&self) -> PathBuf { self.cache_root.join("documents") }
    pub fn manifest(&self) -> PathBuf { self.cache_root.join("manifest.json") }

    /// Absolute path of a document given its logical path segments.
    pub fn source_path(&self, doc_path: &[String]) -> PathBuf {
        doc_path.iter().fold(self.data_root.clone(), |p, seg| p.join(seg))
    }
}

impl Default for SitePaths {
    fn default() -> Self {
        Self::new("data", "public/assets", "tmp/cache")
    }
}

/// Logical document id: path segments joined with `/`.
pub fn doc_id(doc_path: &[String]) -> String {
    doc_path.join("/")
}

pub fn asset_url(name: &str, file: &str) -> String {
    format!("{ASSETS_URL_PREFIX}/{name}/{file}")
}

/// Lowercase hex SHA-256 of `s`.
pub fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let paths = SitePaths::new("/site/data", "/site/public/assets", "/site/tmp/cache");
        assert_eq!(paths.asset_dir(ASSET_FULL_TEXT), PathBuf::from("/site/public/assets/fullText"));
        assert_eq!(paths.documents_dir(), PathBuf::from("/site/tmp/cache/documents"));
        let doc = vec!["notes".to_string(), "rust.md".to_string()];
        assert_eq!(paths.source_path(&doc), PathBuf::from("/site/data/notes/rust.md"));
        assert_eq!(doc_id(&doc), "notes/rust.md");
    }

    #[test]
    fn sha256_matches_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(asset_url(ASSET_MEDIA, "x.png"), "/assets/medias/x.png");
    }
}
