//! Walking the content tree below the data root.

use crate::error::{Error, Result};
use crate::loader::ExtractorRegistry;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirListing {
    pub path: Vec<String>,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    /// The directory's own document, if it has one.
    pub index_file: Option<String>,
}

pub fn is_index_marker(file_name: &str) -> bool {
    Path::new(file_name)
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case("index"))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List one directory of the data root. Dot-entries are skipped and names sorted.
///
/// Only files `registry` can load count as the directory's index document.
pub fn list_dir(data_root: &Path, path: &[String], registry: &ExtractorRegistry) -> Result<DirListing> {
    let dir: PathBuf = path.iter().fold(data_root.to_path_buf(), |p, seg| p.join(seg));
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
        if file_type.is_dir() {
            dirs.push(name);
        } else if file_type.is_file() {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    let mut markers: Vec<String> = files
        .iter()
        .filter(|f| is_index_marker(f) && registry.can_load(Path::new(f.as_str())))
        .cloned()
        .collect();
    if markers.len() > 1 {
        return Err(Error::AmbiguousIndex { dir, candidates: markers });
    }
    Ok(DirListing { path: path.to_vec(), dirs, files, index_file: markers.pop() })
}

/// Every loadable document below `data_root`, as path segments, in walk order.
pub fn collect_documents(data_root: &Path, registry: &ExtractorRegistry) -> Result<Vec<Vec<String>>> {
    let walker = WalkDir::new(data_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| data_root.to_path_buf());
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let rel = relative_segments(data_root, &entry);
        let listing = list_dir(data_root, &rel, registry)?;
        for file in listing.files {
            if registry.can_load(Path::new(&file)) {
                let mut doc = rel.clone();
                doc.push(file);
                documents.push(doc);
            }
        }
    }
    Ok(documents)
}

fn relative_segments(root: &Path, entry: &DirEntry) -> Vec<String> {
    entry
        .path()
        .strip_prefix(root)
        .map(|rel| rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect())
        .unwrap_or_default()
}
