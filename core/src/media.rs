use crate::cache::modify_time;
use crate::context::MediaRef;
use crate::error::{Error, Result};
use crate::paths::{SitePaths, ASSET_MEDIA};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Copy `from` to `to` unless `to` is at least as new. Returns whether a copy happened.
pub fn lazy_copy(from: &Path, to: &Path) -> Result<bool> {
    let from_time = modify_time(from)?.ok_or_else(|| {
        Error::io(from, std::io::Error::new(std::io::ErrorKind::NotFound, "media source missing"))
    })?;
    let to_time = modify_time(to)?.unwrap_or(0);
    if from_time <= to_time {
        return Ok(false);
    }
    debug!(from = %from.display(), to = %to.display(), "copying media");
    fs::copy(from, to).map_err(|e| Error::io(to, e))?;
    Ok(true)
}

/// Publish the media a document references into `<assets>/medias`.
///
/// A reference to a file that does not exist is logged and skipped.
pub fn publish_medias(paths: &SitePaths, medias: &[MediaRef]) -> Result<usize> {
    if medias.is_empty() {
        return Ok(0);
    }
    let dir = paths.asset_dir(ASSET_MEDIA);
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut copied = 0;
    for media in medias {
        let from = media.source.split('/').fold(paths.data_root.clone(), |p, seg| p.join(seg));
        if !from.is_file() {
            warn!(source = %media.source, "referenced media not found, skipping");
            continue;
        }
        if lazy_copy(&from, &dir.join(&media.name))? {
            copied += 1;
        }
    }
    Ok(copied)
}
