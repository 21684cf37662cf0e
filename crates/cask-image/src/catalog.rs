//! Catalog of built images.
//!
//! An image is nothing more than `<root>/images/<id>.tar.gz`; the catalog
//! is a directory enumeration.

use chrono::{DateTime, Local};

use cask_common::error::{CaskError, Result};
use cask_common::layout::Layout;

const IMAGE_SUFFIX: &str = ".tar.gz";

/// One saved image.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Container ID the image was built from.
    pub id: String,
    /// Archive size in bytes.
    pub size_bytes: u64,
    /// When the archive was written.
    pub created: DateTime<Local>,
}

/// Lists all saved images, sorted by ID.
///
/// A missing images directory simply means no image has been built yet.
///
/// # Errors
///
/// Returns an error if the directory or an archive's metadata cannot be
/// read.
pub fn list(layout: &Layout) -> Result<Vec<ImageEntry>> {
    let dir = layout.images_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(&dir).map_err(|e| CaskError::Io {
        path: dir.clone(),
        source: e,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CaskError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(id) = name.strip_suffix(IMAGE_SUFFIX) else {
            continue;
        };

        let metadata = entry.metadata().map_err(|e| CaskError::Io {
            path: entry.path(),
            source: e,
        })?;
        let created = metadata
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Local::now());

        images.push(ImageEntry {
            id: id.to_owned(),
            size_bytes: metadata.len(),
            created,
        });
    }

    images.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(images)
}

/// Deletes a saved image by ID.
///
/// # Errors
///
/// Returns [`CaskError::NotFound`] if no such image exists, or an I/O
/// error if the archive cannot be removed.
pub fn delete(layout: &Layout, id: &str) -> Result<()> {
    let archive = layout.image_archive(id);
    if !archive.exists() {
        return Err(CaskError::NotFound {
            kind: "image",
            id: id.to_owned(),
        });
    }
    std::fs::remove_file(&archive).map_err(|e| CaskError::Io {
        path: archive,
        source: e,
    })?;
    tracing::info!(id, "image deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_without_images_dir_is_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let images = list(&Layout::new(tmp.path())).expect("list");
        assert!(images.is_empty());
    }

    #[test]
    fn list_reports_id_and_size() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        std::fs::create_dir_all(layout.images_dir()).expect("mkdir");
        std::fs::write(layout.image_archive("testb"), vec![0u8; 2048]).expect("write");

        let images = list(&layout).expect("list");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "testb");
        assert_eq!(images[0].size_bytes, 2048);
    }

    #[test]
    fn list_ignores_foreign_files_and_sorts_by_id() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        std::fs::create_dir_all(layout.images_dir()).expect("mkdir");
        std::fs::write(layout.image_archive("zeta"), b"z").expect("write");
        std::fs::write(layout.image_archive("alpha"), b"a").expect("write");
        std::fs::write(layout.images_dir().join("notes.txt"), b"x").expect("write");

        let images = list(&layout).expect("list");
        let ids: Vec<&str> = images.iter().map(|image| image.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "zeta"]);
    }

    #[test]
    fn delete_removes_only_the_named_image() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(tmp.path());
        std::fs::create_dir_all(layout.images_dir()).expect("mkdir");
        std::fs::write(layout.image_archive("keep"), b"k").expect("write");
        std::fs::write(layout.image_archive("drop"), b"d").expect("write");

        delete(&layout, "drop").expect("delete");

        assert!(layout.image_archive("keep").exists());
        assert!(!layout.image_archive("drop").exists());
    }

    #[test]
    fn delete_unknown_image_reports_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = delete(&Layout::new(tmp.path()), "ghost").unwrap_err();
        assert!(matches!(err, CaskError::NotFound { .. }));
    }
}
