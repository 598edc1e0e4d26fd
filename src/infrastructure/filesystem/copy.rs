//! Recursive, permission preserving copy.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

use crate::common::error::PublisherError;
use crate::common::result::{PublisherResult, ResultExt};

/// Copy a file or a whole directory tree from `src` to `dst`, returning the
/// number of regular files written.
///
/// Entries below `src` for which `include` returns `false` are skipped,
/// together with everything beneath them; `src` itself is always copied. Symlinks are followed. File mode bits are
/// carried over to the destination; directories are created as needed.
/// The first failure aborts the copy and leaves whatever was already written.
pub fn copy_path_filtered<F>(src: &Path, dst: &Path, include: F) -> PublisherResult<usize>
where
    F: Fn(&Path) -> bool,
{
    let metadata = fs::metadata(src).with_filesystem_error("failed to stat", src)?;
    if !metadata.is_dir() {
        copy_file(src, dst, &metadata)?;
        return Ok(1);
    }

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || include(entry.path()));

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).map_err(|_| {
            PublisherError::filesystem_error(
                format!("{} is outside of {}", entry.path().display(), src.display()),
                Some(entry.path().to_path_buf()),
            )
        })?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).with_filesystem_error("failed to create directory", &target)?;
            continue;
        }

        let metadata = entry.metadata()?;
        copy_file(entry.path(), &target, &metadata)?;
        copied += 1;
    }

    Ok(copied)
}

fn copy_file(src: &Path, dst: &Path, metadata: &fs::Metadata) -> PublisherResult<()> {
    trace!("copy {} -> {}", src.display(), dst.display());
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_filesystem_error("failed to create directory", parent)?;
    }
    // An earlier pattern may have placed a read-only copy here already
    match fs::remove_file(dst) {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            return Err(e).with_filesystem_error("failed to replace", dst);
        }
        _ => {}
    }
    fs::copy(src, dst).with_filesystem_error(format!("failed to copy {} to", src.display()), dst)?;
    fs::set_permissions(dst, metadata.permissions())
        .with_filesystem_error("failed to set permissions on", dst)?;
    Ok(())
}
