//! Mirroring the content tree into the output tree.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{io_err, walk_err, Result};
use crate::paths::{mirror, PathAliases};

/// Counts from one copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    /// Directories ensured in the output
    pub dirs: usize,
    /// Regular files copied
    pub files: usize,
    /// Bytes copied
    pub bytes: u64,
    /// Entries that were neither directories nor regular files
    pub skipped: usize,
}

/// Copy every directory and regular file under `from` into `to`, keeping
/// each entry's path relative to `root`. With `root` the working root,
/// `$WORK/content/css/site.css` lands at `$OUT/content/css/site.css`.
///
/// Symlinks and other special files are skipped. Any I/O error aborts the
/// copy and leaves whatever was already written in place.
pub fn copy_tree(
    root: &Path,
    from: &Path,
    to: &Path,
    aliases: &PathAliases,
) -> Result<CopyStats> {
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(walk_err(from))?;
        let path = entry.path();
        let dst = mirror(root, to, path)?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dst).map_err(io_err("mkdir", &dst))?;
            tracing::info!("cp -r {} {}", aliases.show(path), aliases.show(&dst));
            stats.dirs += 1;
        } else if file_type.is_file() {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(io_err("mkdir", parent))?;
            }
            stats.bytes += copy_file(path, &dst)?;
            stats.files += 1;
        } else {
            tracing::debug!("skipping {} (not a regular file)", aliases.show(path));
            stats.skipped += 1;
        }
    }

    Ok(stats)
}

/// Copy bytes verbatim, truncating any existing destination.
fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    let mut reader = File::open(src).map_err(io_err("open", src))?;
    let mut writer = File::create(dst).map_err(io_err("create", dst))?;
    io::copy(&mut reader, &mut writer).map_err(io_err("copy", src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_tree;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn aliases(root: &Path) -> PathAliases {
        PathAliases::new(root, root.join("out"))
    }

    /// Relative path -> contents (None for directories).
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                let data = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
                (rel, data)
            })
            .collect()
    }

    fn sample_content(root: &Path) -> PathBuf {
        let content = root.join("content");
        fs::create_dir_all(content.join("css")).unwrap();
        fs::create_dir_all(content.join("img/icons")).unwrap();
        fs::create_dir_all(content.join("empty")).unwrap();
        fs::write(content.join("robots.txt"), "User-agent: *\n").unwrap();
        fs::write(content.join("css/site.css"), "body { margin: 0 }").unwrap();
        let binary: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        fs::write(content.join("img/icons/logo.png"), &binary).unwrap();
        fs::write(content.join("crlf.txt"), b"a\r\nb\r\n\xff").unwrap();
        content
    }

    #[test]
    fn copies_bytes_verbatim() {
        let temp = tempdir().unwrap();
        let content = sample_content(temp.path());
        let out = temp.path().join("out");

        let stats = copy_tree(temp.path(), &content, &out, &aliases(temp.path())).unwrap();

        assert_eq!(stats.files, 4);
        assert_eq!(stats.dirs, 5);
        for rel in ["robots.txt", "css/site.css", "img/icons/logo.png", "crlf.txt"] {
            assert_eq!(
                fs::read(content.join(rel)).unwrap(),
                fs::read(out.join("content").join(rel)).unwrap(),
                "{rel} differs"
            );
        }
        assert!(out.join("content/empty").is_dir());
        assert!(!out.join("robots.txt").exists());
    }

    #[test]
    fn truncates_existing_files() {
        let temp = tempdir().unwrap();
        let content = sample_content(temp.path());
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("content")).unwrap();
        fs::write(
            out.join("content/robots.txt"),
            "a much longer stale body than the source",
        )
        .unwrap();

        copy_tree(temp.path(), &content, &out, &aliases(temp.path())).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("content/robots.txt")).unwrap(),
            "User-agent: *\n"
        );
    }

    #[test]
    fn clean_then_copy_matches_fresh_copy() {
        let temp = tempdir().unwrap();
        let content = sample_content(temp.path());

        let fresh = temp.path().join("fresh");
        copy_tree(temp.path(), &content, &fresh, &aliases(temp.path())).unwrap();

        let reused = temp.path().join("reused");
        copy_tree(temp.path(), &content, &reused, &aliases(temp.path())).unwrap();
        fs::write(reused.join("stale.html"), "old").unwrap();
        fs::create_dir_all(reused.join("gone/deeper")).unwrap();
        clean_tree(&reused).unwrap();
        copy_tree(temp.path(), &content, &reused, &aliases(temp.path())).unwrap();

        assert_eq!(snapshot(&fresh), snapshot(&reused));
    }

    #[cfg(unix)]
    #[test]
    fn skips_symlinks() {
        let temp = tempdir().unwrap();
        let content = sample_content(temp.path());
        std::os::unix::fs::symlink(content.join("robots.txt"), content.join("link.txt")).unwrap();
        let out = temp.path().join("out");

        let stats = copy_tree(temp.path(), &content, &out, &aliases(temp.path())).unwrap();

        assert_eq!(stats.skipped, 1);
        assert!(fs::symlink_metadata(out.join("content/link.txt")).is_err());
    }

    #[test]
    fn missing_source_is_an_error() {
        let temp = tempdir().unwrap();
        let result = copy_tree(
            temp.path(),
            &temp.path().join("missing"),
            &temp.path().join("out"),
            &aliases(temp.path()),
        );
        assert!(result.is_err());
    }
}
