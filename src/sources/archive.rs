//! Tarball extraction.

use std::io::Read;
use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;

/// Extract a gzip-compressed tarball into a destination directory.
///
/// Supports `.tar.gz` and `.tgz` archives. Entries whose paths would
/// land outside the destination are rejected, as are symlinks whose
/// targets point outside it.
pub fn unpack_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(decoder);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_path = entry.path().context("failed to get entry path")?;
        let entry_path_str = entry_path.to_string_lossy().into_owned();

        if entry_escapes(&entry_path) {
            bail!(
                "archive entry escapes destination directory: {}",
                entry_path_str
            );
        }
        let output_path = dest.join(entry_path.as_ref());

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::Link => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            tar::EntryType::Symlink => {
                #[cfg(unix)]
                {
                    if let Ok(Some(target)) = entry.link_name() {
                        if entry_escapes(&target) {
                            bail!(
                                "archive symlink target escapes destination directory: {} -> {}",
                                entry_path_str,
                                target.display()
                            );
                        }
                        std::os::unix::fs::symlink(target.as_ref(), &output_path).with_context(
                            || format!("failed to create symlink: {}", output_path.display()),
                        )?;
                    }
                }
                #[cfg(windows)]
                {
                    tracing::debug!("Skipping symlink on Windows: {}", entry_path_str);
                }
            }
            _ => {
                // Fifos, char devices and friends have no business in a
                // framework archive.
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path_str
                );
            }
        }
    }

    Ok(())
}

/// Whether an archive path (an entry or a link target) could resolve
/// outside the destination.
fn entry_escapes(path: &Path) -> bool {
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_tar_gz;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_unpack_creates_files() {
        let bytes = build_tar_gz(&[
            ("package.json", "{\"name\": \"libs\"}"),
            ("tools/esp32-arduino-libs/sdkconfig", "CONFIG_SPIRAM=y\n"),
        ]);

        let tmp = TempDir::new().unwrap();
        unpack_tar_gz(Cursor::new(bytes), tmp.path()).unwrap();

        assert!(tmp.path().join("package.json").is_file());
        let probe = tmp.path().join("tools/esp32-arduino-libs/sdkconfig");
        assert_eq!(
            std::fs::read_to_string(probe).unwrap(),
            "CONFIG_SPIRAM=y\n"
        );
    }

    #[test]
    fn test_unpack_bad_gzip() {
        let tmp = TempDir::new().unwrap();
        let result = unpack_tar_gz(Cursor::new(b"not a gzip stream".to_vec()), tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_escapes() {
        assert!(entry_escapes(Path::new("../evil.txt")));
        assert!(entry_escapes(Path::new("tools/../../evil.txt")));
        assert!(entry_escapes(Path::new("/etc/passwd")));
        assert!(!entry_escapes(Path::new("tools/sdkconfig")));
        assert!(!entry_escapes(Path::new("package.json")));
    }

    /// Archive with one regular file and one symlink entry.
    #[cfg(unix)]
    fn tar_gz_with_symlink(file: (&str, &str), link: (&str, &str)) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);

        let (path, contents) = file;
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();

        let (link_path, target) = link;
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder.append_link(&mut header, link_path, target).unwrap();

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_rejects_escaping_symlink_target() {
        let bytes = tar_gz_with_symlink(("package.json", "{}"), ("tools/link", "../../outside"));
        let tmp = TempDir::new().unwrap();
        let err = unpack_tar_gz(Cursor::new(bytes), tmp.path()).unwrap_err();
        assert!(err.to_string().contains("symlink target escapes"));

        let bytes = tar_gz_with_symlink(("package.json", "{}"), ("link", "/etc/passwd"));
        let tmp = TempDir::new().unwrap();
        let err = unpack_tar_gz(Cursor::new(bytes), tmp.path()).unwrap_err();
        assert!(err.to_string().contains("symlink target escapes"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_allows_symlink_within_tree() {
        let bytes = tar_gz_with_symlink(
            ("tools/sdkconfig", "CONFIG_SPIRAM=y\n"),
            ("tools/link", "sdkconfig"),
        );

        let tmp = TempDir::new().unwrap();
        unpack_tar_gz(Cursor::new(bytes), tmp.path()).unwrap();

        let link = tmp.path().join("tools/link");
        let meta = std::fs::symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "CONFIG_SPIRAM=y\n");
    }
}
