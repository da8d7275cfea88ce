//! Zip helpers: every intermediate and result table is stored compressed.
//! Gzip is read too, since that is what the classifier writes its
//! predictions as.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::IoError;

/// Read a text file, a `.gz` file, or the first entry of a `.zip` archive.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::ReadFile`] | A compressed stream cannot be decoded |
/// | [`IoError::Archive`] | The archive is corrupt |
/// | [`IoError::EmptyArchive`] | The archive has no entry |
pub fn read_text(path: &Path) -> Result<String, IoError> {
    if !has_extension(path, "zip") && !has_extension(path, "gz") {
        return fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        });
    }

    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let decode_err = |e| IoError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    };
    let mut text = String::new();
    if has_extension(path, "gz") {
        GzDecoder::new(file)
            .read_to_string(&mut text)
            .map_err(decode_err)?;
        return Ok(text);
    }

    let archive_err = |source| IoError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
    if archive.is_empty() {
        return Err(IoError::EmptyArchive {
            path: path.to_path_buf(),
        });
    }
    let mut entry = archive.by_index(0).map_err(archive_err)?;
    entry.read_to_string(&mut text).map_err(decode_err)?;
    Ok(text)
}

/// Write `content` as the single entry `entry_name` of a new archive at
/// `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`IoError::WriteFile`] or [`IoError::Archive`] if the archive
/// cannot be written.
pub fn write_zipped(path: &Path, entry_name: &str, content: &[u8]) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let archive_err = |source| IoError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(entry_name, options).map_err(archive_err)?;
    zip.write_all(content).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    zip.finish().map_err(archive_err)?;
    debug!(path = %path.display(), bytes = content.len(), "archive written");
    Ok(())
}

/// Compress `plain` into `<plain>.zip` and delete `plain`.
///
/// A plain file that cannot be deleted is left behind with a warning; the
/// archive is still returned.
///
/// # Errors
///
/// Fails if `plain` cannot be read or the archive cannot be written.
pub fn compress_and_remove(plain: &Path) -> Result<PathBuf, IoError> {
    let content = fs::read(plain).map_err(|e| IoError::FileNotFound {
        path: plain.to_path_buf(),
        source: e,
    })?;
    let entry_name = plain
        .file_name()
        .map_or_else(|| "data".to_string(), |n| n.to_string_lossy().into_owned());
    let zipped = zipped_path(plain);
    write_zipped(&zipped, &entry_name, &content)?;
    if let Err(e) = fs::remove_file(plain) {
        warn!(path = %plain.display(), error = %e, "could not remove uncompressed file");
    }
    Ok(zipped)
}

/// `path` with `.zip` appended to its file name.
pub fn zipped_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".zip");
    PathBuf::from(name)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
