use std::path::{Path, PathBuf};

use dbupdates_common::{Error, Result};
use semver::Version;
use tracing::debug;

use crate::version::{UpdateVersion, parse_file_name};

/// A runnable update script found in the update directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// The file name, used as the ledger identifier.
    pub id: String,
    pub version: Version,
    pub qualifier: Option<String>,
    /// Lowercased extension without the leading dot.
    pub extension: String,
    pub path: PathBuf,
}

impl MigrationFile {
    /// Build a `MigrationFile` when `path` names a recognized script with a
    /// valid version prefix.
    pub fn from_path(path: &Path, extensions: &[String]) -> Option<Self> {
        let id = path.file_name()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
            return None;
        }

        let UpdateVersion { version, qualifier } = parse_file_name(&id)?;
        Some(Self {
            id,
            version,
            qualifier,
            extension,
            path: path.to_path_buf(),
        })
    }
}

/// List `dir` and return the runnable update scripts in ascending version
/// order. Files with an unrecognized extension or without a version prefix
/// are left out. Equal versions are ordered by file name.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<MigrationFile>> {
    let read_error = |e: std::io::Error| Error::Discovery {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let entries = std::fs::read_dir(dir).map_err(read_error)?;
    Ok(select(entries.map(|entry| entry.map(|e| e.path())), extensions))
}

/// Keep the update scripts among `paths` and sort them. An entry that
/// cannot be read is skipped; the rest of the directory still counts.
fn select<I>(paths: I, extensions: &[String]) -> Vec<MigrationFile>
where
    I: IntoIterator<Item = std::io::Result<PathBuf>>,
{
    let mut files = Vec::new();
    for path in paths {
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                debug!("skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match MigrationFile::from_path(&path, extensions) {
            Some(file) => files.push(file),
            None => debug!("ignoring non-update file {}", path.display()),
        }
    }

    files.sort_by(|a, b| {
        a.version
            .cmp_precedence(&b.version)
            .then_with(|| a.id.cmp(&b.id))
    });
    files
}
