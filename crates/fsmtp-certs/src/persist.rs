//! Replace-on-commit PEM file writes

use fsmtp_common::MintError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Mode for private key files
pub const KEY_FILE_MODE: u32 = 0o600;

/// Mode for certificate files
pub const CERT_FILE_MODE: u32 = 0o644;

/// Contents written next to their destination, not yet visible there
pub struct StagedFile {
    temp: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    /// Write `contents` to a temp file in the destination's directory.
    ///
    /// Nothing at `path` changes until [`StagedFile::commit`]. Dropping an
    /// uncommitted file removes the temp file.
    pub fn stage(path: &Path, contents: &[u8], mode: u32) -> Result<Self, MintError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".fsmtp-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| persistence(path, e))?;

        temp.write_all(contents).map_err(|e| persistence(path, e))?;
        temp.as_file().sync_all().map_err(|e| persistence(path, e))?;
        set_mode(&temp, mode).map_err(|e| persistence(path, e))?;

        debug!(path = %path.display(), temp = %temp.path().display(), "Staged file");

        Ok(Self {
            temp,
            path: path.to_path_buf(),
        })
    }

    /// Rename the staged file over the destination, replacing any old file
    pub fn commit(self) -> Result<PathBuf, MintError> {
        let path = self.path;
        self.temp
            .persist(&path)
            .map_err(|e| persistence(&path, e.error))?;
        Ok(path)
    }
}

fn persistence(path: &Path, source: std::io::Error) -> MintError {
    MintError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(unix)]
fn set_mode(temp: &NamedTempFile, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    temp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_temp: &NamedTempFile, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
