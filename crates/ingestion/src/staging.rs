//! Scratch copies of uploaded bytes
//!
//! Parsers that need a real path read from a [`StagedFile`]. The file is
//! deleted when the value is dropped, on success, error or unwind alike.

use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Write `bytes` to a new file named `docqa-*.{suffix}` in `dir`
    /// (the system temp dir when `None`).
    pub fn write(dir: Option<&Path>, suffix: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let suffix = format!(".{}", suffix);
        let mut builder = Builder::new();
        builder.prefix("docqa-").suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), size = bytes.len(), "Staged upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
