use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{CredentialError, CredentialResult};
use crate::domain::credential::CredentialRecord;

/// Persistence for the single platform credential record.
pub trait CredentialStore: Send + Sync {
    /// Load the record, `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> CredentialResult<Option<CredentialRecord>>;
    /// Replace the stored record as a whole.
    fn save(&self, record: &CredentialRecord) -> CredentialResult<()>;
}

/// JSON file holding the credential record.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> CredentialResult<Option<CredentialRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }

    fn save(&self, record: &CredentialRecord) -> CredentialResult<()> {
        let directory = self.directory();
        fs::create_dir_all(directory)?;

        // Written next to the target so the final rename stays on one filesystem.
        let mut file = NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut file, record)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|e| CredentialError::Io(e.error))?;
        Ok(())
    }
}
