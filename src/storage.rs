use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;


const MODULE: &str = "STORAGE";


/// Byte-addressable file store backing the `/files` routes.
///
/// Implementations are shared by every worker and must not assume any
/// coordination between concurrent readers and writers of the same name.
pub trait Storage: Sync + Send {
    /// Read the whole file called `name`.
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Create (or truncate) the file called `name` and write `data` to it.
    fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;
}


/// Files stored under a root directory. Without a root nothing can be found
/// and nothing can be created.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: Option<PathBuf>,
}

impl DirStorage {
    pub fn new(root: Option<PathBuf>) -> Self {
        DirStorage { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Joins `name` to the root, refusing names that could leave it.
    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let root = self.root.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no storage directory configured")
        })?;
        let relative = Path::new(name);
        let confined = !name.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("file name `{}` escapes the storage directory", name),
            ));
        }
        Ok(root.join(relative))
    }
}

impl Storage for DirStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name).map_err(StorageError::Open)?;
        let mut file = File::open(&path).map_err(StorageError::Open)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(StorageError::Read)?;
        debug!("[{}] Read {} bytes from {}", MODULE, data.len(), path.display());
        Ok(data)
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name).map_err(StorageError::Create)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(StorageError::Create)?;
        file.write_all(data).map_err(StorageError::Write)?;
        file.flush().map_err(StorageError::Write)?;
        debug!("[{}] Wrote {} bytes to {}", MODULE, data.len(), path.display());
        Ok(())
    }
}
