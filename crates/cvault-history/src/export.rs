use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::ExportError;

/// A named, content-bearing export ready to hand to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Content as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Host capability that receives exported artifacts.
///
/// A browser host would trigger a download; the CLI writes into a directory;
/// tests and embedders collect artifacts in memory.
pub trait ArtifactSink: Send + Sync {
    fn emit(&self, artifact: &Artifact) -> Result<(), ExportError>;
}

/// Writes each artifact as a file inside a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Where an artifact with `file_name` ends up.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, ExportError> {
        let plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\', '\0']);
        if !plain {
            return Err(ExportError::InvalidName(file_name.to_string()));
        }
        Ok(self.dir.join(file_name))
    }
}

impl ArtifactSink for DirectorySink {
    fn emit(&self, artifact: &Artifact) -> Result<(), ExportError> {
        let path = self.path_for(&artifact.file_name)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, &artifact.content)?;
        debug!(path = %path.display(), bytes = artifact.content.len(), "wrote artifact");
        Ok(())
    }
}

/// Keeps emitted artifacts in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().expect("lock poisoned").clone()
    }

    /// Drain everything emitted so far.
    pub fn take(&self) -> Vec<Artifact> {
        std::mem::take(&mut *self.artifacts.lock().expect("lock poisoned"))
    }
}

impl ArtifactSink for MemorySink {
    fn emit(&self, artifact: &Artifact) -> Result<(), ExportError> {
        self.artifacts
            .lock()
            .expect("lock poisoned")
            .push(artifact.clone());
        Ok(())
    }
}
