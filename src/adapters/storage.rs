use crate::domain::model::StoredFile;
use crate::domain::ports::ArtifactStore;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

/// Artifact store backed by a single local directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so readers never see a partial file.
        let tmp_path = full_path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &full_path)?;
        Ok(())
    }

    /// Creation time where the filesystem reports one, modification time otherwise.
    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let created = metadata.created().or_else(|_| metadata.modified())?;
            files.push(StoredFile { name, created });
        }
        Ok(files)
    }
}
