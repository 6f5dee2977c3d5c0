//! Model artifact files

use crate::error::RegistryError;
use crate::model::DiamondModel;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ARTIFACT_EXTENSION: &str = "bin";

/// Artifact location for one (name, version) pair
pub fn artifact_path(dir: &Path, name: &str, version: u32) -> PathBuf {
    dir.join(format!("{}_v{}.{}", name, version, ARTIFACT_EXTENSION))
}

/// Summary of a written artifact
#[derive(Debug, Clone)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub checksum: String,
    pub size_bytes: usize,
}

/// Serialize `model` to `path` via a synced temporary file and a rename, so
/// the final path only ever holds a complete artifact.
pub fn write(path: &Path, model: &DiamondModel) -> Result<WrittenArtifact, RegistryError> {
    let bytes = bincode::serialize(model).map_err(|e| RegistryError::Serialization(e.to_string()))?;

    let temp_path = path.with_extension("tmp");
    let result = write_synced(&temp_path, &bytes).and_then(|_| {
        fs::rename(&temp_path, path).map_err(|e| RegistryError::io(path, e))
    });

    if let Err(e) = result {
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        return Err(e);
    }

    Ok(WrittenArtifact {
        path: path.to_path_buf(),
        checksum: compute_checksum(&bytes),
        size_bytes: bytes.len(),
    })
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), RegistryError> {
    let mut file = File::create(path).map_err(|e| RegistryError::io(path, e))?;
    file.write_all(bytes).map_err(|e| RegistryError::io(path, e))?;
    file.sync_all().map_err(|e| RegistryError::io(path, e))
}

/// Read and deserialize an artifact; absent or corrupt files are `NotFound`
pub fn read(path: &Path) -> Result<DiamondModel, RegistryError> {
    let bytes = fs::read(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "Artifact unreadable");
        RegistryError::NotFound(format!("Model artifact {} does not exist", path.display()))
    })?;

    bincode::deserialize(&bytes).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Artifact is corrupt");
        RegistryError::NotFound(format!("Model artifact {} could not be loaded", path.display()))
    })
}

/// Delete every artifact file directly under `dir`, returning how many were removed
pub fn remove_all(dir: &Path) -> Result<usize, RegistryError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(RegistryError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| RegistryError::io(dir, e))?.path();
        let is_artifact = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION);
        if is_artifact {
            fs::remove_file(&path).map_err(|e| RegistryError::io(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
