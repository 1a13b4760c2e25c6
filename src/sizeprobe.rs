use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::model::SerializableState;

/// Temporary on-disk artifact that is removed on every exit path.
struct TempArtifact {
    path: PathBuf,
    removed: bool,
}

impl TempArtifact {
    fn new(path: PathBuf) -> TempArtifact {
        TempArtifact {
            path,
            removed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn remove(&mut self) -> std::io::Result<()> {
        let result = fs::remove_file(&self.path);
        if result.is_ok() {
            self.removed = true;
        }
        result
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.removed {
            // best effort; the file may never have been created
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Serialized byte size of a model's parameter state.
///
/// The state is written to a uniquely named file in the system temp
/// directory, measured, and the file is deleted again before returning, on
/// failure paths included. A deletion failure after a successful
/// measurement is logged but does not mask the measured size.
pub fn measure_size<M: SerializableState>(model: &M, label: &str) -> anyhow::Result<u64> {
    let state = model.state_dict();
    let path = std::env::temp_dir().join(format!("minuet-state-{}.bin", Uuid::new_v4()));
    let mut artifact = TempArtifact::new(path);

    let encoded = bincode::serialize(&state).context("could not serialize model state")?;
    fs::write(artifact.path(), &encoded)
        .with_context(|| format!("could not write {}", artifact.path().display()))?;
    let size = fs::metadata(artifact.path())
        .with_context(|| format!("could not stat {}", artifact.path().display()))?
        .len();

    if let Err(error) = artifact.remove() {
        log::warn!(
            "could not remove temporary state file {}: {}",
            artifact.path().display(),
            error
        );
    }

    println!("model: {} \t Size (KB): {}", label, size as f64 / 1e3);
    Ok(size)
}
