//! Scratch-file cleanup.
//!
//! Every scratch file is owned by a [`TempPath`], so it disappears even on
//! panic or early return. The janitor closes them explicitly after the
//! assembler has finished so deletion failures are logged instead of being
//! swallowed by `Drop`.

use std::io::ErrorKind;

use tempfile::TempPath;

use crate::assemble::ConcatManifest;
use crate::model::SourceAsset;

/// Removes a run's downloads and manifest. Never touches published artifacts.
pub struct Janitor;

impl Janitor {
    /// Delete every asset's scratch file and the manifest, if any.
    ///
    /// Returns the number of files removed.
    pub fn sweep(assets: Vec<SourceAsset>, manifest: Option<ConcatManifest>) -> usize {
        let mut removed = 0;

        for asset in assets {
            if Self::remove(asset.file, "download") {
                removed += 1;
            }
        }

        if let Some(manifest) = manifest {
            if Self::remove(manifest.into_temp_path(), "manifest") {
                removed += 1;
            }
        }

        tracing::debug!("Janitor removed {removed} scratch file(s)");
        removed
    }

    fn remove(file: TempPath, kind: &str) -> bool {
        let shown = file.display().to_string();
        match file.close() {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!("Failed to remove scratch {kind} {shown}: {e}");
                false
            }
        }
    }
}
