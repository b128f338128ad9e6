// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exported document on disk, deleted when dropped.

use std::path::Path;

use tempfile::TempPath;
use tracing::debug;
use uuid::Uuid;

use atlasprint_core::error::Result;
use atlasprint_core::{AtlasPrintError, DocumentType};

use crate::LOG_TARGET;

/// A uniquely named export file owned by one request.
#[derive(Debug)]
pub struct ExportArtifact {
    path: TempPath,
}

impl ExportArtifact {
    /// Reserve `<dir>/<composition>_<uuid>.pdf`. Nothing is created yet.
    pub fn allocate(dir: &Path, composition: &str) -> Result<Self> {
        let name = format!(
            "{}_{}.{}",
            file_stem(composition),
            Uuid::new_v4(),
            DocumentType::Pdf.extension()
        );
        let path = TempPath::try_from_path(dir.join(name))?;
        debug!(target: LOG_TARGET, path = %path.display(), "artifact allocated");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the whole document.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            AtlasPrintError::ArtifactRead(format!("{}: {e}", self.path.display()))
        })
    }

    /// Delete now, reporting failures that drop would swallow.
    pub fn close(self) -> Result<()> {
        self.path.close()?;
        Ok(())
    }
}

/// Composition names come from the request; keep them inside `dir`.
fn file_stem(composition: &str) -> String {
    composition
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_per_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let a = ExportArtifact::allocate(dir.path(), "sheet").unwrap();
        let b = ExportArtifact::allocate(dir.path(), "sheet").unwrap();
        assert_ne!(a.path(), b.path());

        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sheet_"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(a.path().parent(), Some(dir.path()));
    }

    #[test]
    fn relative_export_dir_is_made_absolute() {
        let artifact = ExportArtifact::allocate(Path::new("exports"), "sheet").unwrap();
        assert!(artifact.path().is_absolute());
        assert!(artifact.path().ends_with(
            Path::new("exports").join(artifact.path().file_name().unwrap())
        ));
        assert!(!artifact.exists());
    }

    #[test]
    fn drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact::allocate(dir.path(), "sheet").unwrap();
        std::fs::write(artifact.path(), b"%PDF-").unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(artifact.read().unwrap(), b"%PDF-");

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn unreadable_artifact_is_artifact_read() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact::allocate(dir.path(), "sheet").unwrap();
        std::fs::create_dir(artifact.path()).unwrap();

        let err = artifact.read().unwrap_err();
        assert!(matches!(err, AtlasPrintError::ArtifactRead(_)));
        assert!(!artifact.exists());
    }

    #[test]
    fn close_reports_success_once_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact::allocate(dir.path(), "sheet").unwrap();
        std::fs::write(artifact.path(), b"x").unwrap();
        let path = artifact.path().to_path_buf();
        artifact.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn hostile_names_stay_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact::allocate(dir.path(), "../../etc/passwd").unwrap();
        assert_eq!(artifact.path().parent(), Some(dir.path()));
        assert!(!artifact.path().to_string_lossy().contains(".."));
    }
}
