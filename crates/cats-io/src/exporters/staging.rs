use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Staging directory for all-or-nothing output.
///
/// Files are written under a hidden temp directory inside the output
/// directory (same filesystem, so the final rename is atomic per file).
/// Dropping an uncommitted stage removes everything written so far.
pub struct OutputStage {
    temp_dir: TempDir,
    final_dir: PathBuf,
    files: Vec<String>,
}

impl OutputStage {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let final_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&final_dir)
            .with_context(|| format!("creating output directory: {}", final_dir.display()))?;
        let temp_dir = tempfile::Builder::new()
            .prefix(".cats-staging-")
            .tempdir_in(&final_dir)
            .with_context(|| format!("creating staging directory in {}", final_dir.display()))?;
        Ok(Self {
            temp_dir,
            final_dir,
            files: Vec::new(),
        })
    }

    /// Path inside the staging directory for `file_name`; the file is
    /// included in the commit.
    pub fn path(&mut self, file_name: &str) -> PathBuf {
        if !self.files.iter().any(|name| name == file_name) {
            self.files.push(file_name.to_string());
        }
        self.temp_dir.path().join(file_name)
    }

    /// Move every staged file into the output directory, replacing files of
    /// the same name. Returns the final paths in staging order.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        for name in &self.files {
            let staged = self.temp_dir.path().join(name);
            if !staged.exists() {
                anyhow::bail!("staged output {} was never written", staged.display());
            }
        }
        let mut written = Vec::with_capacity(self.files.len());
        for name in &self.files {
            let staged = self.temp_dir.path().join(name);
            let target = self.final_dir.join(name);
            fs::rename(&staged, &target).with_context(|| {
                format!("moving {} -> {}", staged.display(), target.display())
            })?;
            written.push(target);
        }
        self.temp_dir
            .close()
            .context("removing staging directory")?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commit_moves_files_into_place() {
        let out = tempdir().unwrap();
        let mut stage = OutputStage::new(out.path()).unwrap();
        fs::write(stage.path("a.csv"), "x\n1\n").unwrap();
        fs::write(stage.path("b.csv"), "y\n2\n").unwrap();
        let written = stage.commit().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(out.path().join("a.csv")).unwrap(), "x\n1\n");
        let leftovers: Vec<_> = fs::read_dir(out.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".cats-staging-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn dropped_stage_writes_nothing() {
        let out = tempdir().unwrap();
        {
            let mut stage = OutputStage::new(out.path()).unwrap();
            fs::write(stage.path("a.csv"), "x\n").unwrap();
        }
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritten_file_blocks_commit() {
        let out = tempdir().unwrap();
        let mut stage = OutputStage::new(out.path()).unwrap();
        fs::write(stage.path("a.csv"), "x\n").unwrap();
        let _ = stage.path("b.csv");
        assert!(stage.commit().is_err());
        assert!(!out.path().join("a.csv").exists());
    }
}
