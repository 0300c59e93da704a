//! The build tool seam.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::Error;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Build the recipe in `dir`, attached to the terminal.
    async fn build(&self, dir: &Path, args: &[String]) -> Result<()>;
}

pub struct Makepkg {
    path: PathBuf,
}

impl Makepkg {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BuildTool for Makepkg {
    #[tracing::instrument(skip(self))]
    async fn build(&self, dir: &Path, args: &[String]) -> Result<()> {
        debug!("Running makepkg {:?} in {}", args, dir.display());
        let status = Command::new(&self.path)
            .args(args)
            .current_dir(dir)
            .status()
            .await
            .map_err(|e| Error::process("makepkg", e))?;
        if !status.success() {
            return Err(Error::process("makepkg", status).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_build_runs_in_directory() {
        let Ok(sh) = which::which("sh") else { return };
        let dir = tempdir().unwrap();

        // `sh -c 'touch built'` stands in for makepkg.
        let tool = Makepkg::new(sh);
        tool.build(
            dir.path(),
            &["-c".to_string(), "touch built".to_string()],
        )
        .await
        .unwrap();

        assert!(dir.path().join("built").exists());
    }

    #[tokio::test]
    async fn test_build_failure_is_process_error() {
        let Ok(no) = which::which("false") else { return };
        let dir = tempdir().unwrap();

        let err = Makepkg::new(no).build(dir.path(), &[]).await.unwrap_err();
        assert!(err.to_string().starts_with("makepkg failed"));
    }
}
