//! Version comparison through pacman's `vercmp`.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::error::Error;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionComparator: Send + Sync {
    /// Three-way comparison of two `[epoch:]ver-rel` strings.
    async fn compare(&self, a: &str, b: &str) -> Result<Ordering>;
}

/// True if `candidate` is strictly newer than `installed`.
pub async fn is_newer(
    cmp: &dyn VersionComparator,
    candidate: &str,
    installed: &str,
) -> Result<bool> {
    Ok(cmp.compare(candidate, installed).await? == Ordering::Greater)
}

pub struct Vercmp {
    path: PathBuf,
}

impl Vercmp {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// vercmp prints a negative, zero or positive integer.
fn parse_vercmp_output(out: &str) -> Result<Ordering> {
    let value: i64 = out
        .trim()
        .parse()
        .map_err(|_| Error::process("vercmp", format!("unexpected output {:?}", out.trim())))?;
    Ok(value.cmp(&0))
}

#[async_trait]
impl VersionComparator for Vercmp {
    #[tracing::instrument(skip(self))]
    async fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        let output = Command::new(&self.path)
            .arg(a)
            .arg(b)
            .output()
            .await
            .map_err(|e| Error::process("vercmp", e))?;
        if !output.status.success() {
            return Err(Error::process("vercmp", output.status).into());
        }
        parse_vercmp_output(&String::from_utf8_lossy(&output.stdout))
    }
}
