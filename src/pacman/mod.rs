//! The system package manager seam.
//!
//! Everything pacrs asks of pacman goes through [`PackageManager`], so the
//! resolver and installer can be tested against a mock. The production
//! implementation lives in [`client`].

mod client;

pub use client::{Elevation, Pacman};

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::pkgbuild::NONE;

/// Which pacman database an info query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    /// `-Si`, the official repositories.
    Sync,
    /// `-Qi`, the installed packages.
    Local,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Silent `-Si`: true if an official repository carries `name`.
    async fn in_sync_db(&self, name: &str) -> bool;

    /// Silent `-Q`: true if `name` is installed.
    async fn is_installed(&self, name: &str) -> bool;

    /// Captured `-Si` output.
    async fn sync_info(&self, name: &str) -> Result<String>;

    /// Captured `-Qi` output.
    async fn local_info(&self, name: &str) -> Result<String>;

    /// Installed packages that no sync database knows (`-Qqm`).
    async fn list_foreign(&self) -> Result<Vec<String>>;

    /// `-Si`/`-Qi` printed straight to the terminal.
    async fn print_info(&self, db: Database, name: &str, args: &[String]) -> Result<()>;

    /// Elevated `-S` of several official packages in one transaction.
    async fn sync_install(&self, names: &[String], args: &[String]) -> Result<()>;

    /// Elevated `-U` of a built package file.
    async fn install_file(&self, path: &Path, as_deps: bool) -> Result<()>;

    /// `-Ss`. Finding nothing is not an error.
    async fn search(&self, args: &[String]) -> Result<()>;

    /// Elevated `-Su`, or `-Syu` when `refresh` is set.
    async fn system_upgrade(&self, refresh: bool, args: &[String]) -> Result<()>;

    /// Elevated `-Scc`.
    async fn clean_cache(&self) -> Result<()>;
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version\s+:\s+(.*)").expect("valid regex"));

static DEPENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Depends\s+On\s+:\s+(.*)").expect("valid regex"));

/// Pulls the `Version :` field out of `-Si`/`-Qi` output.
pub fn scrape_version(info: &str) -> Option<String> {
    VERSION_RE
        .captures(info)
        .map(|caps| caps[1].trim().to_string())
}

/// Pulls the `Depends On :` field out of `-Si`/`-Qi` output. `None` means empty.
pub fn scrape_depends(info: &str) -> Vec<String> {
    let Some(caps) = DEPENDS_RE.captures(info) else {
        return Vec::new();
    };

    caps[1]
        .split_whitespace()
        .filter(|dep| *dep != NONE)
        .map(str::to_string)
        .collect()
}

/// True if pacman records `name` as installed to satisfy another package.
pub async fn installed_as_dependency(pm: &dyn PackageManager, name: &str) -> Result<bool> {
    let info = pm.local_info(name).await?;
    Ok(info.contains("Installed as a dependency"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    const SYNC_INFO: &str = "Repository      : extra
Name            : curl
Version         : 8.5.0-1
Description     : command line tool and library for transferring data with URLs
Depends On      : ca-certificates  krb5  libssh2.so=1-64  openssl
Optional Deps   : None
";

    #[test]
    fn test_scrape_version() {
        assert_eq!(scrape_version(SYNC_INFO).as_deref(), Some("8.5.0-1"));
        assert_eq!(scrape_version("Name : x\n"), None);
    }

    #[test]
    fn test_scrape_depends() {
        assert_eq!(
            scrape_depends(SYNC_INFO),
            vec!["ca-certificates", "krb5", "libssh2.so=1-64", "openssl"]
        );
    }

    #[test]
    fn test_scrape_depends_none_is_empty() {
        let info = "Name : zlib\nDepends On      : None\n";
        assert!(scrape_depends(info).is_empty());
        assert!(scrape_depends("Name : zlib\n").is_empty());
    }

    #[tokio::test]
    async fn test_installed_as_dependency() {
        let mut pm = MockPackageManager::new();
        pm.expect_local_info()
            .with(eq("libfoo"))
            .returning(|_| Ok("Install Reason  : Installed as a dependency for another package\n".into()));
        pm.expect_local_info()
            .with(eq("foo"))
            .returning(|_| Ok("Install Reason  : Explicitly installed\n".into()));

        assert!(installed_as_dependency(&pm, "libfoo").await.unwrap());
        assert!(!installed_as_dependency(&pm, "foo").await.unwrap());
    }
}
