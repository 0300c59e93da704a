//! [`PackageManager`] backed by the real pacman binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use super::{Database, PackageManager};
use crate::error::Error;

/// How root privileges are obtained for transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    /// `sudo pacman args...`
    Sudo(PathBuf),
    /// `su -c "pacman args..."`
    Su(PathBuf),
}

pub struct Pacman {
    pacman: PathBuf,
    elevation: Option<Elevation>,
}

impl Pacman {
    pub fn new(pacman: PathBuf, elevation: Option<Elevation>) -> Self {
        Self { pacman, elevation }
    }

    fn program(&self) -> String {
        self.pacman
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pacman".to_string())
    }

    /// Program and argument vector for an elevated invocation.
    pub(crate) fn elevated_command(&self, args: &[String]) -> Result<(PathBuf, Vec<String>)> {
        let pacman = self.pacman.to_string_lossy().into_owned();
        match &self.elevation {
            Some(Elevation::Sudo(sudo)) => {
                let mut argv = Vec::with_capacity(args.len() + 1);
                argv.push(pacman);
                argv.extend(args.iter().cloned());
                Ok((sudo.clone(), argv))
            }
            Some(Elevation::Su(su)) => {
                let line = std::iter::once(pacman.as_str())
                    .chain(args.iter().map(String::as_str))
                    .map(shell_quote)
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok((su.clone(), vec!["-c".to_string(), line]))
            }
            None => Err(Error::process(self.program(), "Could not find sudo or su.").into()),
        }
    }

    /// Runs pacman attached to the terminal.
    async fn run(&self, args: &[String]) -> Result<()> {
        debug!("Running {} {:?}", self.pacman.display(), args);
        let status = Command::new(&self.pacman)
            .args(args)
            .status()
            .await
            .map_err(|e| Error::process(self.program(), e))?;
        if !status.success() {
            return Err(Error::process(self.program(), status).into());
        }
        Ok(())
    }

    /// Runs pacman with all output discarded, reporting only success.
    async fn succeeds(&self, args: &[&str]) -> bool {
        Command::new(&self.pacman)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Runs pacman and captures stdout. Output is forced to the C locale so
    /// field labels can be matched.
    async fn output(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.pacman)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::process(self.program(), e))?;
        if !output.status.success() {
            return Err(Error::process(self.program(), output.status).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_elevated(&self, args: &[String]) -> Result<()> {
        let (program, argv) = self.elevated_command(args)?;
        if matches!(self.elevation, Some(Elevation::Su(_))) {
            print!("Root ");
        }
        debug!("Running {} {:?}", program.display(), argv);
        let status = Command::new(&program)
            .args(&argv)
            .status()
            .await
            .map_err(|e| Error::process(program.display().to_string(), e))?;
        if !status.success() {
            return Err(Error::process(self.program(), status).into());
        }
        Ok(())
    }
}

/// Single-quotes a word for `su -c`.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn with_args(head: &[&str], tail: &[String]) -> Vec<String> {
    head.iter()
        .map(|s| s.to_string())
        .chain(tail.iter().cloned())
        .collect()
}

#[async_trait]
impl PackageManager for Pacman {
    async fn in_sync_db(&self, name: &str) -> bool {
        self.succeeds(&["-Si", "--", name]).await
    }

    async fn is_installed(&self, name: &str) -> bool {
        self.succeeds(&["-Q", "--", name]).await
    }

    #[tracing::instrument(skip(self))]
    async fn sync_info(&self, name: &str) -> Result<String> {
        self.output(&["-Si", "--", name])
            .await
            .with_context(|| format!("Failed to query {}", name))
    }

    #[tracing::instrument(skip(self))]
    async fn local_info(&self, name: &str) -> Result<String> {
        self.output(&["-Qi", "--", name])
            .await
            .with_context(|| format!("Failed to query installed {}", name))
    }

    #[tracing::instrument(skip(self))]
    async fn list_foreign(&self) -> Result<Vec<String>> {
        let out = self
            .output(&["-Qqm"])
            .await
            .context("Failed to list foreign packages")?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn print_info(&self, db: Database, name: &str, args: &[String]) -> Result<()> {
        let flag = match db {
            Database::Sync => "-Si",
            Database::Local => "-Qi",
        };
        let mut argv = with_args(&[flag], args);
        argv.push("--".to_string());
        argv.push(name.to_string());
        self.run(&argv).await
    }

    #[tracing::instrument(skip(self))]
    async fn sync_install(&self, names: &[String], args: &[String]) -> Result<()> {
        let mut argv = with_args(&["-S"], args);
        argv.push("--".to_string());
        argv.extend(names.iter().cloned());
        self.run_elevated(&argv).await
    }

    #[tracing::instrument(skip(self))]
    async fn install_file(&self, path: &Path, as_deps: bool) -> Result<()> {
        let mut argv = vec!["-U".to_string()];
        if as_deps {
            argv.push("--asdeps".to_string());
        }
        argv.push(path.to_string_lossy().into_owned());
        self.run_elevated(&argv).await
    }

    async fn search(&self, args: &[String]) -> Result<()> {
        let argv = with_args(&["-Ss"], args);
        let status = Command::new(&self.pacman)
            .args(&argv)
            .status()
            .await
            .map_err(|e| Error::process(self.program(), e))?;
        match status.code() {
            Some(0) | Some(1) => Ok(()),
            _ => Err(Error::process(self.program(), status).into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn system_upgrade(&self, refresh: bool, args: &[String]) -> Result<()> {
        let flag = if refresh { "-Syu" } else { "-Su" };
        self.run_elevated(&with_args(&[flag], args)).await
    }

    async fn clean_cache(&self) -> Result<()> {
        if self.elevation.is_none() {
            warn!("Could not find sudo or su.");
        }
        self.run_elevated(&["-Scc".to_string()]).await
    }
}
