//! Source-archive extraction.
//!
//! AUR snapshots are gzip-compressed tarballs whose entries live under a
//! `<pkgname>/` directory. Entries are read sequentially and written through
//! the [`Runtime`] so tests can observe or redirect every filesystem write.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use log::debug;
use tar::{Archive, EntryType};

use crate::runtime::Runtime;

/// Extracts a `.tar.gz` held in memory into `dest`.
///
/// Directory entries become directories, every other file entry is written
/// with the permission bits declared in its header. Returns the paths written.
#[tracing::instrument(skip(runtime, bytes))]
pub fn extract_tar_gz<R: Runtime + ?Sized>(
    runtime: &R,
    bytes: &[u8],
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let decoder = GzDecoder::new(Cursor::new(bytes));
    extract_tar(runtime, decoder, dest)
}

fn extract_tar<R: Runtime + ?Sized, T: Read>(
    runtime: &R,
    reader: T,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let mut archive = Archive::new(reader);
    let mut written = Vec::new();

    for entry in archive.entries().context("Failed to read archive")? {
        let mut entry = entry.context("Failed to read archive entry")?;
        let relative = entry.path().context("Invalid path in archive")?.into_owned();
        let target = dest.join(safe_relative(&relative)?);
        let header = entry.header();
        let kind = header.entry_type();

        match kind {
            EntryType::Directory => {
                runtime.create_dir_all(&target)?;
            }
            EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
                let mode = header.mode().unwrap_or(0o644);
                if let Some(parent) = target.parent() {
                    runtime.create_dir_all(parent)?;
                }
                let mut file = runtime.create_file(&target)?;
                std::io::copy(&mut entry, &mut file)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                drop(file);
                runtime.set_permissions(&target, mode)?;
                written.push(target);
            }
            // pax headers carry metadata only
            EntryType::XGlobalHeader | EntryType::XHeader => {}
            other => {
                debug!("Skipping {:?} entry {}", other, relative.display());
            }
        }
    }

    Ok(written)
}

/// Rejects entries that would land outside the destination directory.
fn safe_relative(path: &Path) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => bail!("Refusing to extract unsafe path {}", path.display()),
        }
    }
    Ok(clean)
}
