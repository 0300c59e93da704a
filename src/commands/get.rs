use std::path::Path;

use anyhow::Result;
use log::{info, warn};

use crate::archive::extract_tar_gz;
use crate::aur::LookupService;
use crate::runtime::Runtime;

use super::config::Config;
use super::services::build_aur;

/// `get`/`G`: unpack source snapshots into the current directory.
#[tracing::instrument(skip(runtime, config))]
pub async fn get<R: Runtime + ?Sized>(runtime: &R, config: &Config, names: &[String]) -> Result<()> {
    let aur = build_aur(config)?;
    let dest = runtime.current_dir()?;
    run_get(runtime, &aur, &dest, names).await;
    Ok(())
}

/// Packages that fail to download or unpack are skipped with a warning.
pub(crate) async fn run_get<R: Runtime + ?Sized>(
    runtime: &R,
    aur: &dyn LookupService,
    dest: &Path,
    names: &[String],
) {
    for name in names {
        let archive = match aur.source_archive(name).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to get source tar for {} ({:#}). Skipping...", name, err);
                continue;
            }
        };
        match extract_tar_gz(runtime, &archive, dest) {
            Ok(files) => info!("Extracted {} files for {}", files.len(), name),
            Err(err) => warn!("Failed to extract {} ({:#}). Skipping...", name, err),
        }
    }
}
