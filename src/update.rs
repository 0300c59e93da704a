//! Finding and applying AUR updates for installed foreign packages.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::task::JoinSet;

use crate::install::Installer;
use crate::package::Package;
use crate::pacman::installed_as_dependency;
use crate::resolver::Resolver;
use crate::runtime::Runtime;
use crate::vercmp::{VersionComparator, is_newer};

pub struct UpdateScanner {
    resolver: Resolver,
    comparator: Arc<dyn VersionComparator>,
    rebuild_vcs: bool,
}

impl UpdateScanner {
    /// With `rebuild_vcs`, VCS packages are always reported since their
    /// recipe version says nothing about the upstream head.
    pub fn new(resolver: Resolver, comparator: Arc<dyn VersionComparator>, rebuild_vcs: bool) -> Self {
        Self {
            resolver,
            comparator,
            rebuild_vcs,
        }
    }

    /// AUR packages that should be reinstalled, sorted by name. The first
    /// failing lookup aborts the scan.
    #[tracing::instrument(skip(self))]
    pub async fn scan(&self) -> Result<Vec<Arc<Package>>> {
        let names = self.resolver.pacman().list_foreign().await?;
        debug!("Checking {} foreign packages", names.len());

        let mut tasks = JoinSet::new();
        for name in names {
            let resolver = self.resolver.clone();
            let comparator = self.comparator.clone();
            let rebuild_vcs = self.rebuild_vcs;
            tasks.spawn(async move {
                check(&resolver, comparator.as_ref(), rebuild_vcs, &name)
                    .await
                    .with_context(|| format!("Failed to check {} for updates", name))
            });
        }

        let mut updates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.context("update check panicked")? {
                Ok(Some(pkg)) => updates.push(pkg),
                Ok(None) => {}
                Err(err) => {
                    tasks.abort_all();
                    return Err(err);
                }
            }
        }

        updates.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(updates)
    }
}

async fn check(
    resolver: &Resolver,
    comparator: &dyn VersionComparator,
    rebuild_vcs: bool,
    name: &str,
) -> Result<Option<Arc<Package>>> {
    let Some(record) = resolver.aur().info(name).await? else {
        debug!("{} is not in the AUR", name);
        return Ok(None);
    };

    // VCS packages are included on their recipe alone; the version check
    // only runs for everything else.
    let mut pkg = None;
    if rebuild_vcs {
        let source = resolver.source_package(record.clone()).await?;
        let is_vcs = match &source {
            Package::Source(s) => s.spec().await.is_vcs(),
            _ => false,
        };
        if is_vcs {
            debug!("{} is a VCS package, rebuilding", name);
            return Ok(Some(Arc::new(source)));
        }
        pkg = Some(source);
    }

    let installed = Package::local(name).version(resolver).await?;
    if !is_newer(comparator, &record.version, &installed).await? {
        return Ok(None);
    }

    let pkg = match pkg {
        Some(pkg) => pkg,
        None => resolver.source_package(record).await?,
    };
    Ok(Some(Arc::new(pkg)))
}

/// Installs each update, keeping its install reason. Failures are reported
/// and the remaining updates still run.
pub async fn apply_updates<R: Runtime + ?Sized>(
    installer: &Installer<'_, R>,
    resolver: &Resolver,
    updates: &[Arc<Package>],
) -> Result<()> {
    for pkg in updates {
        let as_deps = match installed_as_dependency(resolver.pacman(), pkg.name()).await {
            Ok(dep) => dep,
            Err(err) => {
                warn!("Could not read install reason of {}: {:#}", pkg.name(), err);
                false
            }
        };
        let args = if as_deps {
            vec!["--asdeps".to_string()]
        } else {
            Vec::new()
        };

        if let Err(err) = installer.install(pkg, &args).await {
            warn!("Update of {} failed ({:#}). Skipping.", pkg.name(), err);
        }
    }
    Ok(())
}
