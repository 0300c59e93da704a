//! Classifies package names into [`Package`] values.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::task::JoinSet;

use crate::aur::{LookupService, RemoteRecord};
use crate::error::Error;
use crate::package::{Package, strip_constraint};
use crate::pacman::PackageManager;
use crate::pkgbuild::RecipeParser;

/// Shared handles to the collaborators used to classify names. Cheap to
/// clone into spawned tasks.
#[derive(Clone)]
pub struct Resolver {
    pacman: Arc<dyn PackageManager>,
    aur: Arc<dyn LookupService>,
    parser: Arc<dyn RecipeParser>,
}

impl Resolver {
    pub fn new(
        pacman: Arc<dyn PackageManager>,
        aur: Arc<dyn LookupService>,
        parser: Arc<dyn RecipeParser>,
    ) -> Self {
        Self {
            pacman,
            aur,
            parser,
        }
    }

    pub fn pacman(&self) -> &dyn PackageManager {
        self.pacman.as_ref()
    }

    pub fn aur(&self) -> &dyn LookupService {
        self.aur.as_ref()
    }

    pub fn parser(&self) -> &dyn RecipeParser {
        self.parser.as_ref()
    }

    /// Official repositories first, then the AUR. AUR packages have their
    /// PKGBUILD fetched and evaluated here.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<Arc<Package>> {
        let name = strip_constraint(name);

        if self.pacman.in_sync_db(name).await {
            debug!("{} is in the sync database", name);
            return Ok(Arc::new(Package::repo(name)));
        }

        match self.aur.info(name).await? {
            Some(record) => Ok(Arc::new(self.source_package(record).await?)),
            None => Err(Error::NotFound(name.to_string()).into()),
        }
    }

    /// Builds an AUR package from its RPC record.
    pub async fn source_package(&self, record: RemoteRecord) -> Result<Package> {
        let recipe = self.aur.recipe(&record.name).await?;
        let spec = self
            .parser
            .parse(&recipe)
            .await
            .map_err(Error::from)
            .with_context(|| format!("Error parsing {}'s PKGBUILD", record.name))?;
        Ok(Package::source(record, spec))
    }

    /// A package known only from the local database.
    pub async fn local(&self, name: &str) -> Result<Arc<Package>> {
        if !self.pacman.is_installed(name).await {
            return Err(Error::NotFound(format!("{} (not installed)", name)).into());
        }
        Ok(Arc::new(Package::local(name)))
    }

    /// Resolves every name, failing on the first one that cannot be resolved.
    /// Lookups run concurrently; the result keeps the input order.
    pub async fn resolve_all(&self, names: &[String]) -> Result<Vec<Arc<Package>>> {
        let mut tasks = JoinSet::new();
        for (idx, name) in names.iter().enumerate() {
            let resolver = self.clone();
            let name = name.clone();
            tasks.spawn(async move { (idx, resolver.resolve(&name).await) });
        }

        let mut found = Vec::with_capacity(names.len());
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = joined.context("resolver task panicked")?;
            found.push((idx, result?));
        }
        found.sort_by_key(|(idx, _)| *idx);
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }

    /// Resolution used for dependencies: anything that is neither in a
    /// remote source nor installed is skipped with a warning.
    pub async fn resolve_dependency(&self, name: &str) -> Option<Arc<Package>> {
        let name = strip_constraint(name);
        match self.resolve(name).await {
            Ok(pkg) => Some(pkg),
            Err(err) => {
                debug!("Could not resolve {} remotely: {:#}", name, err);
                match self.local(name).await {
                    Ok(pkg) => Some(pkg),
                    Err(_) => {
                        warn!("Could not find dependency {}, skipping.", name);
                        None
                    }
                }
            }
        }
    }

    /// Resolves dependency names concurrently, one task per name.
    pub async fn resolve_dependencies(&self, names: &[String]) -> Vec<Arc<Package>> {
        let mut tasks = JoinSet::new();
        for (idx, name) in names.iter().enumerate() {
            let resolver = self.clone();
            let name = name.clone();
            tasks.spawn(async move { (idx, resolver.resolve_dependency(&name).await) });
        }

        let mut found = Vec::with_capacity(names.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Some(pkg))) => found.push((idx, pkg)),
                Ok((_, None)) => {}
                Err(err) => warn!("Dependency lookup task failed: {}", err),
            }
        }
        found.sort_by_key(|(idx, _)| *idx);
        found.into_iter().map(|(_, p)| p).collect()
    }
}
