//! The package model.
//!
//! A [`Package`] is one of four variants depending on where it comes from.
//! All of them expose a name, a version and a lazily computed dependency
//! list; the dependency list is memoized in a [`OnceCell`] so concurrent
//! first readers share a single computation.

mod info;
mod order;

pub use info::render_spec_info;
pub use order::{install_order, sort_for_install};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::{OnceCell, RwLock};

use crate::aur::RemoteRecord;
use crate::pacman::{Database, scrape_depends, scrape_version};
use crate::pkgbuild::BuildSpec;
use crate::resolver::Resolver;

type Deps = OnceCell<Vec<Arc<Package>>>;

/// Install precedence. Lower kinds are installed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Local,
    Repo,
    Source,
    Unbuilt,
}

#[derive(Debug)]
pub enum Package {
    /// Available from an official repository.
    Repo(RepoPackage),
    /// Available from the AUR.
    Source(SourcePackage),
    /// Installed, with no known remote origin.
    Local(LocalPackage),
    /// A recipe on disk that has not been built yet.
    Unbuilt(UnbuiltPackage),
}

#[derive(Debug)]
pub struct RepoPackage {
    name: String,
    deps: Deps,
}

#[derive(Debug)]
pub struct SourcePackage {
    record: RemoteRecord,
    spec: RwLock<BuildSpec>,
    deps: Deps,
}

#[derive(Debug)]
pub struct LocalPackage {
    name: String,
    deps: Deps,
}

#[derive(Debug)]
pub struct UnbuiltPackage {
    spec: BuildSpec,
    recipe_dir: PathBuf,
    deps: Deps,
}

impl SourcePackage {
    /// A snapshot of the current recipe variables.
    pub async fn spec(&self) -> BuildSpec {
        self.spec.read().await.clone()
    }

    /// Replaces the recipe variables after the PKGBUILD was edited or rebuilt.
    pub async fn set_spec(&self, spec: BuildSpec) {
        *self.spec.write().await = spec;
    }
}

impl UnbuiltPackage {
    pub fn spec(&self) -> &BuildSpec {
        &self.spec
    }

    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }
}

impl Package {
    pub fn repo(name: impl Into<String>) -> Self {
        Package::Repo(RepoPackage {
            name: name.into(),
            deps: OnceCell::new(),
        })
    }

    /// A local package. Callers are expected to have checked it is installed;
    /// see [`Resolver::local`].
    pub fn local(name: impl Into<String>) -> Self {
        Package::Local(LocalPackage {
            name: name.into(),
            deps: OnceCell::new(),
        })
    }

    pub fn source(record: RemoteRecord, spec: BuildSpec) -> Self {
        Package::Source(SourcePackage {
            record,
            spec: RwLock::new(spec),
            deps: OnceCell::new(),
        })
    }

    pub fn unbuilt(spec: BuildSpec, recipe_dir: PathBuf) -> Self {
        Package::Unbuilt(UnbuiltPackage {
            spec,
            recipe_dir,
            deps: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Package::Repo(p) => &p.name,
            Package::Source(p) => &p.record.name,
            Package::Local(p) => &p.name,
            Package::Unbuilt(p) => &p.spec.name,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Package::Repo(_) => Kind::Repo,
            Package::Source(_) => Kind::Source,
            Package::Local(_) => Kind::Local,
            Package::Unbuilt(_) => Kind::Unbuilt,
        }
    }

    /// Full `[epoch:]ver-rel` version.
    pub async fn version(&self, resolver: &Resolver) -> Result<String> {
        match self {
            Package::Repo(p) => {
                let info = resolver.pacman().sync_info(&p.name).await?;
                scrape_version(&info)
                    .ok_or_else(|| anyhow!("Couldn't determine version of {}", p.name))
            }
            Package::Local(p) => {
                let info = resolver.pacman().local_info(&p.name).await?;
                scrape_version(&info)
                    .ok_or_else(|| anyhow!("Couldn't determine version of installed {}", p.name))
            }
            Package::Source(p) => Ok(p.record.version.clone()),
            Package::Unbuilt(p) => Ok(p.spec.version_string()),
        }
    }

    /// Dependency names as declared, version constraints still attached.
    pub async fn declared_dependencies(&self, resolver: &Resolver) -> Result<Vec<String>> {
        match self {
            Package::Repo(p) => Ok(scrape_depends(&resolver.pacman().sync_info(&p.name).await?)),
            Package::Local(p) => Ok(scrape_depends(
                &resolver.pacman().local_info(&p.name).await?,
            )),
            Package::Source(p) => Ok(p.spec.read().await.dependency_names()),
            Package::Unbuilt(p) => Ok(p.spec.dependency_names()),
        }
    }

    /// Resolved dependencies, computed on first use and cached afterwards.
    /// Names that resolve to nothing are skipped with a warning.
    pub async fn deps(&self, resolver: &Resolver) -> Result<&[Arc<Package>]> {
        let deps = self
            .deps_cell()
            .get_or_try_init(|| async {
                let names = self.declared_dependencies(resolver).await?;
                Ok::<_, anyhow::Error>(resolver.resolve_dependencies(&names).await)
            })
            .await?;
        Ok(deps.as_slice())
    }

    /// Prints the package's details to stdout.
    pub async fn info(&self, resolver: &Resolver, args: &[String]) -> Result<()> {
        match self {
            Package::Repo(p) => {
                resolver
                    .pacman()
                    .print_info(Database::Sync, &p.name, args)
                    .await
            }
            Package::Local(p) => {
                resolver
                    .pacman()
                    .print_info(Database::Local, &p.name, args)
                    .await
            }
            Package::Source(p) => {
                let spec = p.spec().await;
                print!("{}", render_spec_info(Some(&p.record), &spec));
                Ok(())
            }
            Package::Unbuilt(p) => {
                print!("{}", render_spec_info(None, &p.spec));
                Ok(())
            }
        }
    }

    fn deps_cell(&self) -> &Deps {
        match self {
            Package::Repo(p) => &p.deps,
            Package::Source(p) => &p.deps,
            Package::Local(p) => &p.deps,
            Package::Unbuilt(p) => &p.deps,
        }
    }
}

/// Strips a version constraint: `foo>=1.2` becomes `foo`.
pub fn strip_constraint(dep: &str) -> &str {
    match dep.find(['<', '>', '=']) {
        Some(idx) => &dep[..idx],
        None => dep,
    }
}
