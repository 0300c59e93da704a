//! Package installation.
//!
//! Official packages are handed to pacman. AUR packages go through an
//! interactive protocol: reuse a cached build if the user agrees, otherwise
//! confirm, download and unpack the snapshot, offer to edit the PKGBUILD and
//! install script, install missing AUR dependencies recursively, then build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, info, warn};

use crate::archive::extract_tar_gz;
use crate::error::Error;
use crate::makepkg::BuildTool;
use crate::package::{Kind, Package, SourcePackage, sort_for_install};
use crate::pkgbuild::BuildSpec;
use crate::resolver::Resolver;
use crate::runtime::Runtime;

/// Settings the installer needs from the configuration.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Per-user staging root; each package gets `<tmp_root>/<name>/`.
    pub tmp_root: PathBuf,
    /// Package file extension makepkg produces, e.g. `.pkg.tar.zst`.
    pub pkg_ext: String,
    pub editor: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    /// The user declined.
    Skipped,
}

pub struct Installer<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    resolver: &'a Resolver,
    build: &'a dyn BuildTool,
    config: &'a InstallConfig,
}

fn wants_asdeps(args: &[String]) -> bool {
    args.iter().any(|a| a == "--asdeps")
}

impl<'a, R: Runtime + ?Sized> Installer<'a, R> {
    pub fn new(
        runtime: &'a R,
        resolver: &'a Resolver,
        build: &'a dyn BuildTool,
        config: &'a InstallConfig,
    ) -> Self {
        Self {
            runtime,
            resolver,
            build,
            config,
        }
    }

    /// Installs several packages requested on the command line.
    ///
    /// Official packages go to pacman in a single transaction. The rest are
    /// installed one at a time in install order; a failure is reported and
    /// the remaining packages are still attempted.
    #[tracing::instrument(skip(self, pkgs, args))]
    pub async fn install_all(&self, pkgs: Vec<Arc<Package>>, args: &[String]) -> Result<()> {
        let (repo, other): (Vec<_>, Vec<_>) =
            pkgs.into_iter().partition(|p| p.kind() == Kind::Repo);
        let repo_names: Vec<String> = repo.iter().map(|p| p.name().to_string()).collect();

        let sync = async {
            if repo_names.is_empty() {
                Ok(())
            } else {
                self.resolver.pacman().sync_install(&repo_names, args).await
            }
        };
        let (synced, sorted) = tokio::join!(sync, sort_for_install(other, self.resolver));
        synced?;

        for pkg in sorted? {
            if let Err(err) = self.install(&pkg, args).await {
                warn!("Installation of {} failed ({:#}). Skipping.", pkg.name(), err);
            }
        }
        Ok(())
    }

    /// Installs one package as if the user had asked for it by name.
    pub async fn install(&self, pkg: &Arc<Package>, args: &[String]) -> Result<Outcome> {
        match pkg.as_ref() {
            Package::Repo(_) => {
                self.resolver
                    .pacman()
                    .sync_install(&[pkg.name().to_string()], args)
                    .await?;
                Ok(Outcome::Installed)
            }
            Package::Local(_) => Err(Error::Invariant(format!(
                "{} is installed but has no known source",
                pkg.name()
            ))
            .into()),
            Package::Source(_) => {
                self.install_source(pkg, None, wants_asdeps(args), &[])
                    .await
            }
            Package::Unbuilt(_) => self.make(pkg, args).await,
        }
    }

    /// Builds a PKGBUILD on disk with makepkg, installing its AUR
    /// dependencies first when `-s`/`--syncdeps` is given.
    #[tracing::instrument(skip(self, pkg))]
    pub async fn make(&self, pkg: &Arc<Package>, args: &[String]) -> Result<Outcome> {
        let Package::Unbuilt(unbuilt) = pkg.as_ref() else {
            return Err(Error::Invariant(format!("{} is not a local PKGBUILD", pkg.name())).into());
        };

        let syncdeps = args.iter().any(|a| a == "-s" || a == "--syncdeps");
        if syncdeps && unbuilt.spec().has_deps() {
            let name = pkg.name().to_string();
            self.install_source_deps(pkg, &name, &[name.clone()]).await?;
        }

        self.build.build(unbuilt.recipe_dir(), args).await?;
        Ok(Outcome::Installed)
    }

    fn artifact_path(&self, build_dir: &Path, name: &str, spec: &BuildSpec) -> PathBuf {
        build_dir.join(format!(
            "{}-{}-{}{}",
            name,
            spec.version_string(),
            spec.local_arch(),
            self.config.pkg_ext
        ))
    }

    async fn reparse(&self, recipe: &Path, name: &str) -> Result<BuildSpec> {
        let bytes = self.runtime.read(recipe)?;
        let spec = self
            .resolver
            .parser()
            .parse(&bytes)
            .await
            .map_err(Error::from)
            .with_context(|| format!("Unable to reload PKGBUILD for {}", name))?;
        Ok(spec)
    }

    /// Installs the uninstalled AUR packages among `pkg`'s dependencies.
    async fn install_source_deps(
        &self,
        pkg: &Arc<Package>,
        name: &str,
        chain: &[String],
    ) -> Result<()> {
        let deps = pkg.deps(self.resolver).await?.to_vec();
        let deps = sort_for_install(deps, self.resolver).await?;

        for dep in &deps {
            if dep.kind() != Kind::Source {
                continue;
            }
            if self.resolver.pacman().is_installed(dep.name()).await {
                debug!("{} is already installed", dep.name());
                continue;
            }
            self.install_source(dep, Some(name), true, chain)
                .await
                .with_context(|| {
                    format!("Failed to install {}, a dependency of {}", dep.name(), name)
                })?;
        }
        Ok(())
    }

    /// The AUR install protocol. `chain` holds the packages currently being
    /// installed above this one.
    fn install_source<'b>(
        &'b self,
        pkg: &'b Arc<Package>,
        parent: Option<&'b str>,
        as_deps: bool,
        chain: &'b [String],
    ) -> BoxFuture<'b, Result<Outcome>> {
        async move {
            let Package::Source(source) = pkg.as_ref() else {
                return Err(
                    Error::Invariant(format!("{} is not an AUR package", pkg.name())).into(),
                );
            };
            let name = pkg.name().to_string();
            if chain.contains(&name) {
                warn!("Dependency cycle through {}, not installing it again.", name);
                return Ok(Outcome::Skipped);
            }

            let staging = self.config.tmp_root.join(&name);
            let build_dir = staging.join(&name);
            let recipe = build_dir.join("PKGBUILD");
            let mut spec = source.spec().await;
            let artifact = self.artifact_path(&build_dir, &name, &spec);

            if self.runtime.exists(&artifact) {
                let prompt = match parent {
                    None => format!(":: Found cached package for {}. Install?", name),
                    Some(p) => format!(
                        ":: Found cached package for {}. Install as dependency for {}?",
                        name, p
                    ),
                };
                if self.runtime.confirm(&prompt, true)? {
                    self.resolver
                        .pacman()
                        .install_file(&artifact, as_deps)
                        .await?;
                    return Ok(Outcome::Installed);
                }
            }

            let prompt = match parent {
                None => format!(":: Install {}?", name),
                Some(p) => format!(":: Install {} as a dependency for {}?", name, p),
            };
            if !self.runtime.confirm(&prompt, true)? {
                println!("Skipping {}...", name);
                return Ok(Outcome::Skipped);
            }

            println!("==> Installing {} from the AUR.", name);
            self.fetch(&name, &staging, &build_dir).await?;

            if let Some(editor) = &self.config.editor {
                if let Some(edited) = self.offer_edits(editor, source, &name, &build_dir).await? {
                    spec = edited;
                }
            }

            if spec.has_deps() {
                let mut chain = chain.to_vec();
                chain.push(name.clone());
                self.install_source_deps(pkg, &name, &chain).await?;
            }

            if parent.is_none() && !as_deps {
                self.build.build(&build_dir, &flags(&["-s", "-c", "-i"])).await?;
            } else {
                self.build.build(&build_dir, &flags(&["-s", "-c"])).await?;
                spec = self.reparse(&recipe, &name).await?;
                source.set_spec(spec.clone()).await;
                let built = self.artifact_path(&build_dir, &name, &spec);
                self.resolver.pacman().install_file(&built, true).await?;
            }

            info!("Installed {}", name);
            Ok(Outcome::Installed)
        }
        .boxed()
    }

    /// Downloads and unpacks the snapshot into a fresh build directory.
    async fn fetch(&self, name: &str, staging: &Path, build_dir: &Path) -> Result<()> {
        self.runtime.create_dir_all(staging)?;
        if self.runtime.exists(build_dir) {
            self.runtime.remove_dir_all(build_dir)?;
        }
        let archive = self.resolver.aur().source_archive(name).await?;
        extract_tar_gz(self.runtime, &archive, staging)
            .with_context(|| format!("Failed to unpack sources for {}", name))?;
        Ok(())
    }

    /// Offers the PKGBUILD and install script for editing. Returns the
    /// re-evaluated recipe if the PKGBUILD was changed.
    async fn offer_edits(
        &self,
        editor: &Path,
        source: &SourcePackage,
        name: &str,
        build_dir: &Path,
    ) -> Result<Option<BuildSpec>> {
        let editor_name = editor
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| editor.display().to_string());
        let recipe = build_dir.join("PKGBUILD");

        let mut edited = None;
        while self
            .runtime
            .confirm(&format!("Edit PKGBUILD using {}?", editor_name), false)?
        {
            self.runtime.edit(editor, &recipe)?;
            let spec = self.reparse(&recipe, name).await?;
            source.set_spec(spec.clone()).await;
            edited = Some(spec);
        }

        let spec = match &edited {
            Some(spec) => spec.clone(),
            None => source.spec().await,
        };
        if spec.has_install() {
            let script = build_dir.join(&spec.install);
            if self.runtime.exists(&script) {
                while self.runtime.confirm(
                    &format!(":: Edit {} using {}?", spec.install, editor_name),
                    false,
                )? {
                    self.runtime.edit(editor, &script)?;
                }
            } else {
                warn!("Can't find {} install script.", script.display());
            }
        }

        Ok(edited)
    }
}

fn flags(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}
