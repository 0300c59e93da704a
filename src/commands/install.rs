use anyhow::Result;

use crate::install::{InstallConfig, Installer};
use crate::makepkg::BuildTool;
use crate::resolver::Resolver;
use crate::runtime::Runtime;

use super::config::Config;
use super::refuse_root;
use super::services::{build_makepkg, build_resolver};

/// `install`/`S`: every name is resolved before anything is installed.
#[tracing::instrument(skip(runtime, config))]
pub async fn install<R: Runtime + ?Sized>(
    runtime: &R,
    config: &Config,
    names: &[String],
    args: &[String],
) -> Result<()> {
    refuse_root(runtime)?;
    let resolver = build_resolver(config)?;
    let makepkg = build_makepkg(config)?;
    run_install(
        runtime,
        &resolver,
        &makepkg,
        &config.install_config(),
        names,
        args,
    )
    .await
}

pub(crate) async fn run_install<R: Runtime + ?Sized>(
    runtime: &R,
    resolver: &Resolver,
    build: &dyn BuildTool,
    install_config: &InstallConfig,
    names: &[String],
    args: &[String],
) -> Result<()> {
    let pkgs = resolver.resolve_all(names).await?;
    Installer::new(runtime, resolver, build, install_config)
        .install_all(pkgs, args)
        .await
}
