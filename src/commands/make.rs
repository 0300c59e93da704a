use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::error::Error;
use crate::install::{InstallConfig, Installer};
use crate::makepkg::BuildTool;
use crate::package::{Package, render_spec_info};
use crate::pkgbuild::{BuildSpec, RecipeParser};
use crate::resolver::Resolver;
use crate::runtime::Runtime;

use super::config::Config;
use super::refuse_root;
use super::services::{build_makepkg, build_parser, build_resolver};

const RECIPE: &str = "PKGBUILD";

/// `make`/`M`: makepkg on `./PKGBUILD`, installing AUR dependencies first
/// when `-s`/`--syncdeps` is given.
#[tracing::instrument(skip(runtime, config))]
pub async fn make<R: Runtime + ?Sized>(runtime: &R, config: &Config, args: &[String]) -> Result<()> {
    refuse_root(runtime)?;
    let resolver = build_resolver(config)?;
    let makepkg = build_makepkg(config)?;
    let dir = runtime.current_dir()?;
    run_make(
        runtime,
        &resolver,
        &makepkg,
        &config.install_config(),
        &dir,
        args,
    )
    .await
}

pub(crate) async fn run_make<R: Runtime + ?Sized>(
    runtime: &R,
    resolver: &Resolver,
    build: &dyn BuildTool,
    install_config: &InstallConfig,
    dir: &Path,
    args: &[String],
) -> Result<()> {
    let spec = load_recipe(runtime, resolver.parser(), &dir.join(RECIPE)).await?;
    let pkg = Arc::new(Package::unbuilt(spec, dir.to_path_buf()));
    Installer::new(runtime, resolver, build, install_config)
        .make(&pkg, args)
        .await?;
    Ok(())
}

/// `make-info`/`Mi`: pacman-style details for each recipe, `./PKGBUILD` by
/// default. A file that cannot be read or parsed is reported and skipped.
#[tracing::instrument(skip(runtime, config))]
pub async fn make_info<R: Runtime + ?Sized>(
    runtime: &R,
    config: &Config,
    files: &[PathBuf],
) -> Result<()> {
    let parser = build_parser(config)?;
    let files = if files.is_empty() {
        vec![PathBuf::from(RECIPE)]
    } else {
        files.to_vec()
    };

    for (path, result) in run_make_info(runtime, &parser, &files).await {
        match result {
            Ok(out) => print!("{}", out),
            Err(err) => eprintln!("error: {}: {:#}", path.display(), err),
        }
    }
    Ok(())
}

pub(crate) async fn run_make_info<R: Runtime + ?Sized>(
    runtime: &R,
    parser: &dyn RecipeParser,
    files: &[PathBuf],
) -> Vec<(PathBuf, Result<String>)> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let rendered = load_recipe(runtime, parser, path)
            .await
            .map(|spec| render_spec_info(None, &spec));
        results.push((path.clone(), rendered));
    }
    results
}

async fn load_recipe<R: Runtime + ?Sized>(
    runtime: &R,
    parser: &dyn RecipeParser,
    path: &Path,
) -> Result<BuildSpec> {
    let bytes = runtime
        .read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let spec = parser
        .parse(&bytes)
        .await
        .map_err(Error::from)
        .context("Error parsing PKGBUILD")?;
    Ok(spec)
}
