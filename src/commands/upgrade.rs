use std::sync::Arc;

use anyhow::Result;

use crate::install::{InstallConfig, Installer};
use crate::makepkg::BuildTool;
use crate::resolver::Resolver;
use crate::runtime::Runtime;
use crate::update::{UpdateScanner, apply_updates};

use super::config::Config;
use super::refuse_root;
use super::services::{build_makepkg, build_resolver, build_vercmp};

#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    /// `-Syu` instead of `-Su`.
    pub refresh: bool,
    /// Rebuild VCS packages even when the AUR version is unchanged.
    pub upvcs: bool,
}

/// `upgrade`/`Su`: system upgrade through pacman, then AUR updates.
#[tracing::instrument(skip(runtime, config))]
pub async fn upgrade<R: Runtime + ?Sized>(
    runtime: &R,
    config: &Config,
    options: UpgradeOptions,
    args: &[String],
) -> Result<()> {
    refuse_root(runtime)?;
    let resolver = build_resolver(config)?;
    let makepkg = build_makepkg(config)?;
    let scanner = UpdateScanner::new(
        resolver.clone(),
        Arc::new(build_vercmp(config)?),
        options.upvcs,
    );
    run_upgrade(
        runtime,
        &resolver,
        &scanner,
        &makepkg,
        &config.install_config(),
        options.refresh,
        args,
    )
    .await
}

pub(crate) async fn run_upgrade<R: Runtime + ?Sized>(
    runtime: &R,
    resolver: &Resolver,
    scanner: &UpdateScanner,
    build: &dyn BuildTool,
    install_config: &InstallConfig,
    refresh: bool,
    args: &[String],
) -> Result<()> {
    let (upgraded, scanned) = tokio::join!(
        resolver.pacman().system_upgrade(refresh, args),
        scanner.scan()
    );
    upgraded?;

    println!();
    println!(":: Calculating AUR updates...");
    let updates = scanned?;
    if updates.is_empty() {
        println!(" there is nothing to do");
        return Ok(());
    }

    let names: Vec<&str> = updates.iter().map(|p| p.name()).collect();
    println!();
    println!("Targets ({}): {}", updates.len(), names.join(" "));
    println!();
    if !runtime.confirm("Proceed with installation?", true)? {
        return Ok(());
    }

    let installer = Installer::new(runtime, resolver, build, install_config);
    apply_updates(&installer, resolver, &updates).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aur::MockLookupService;
    use crate::makepkg::MockBuildTool;
    use crate::pacman::MockPackageManager;
    use crate::pkgbuild::MockRecipeParser;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{record, spec};
    use crate::vercmp::MockVersionComparator;
    use std::cmp::Ordering;
    use std::path::PathBuf;

    fn install_config() -> InstallConfig {
        InstallConfig {
            tmp_root: PathBuf::from("/tmp/pacrs-test"),
            pkg_ext: ".pkg.tar.zst".to_string(),
            editor: None,
        }
    }

    #[tokio::test]
    async fn test_nothing_to_do_skips_prompt() {
        let mut pm = MockPackageManager::new();
        pm.expect_system_upgrade()
            .withf(|refresh, args| *refresh && args.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));
        pm.expect_list_foreign().returning(|| Ok(Vec::new()));
        let resolver = Resolver::new(
            Arc::new(pm),
            Arc::new(MockLookupService::new()),
            Arc::new(MockRecipeParser::new()),
        );
        let scanner =
            UpdateScanner::new(resolver.clone(), Arc::new(MockVersionComparator::new()), false);

        let mut runtime = MockRuntime::new();
        runtime.expect_confirm().never();

        run_upgrade(
            &runtime,
            &resolver,
            &scanner,
            &MockBuildTool::new(),
            &install_config(),
            true,
            &[],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_declining_targets_installs_nothing() {
        let mut pm = MockPackageManager::new();
        pm.expect_system_upgrade().returning(|_, _| Ok(()));
        pm.expect_list_foreign()
            .returning(|| Ok(vec!["foo".to_string()]));
        pm.expect_local_info()
            .returning(|_| Ok("Version         : 1.0-1\n".to_string()));
        let mut aur = MockLookupService::new();
        aur.expect_info()
            .returning(|name| Ok(Some(record(name, "1.1-1"))));
        aur.expect_recipe().returning(|_| Ok(Vec::new()));
        aur.expect_source_archive().never();
        let mut parser = MockRecipeParser::new();
        parser.expect_parse().returning(|_| Ok(spec("foo", &[], &[])));
        let resolver = Resolver::new(Arc::new(pm), Arc::new(aur), Arc::new(parser));

        let mut cmp = MockVersionComparator::new();
        cmp.expect_compare().returning(|_, _| Ok(Ordering::Greater));
        let scanner = UpdateScanner::new(resolver.clone(), Arc::new(cmp), false);

        let mut runtime = MockRuntime::new();
        runtime
            .expect_confirm()
            .withf(|prompt, default| prompt == "Proceed with installation?" && *default)
            .times(1)
            .returning(|_, _| Ok(false));

        run_upgrade(
            &runtime,
            &resolver,
            &scanner,
            &MockBuildTool::new(),
            &install_config(),
            false,
            &[],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_failed_system_upgrade_is_an_error() {
        let mut pm = MockPackageManager::new();
        pm.expect_system_upgrade()
            .returning(|_, _| Err(anyhow::anyhow!("pacman failed: exit status: 1")));
        pm.expect_list_foreign().returning(|| Ok(Vec::new()));
        let resolver = Resolver::new(
            Arc::new(pm),
            Arc::new(MockLookupService::new()),
            Arc::new(MockRecipeParser::new()),
        );
        let scanner =
            UpdateScanner::new(resolver.clone(), Arc::new(MockVersionComparator::new()), false);

        let result = run_upgrade(
            &MockRuntime::new(),
            &resolver,
            &scanner,
            &MockBuildTool::new(),
            &install_config(),
            false,
            &[],
        )
        .await;
        assert!(result.is_err());
    }
}
