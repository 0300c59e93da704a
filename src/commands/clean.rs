use std::path::Path;

use anyhow::Result;

use crate::pacman::PackageManager;
use crate::runtime::Runtime;

use super::config::Config;
use super::services::build_pacman;

/// `clean`/`Scc`: pacman's cache clean, then an offer to drop the staging root.
#[tracing::instrument(skip(runtime, config))]
pub async fn clean<R: Runtime + ?Sized>(runtime: &R, config: &Config) -> Result<()> {
    let pacman = build_pacman(config)?;
    run_clean(runtime, &pacman, &config.tmp_root).await
}

pub(crate) async fn run_clean<R: Runtime + ?Sized>(
    runtime: &R,
    pacman: &dyn PackageManager,
    tmp_root: &Path,
) -> Result<()> {
    pacman.clean_cache().await?;

    println!();
    println!("TmpDir: {}", tmp_root.display());
    if runtime.confirm("Do you want to remove TmpDir?", false)? {
        println!("removing TmpDir...");
        if runtime.exists(tmp_root) {
            runtime.remove_dir_all(tmp_root)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacman::MockPackageManager;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_removes_tmp_root_when_confirmed() {
        let mut pm = MockPackageManager::new();
        pm.expect_clean_cache().times(1).returning(|| Ok(()));

        let mut runtime = MockRuntime::new();
        runtime
            .expect_confirm()
            .withf(|_, default| !*default)
            .returning(|_, _| Ok(true));
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_remove_dir_all()
            .with(eq(PathBuf::from("/tmp/pacrs-1000")))
            .times(1)
            .returning(|_| Ok(()));

        run_clean(&runtime, &pm, Path::new("/tmp/pacrs-1000"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_keeps_tmp_root_by_default() {
        let mut pm = MockPackageManager::new();
        pm.expect_clean_cache().returning(|| Ok(()));

        let mut runtime = MockRuntime::new();
        runtime.expect_confirm().returning(|_, default| Ok(default));
        runtime.expect_remove_dir_all().never();

        run_clean(&runtime, &pm, Path::new("/tmp/pacrs-1000"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cache_clean_failure_stops() {
        let mut pm = MockPackageManager::new();
        pm.expect_clean_cache()
            .returning(|| Err(anyhow::anyhow!("Could not find sudo or su.")));

        let mut runtime = MockRuntime::new();
        runtime.expect_confirm().never();

        assert!(
            run_clean(&runtime, &pm, Path::new("/tmp/pacrs-1000"))
                .await
                .is_err()
        );
    }
}
