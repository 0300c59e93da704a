use anyhow::Result;

use crate::resolver::Resolver;

use super::config::Config;
use super::services::build_resolver;

/// `info`/`Si`
#[tracing::instrument(skip(config))]
pub async fn info(config: &Config, names: &[String], args: &[String]) -> Result<()> {
    let resolver = build_resolver(config)?;
    run_info(&resolver, names, args).await
}

pub(crate) async fn run_info(resolver: &Resolver, names: &[String], args: &[String]) -> Result<()> {
    for pkg in resolver.resolve_all(names).await? {
        pkg.info(resolver, args).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aur::MockLookupService;
    use crate::pacman::{Database, MockPackageManager};
    use crate::pkgbuild::MockRecipeParser;
    use crate::test_utils::{record, spec};
    use mockall::predicate::eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_repo_info_goes_to_pacman() {
        let mut pm = MockPackageManager::new();
        pm.expect_in_sync_db().returning(|name| name == "bash");
        pm.expect_print_info()
            .withf(|db, name, args| *db == Database::Sync && name == "bash" && args == ["-i"])
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut aur = MockLookupService::new();
        aur.expect_info()
            .with(eq("yay"))
            .returning(|_| Ok(Some(record("yay", "12.0-1"))));
        aur.expect_recipe().returning(|_| Ok(Vec::new()));
        let mut parser = MockRecipeParser::new();
        parser.expect_parse().returning(|_| Ok(spec("yay", &[], &[])));

        let resolver = Resolver::new(Arc::new(pm), Arc::new(aur), Arc::new(parser));
        run_info(
            &resolver,
            &["bash".to_string(), "yay".to_string()],
            &["-i".to_string()],
        )
        .await
        .unwrap();
    }
}
