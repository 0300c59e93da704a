use anyhow::Result;
use futures_util::future::join_all;

use crate::aur::{LookupService, RemoteRecord};
use crate::pacman::PackageManager;

use super::config::Config;
use super::services::{build_aur, build_pacman};

/// `search`/`Ss`: official results from pacman, followed by AUR matches.
#[tracing::instrument(skip(config))]
pub async fn search(config: &Config, args: &[String], quiet: bool) -> Result<()> {
    let pacman = build_pacman(config)?;
    let aur = build_aur(config)?;
    let out = run_search(&pacman, &aur, args, quiet).await?;
    print!("{}", out);
    Ok(())
}

/// Runs both searches concurrently and returns the AUR listing. pacman
/// prints its own results directly.
pub(crate) async fn run_search(
    pacman: &dyn PackageManager,
    aur: &dyn LookupService,
    args: &[String],
    quiet: bool,
) -> Result<String> {
    let keywords = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let mut pacman_args = Vec::with_capacity(args.len() + 1);
    if quiet {
        pacman_args.push("-q".to_string());
    }
    pacman_args.extend(args.iter().cloned());

    let (searched, found) = tokio::join!(pacman.search(&pacman_args), aur.search(&keywords));
    searched?;
    let records = found?;

    let installed = join_all(records.iter().map(|r| pacman.is_installed(&r.name))).await;
    Ok(render_results(&records, &installed, quiet))
}

fn render_results(records: &[RemoteRecord], installed: &[bool], quiet: bool) -> String {
    let mut out = String::new();
    for (record, &installed) in records.iter().zip(installed) {
        if quiet {
            out.push_str(&record.name);
            out.push('\n');
            continue;
        }
        let marker = if installed { " [installed]" } else { "" };
        out.push_str(&format!(
            "aur/{} {}{}\n    {}\n",
            record.name,
            record.version,
            marker,
            record.description.as_deref().unwrap_or_default()
        ));
    }
    out
}
