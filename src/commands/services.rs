//! Service factory.
//!
//! Builds the production collaborators (pacman, the AUR client, the recipe
//! parser, makepkg, vercmp) from a [`Config`]. Each builder fails with a
//! "Could not find ..." error when the program it wraps is missing, so a
//! command only requires the tools it actually uses.

use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;

use crate::aur::AurClient;
use crate::http::HttpClient;
use crate::makepkg::Makepkg;
use crate::pacman::Pacman;
use crate::pkgbuild::BashParser;
use crate::resolver::Resolver;
use crate::vercmp::Vercmp;

use super::config::Config;

const USER_AGENT: &str = concat!("pacrs/", env!("PACRS_VERSION"));

pub fn build_http_client() -> Result<HttpClient> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    Ok(HttpClient::new(client))
}

pub fn build_aur(config: &Config) -> Result<AurClient> {
    Ok(AurClient::new(
        build_http_client()?,
        Some(config.aur_url.clone()),
    ))
}

pub fn build_pacman(config: &Config) -> Result<Pacman> {
    Ok(Pacman::new(
        config.tools.pacman()?.to_path_buf(),
        config.tools.elevation.clone(),
    ))
}

pub fn build_parser(config: &Config) -> Result<BashParser> {
    Ok(BashParser::new(config.tools.bash()?.to_path_buf()))
}

pub fn build_makepkg(config: &Config) -> Result<Makepkg> {
    Ok(Makepkg::new(config.tools.makepkg()?.to_path_buf()))
}

pub fn build_vercmp(config: &Config) -> Result<Vercmp> {
    Ok(Vercmp::new(config.tools.vercmp()?.to_path_buf()))
}

pub fn build_resolver(config: &Config) -> Result<Resolver> {
    Ok(Resolver::new(
        Arc::new(build_pacman(config)?),
        Arc::new(build_aur(config)?),
        Arc::new(build_parser(config)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_http_client_identifies_itself() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", Matcher::Regex("^pacrs/".to_string()))
            .create_async()
            .await;

        let http = build_http_client().unwrap();
        let _ = http.inner().get(server.url()).send().await;

        mock.assert_async().await;
    }

    #[test]
    fn test_resolver_needs_pacman_and_bash() {
        let config = Config::for_test("/tmp/pacrs-test", "http://localhost");
        let err = build_resolver(&config).err().unwrap();
        assert_eq!(err.to_string(), "Could not find pacman.");

        let mut config = config;
        config.tools.pacman = Some("/usr/bin/pacman".into());
        let err = build_resolver(&config).err().unwrap();
        assert_eq!(err.to_string(), "Could not find bash.");

        config.tools.bash = Some("/bin/bash".into());
        assert!(build_resolver(&config).is_ok());
    }
}
