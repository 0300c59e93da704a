//! Recipe evaluation through a bash subprocess.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{BuildSpec, RecipeParser, parse_output};
use crate::error::ParseError;

/// Appended to the recipe; prints every variable as `key:value` lines.
const INTROSPECT: &str = r#"
__pacrs_list() {
	local key=$1
	shift
	echo "${key}len:$#"
	local item
	for item in "$@"; do
		echo "$key:$item"
	done
}

echo "name:$pkgname"
echo "ver:$pkgver"
echo "rel:$pkgrel"
echo "epoch:$epoch"
echo "install:$install"
echo "url:$url"
echo "desc:$pkgdesc"

__pacrs_list dep "${depends[@]}"
__pacrs_list makedep "${makedepends[@]}"
__pacrs_list checkdep "${checkdepends[@]}"
__pacrs_list optdep "${optdepends[@]}"
__pacrs_list conflict "${conflicts[@]}"
__pacrs_list repl "${replaces[@]}"
__pacrs_list arch "${arch[@]}"
__pacrs_list license "${license[@]}"
__pacrs_list group "${groups[@]}"
__pacrs_list provide "${provides[@]}"

if [[ -n "$_darcstrunk" && -n "$_darcsmod" ]]; then
	echo "vcs:darcs"
elif [[ -n "$_cvsroot" && -n "$_cvsmod" ]]; then
	echo "vcs:cvs"
elif [[ -n "$_gitroot" && -n "$_gitname" ]]; then
	echo "vcs:git"
elif [[ -n "$_svntrunk" && -n "$_svnmod" ]]; then
	echo "vcs:svn"
elif [[ -n "$_bzrtrunk" && -n "$_bzrmod" ]]; then
	echo "vcs:bzr"
elif [[ -n "$_hgroot" && -n "$_hgrepo" ]]; then
	echo "vcs:hg"
fi

exit 0
"#;

/// Evaluates recipes with one bash process per parse.
pub struct BashParser {
    bash: PathBuf,
}

impl BashParser {
    pub fn new(bash: PathBuf) -> Self {
        Self { bash }
    }
}

#[async_trait]
impl RecipeParser for BashParser {
    #[tracing::instrument(skip(self, recipe))]
    async fn parse(&self, recipe: &[u8]) -> Result<BuildSpec, ParseError> {
        let mut child = Command::new(&self.bash)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ParseError::Spawn)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ParseError::Write(std::io::ErrorKind::BrokenPipe.into()))?;

        // Feed stdin while draining stdout so a chatty recipe cannot deadlock
        // on a full pipe.
        let feed = async move {
            stdin.write_all(recipe).await?;
            stdin.write_all(b"\n").await?;
            stdin.write_all(INTROSPECT.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(ParseError::Read)?;
        if !output.status.success() {
            return Err(ParseError::Exit(output.status));
        }
        written.map_err(ParseError::Write)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("bash printed {} bytes", stdout.len());
        parse_output(stdout.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bash() -> Option<PathBuf> {
        which::which("bash").ok()
    }

    #[tokio::test]
    async fn test_parse_minimal_recipe() {
        let Some(bash) = bash() else { return };
        let parser = BashParser::new(bash);

        let spec = parser
            .parse(b"pkgname=foo\npkgver=1.2\npkgrel=3\narch=(x86_64)\n")
            .await
            .unwrap();

        assert_eq!(spec.name, "foo");
        assert_eq!(spec.version, "1.2");
        assert_eq!(spec.release, 3);
        assert_eq!(spec.epoch, 0);
        assert!(spec.arch.contains(&"x86_64".to_string()));
        assert!(!spec.has_deps());
    }

    #[tokio::test]
    async fn test_parse_full_recipe() {
        let Some(bash) = bash() else { return };
        let parser = BashParser::new(bash);

        let recipe = br#"
pkgname=bar-git
pkgver=0.1
pkgrel=2
epoch=1
pkgdesc="A test package"
url="https://example.org"
arch=('i686' 'x86_64')
license=('MIT')
depends=('glibc' 'foo>=1.0')
makedepends=('git')
optdepends=('python: for helper scripts')
install=bar.install
_gitroot=https://example.org/bar.git
_gitname=bar
"#;
        let spec = parser.parse(recipe).await.unwrap();

        assert_eq!(spec.version_string(), "1:0.1-2");
        assert_eq!(spec.description, "A test package");
        assert_eq!(spec.dependency_names(), vec!["glibc", "foo>=1.0", "git"]);
        assert_eq!(spec.opt_depends, vec!["python: for helper scripts"]);
        assert_eq!(spec.licenses, vec!["MIT"]);
        assert_eq!(spec.install, "bar.install");
        assert_eq!(spec.vcs, "git");
    }

    #[tokio::test]
    async fn test_parse_recipe_without_arch() {
        let Some(bash) = bash() else { return };
        let parser = BashParser::new(bash);

        let err = parser
            .parse(b"pkgname=foo\npkgver=1\npkgrel=1\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::NoArch));
    }

    #[tokio::test]
    async fn test_parse_recipe_that_exits_nonzero() {
        let Some(bash) = bash() else { return };
        let parser = BashParser::new(bash);

        let err = parser.parse(b"exit 3\n").await.unwrap_err();
        assert!(matches!(err, ParseError::Exit(_)));
    }

    #[tokio::test]
    async fn test_missing_shell_is_spawn_error() {
        let parser = BashParser::new(PathBuf::from("/nonexistent/bash"));
        let err = parser.parse(b"pkgname=foo\n").await.unwrap_err();
        assert!(matches!(err, ParseError::Spawn(_)));
    }
}
