use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::aur::DEFAULT_AUR_URL;
use crate::install::InstallConfig;
use crate::pacman::Elevation;
use crate::runtime::Runtime;

const DEFAULT_PKG_EXT: &str = ".pkg.tar.zst";

/// Values given on the command line (or their environment variables).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tmp_dir: Option<PathBuf>,
    pub aur_url: Option<String>,
}

/// External programs found on `PATH`. Mandatory ones are checked when a
/// command asks for them.
#[derive(Debug, Clone, Default)]
pub struct Tools {
    pub pacman: Option<PathBuf>,
    pub makepkg: Option<PathBuf>,
    pub vercmp: Option<PathBuf>,
    pub bash: Option<PathBuf>,
    pub elevation: Option<Elevation>,
}

impl Tools {
    /// `pacman-color` is preferred when installed.
    pub fn discover(find: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let pacman = find("pacman-color").or_else(|| find("pacman"));

        let elevation = match find("sudo") {
            Some(sudo) => Some(Elevation::Sudo(sudo)),
            None => match find("su") {
                Some(su) => {
                    warn!("Could not find sudo. Using su.");
                    Some(Elevation::Su(su))
                }
                None => {
                    warn!("Could not find sudo or su.");
                    None
                }
            },
        };

        Self {
            pacman,
            makepkg: find("makepkg"),
            vercmp: find("vercmp"),
            bash: find("bash"),
            elevation,
        }
    }

    pub fn pacman(&self) -> Result<&Path> {
        require(&self.pacman, "pacman")
    }

    pub fn makepkg(&self) -> Result<&Path> {
        require(&self.makepkg, "makepkg")
    }

    pub fn vercmp(&self) -> Result<&Path> {
        require(&self.vercmp, "vercmp")
    }

    pub fn bash(&self) -> Result<&Path> {
        require(&self.bash, "bash")
    }
}

fn require<'a>(path: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    path.as_deref()
        .ok_or_else(|| anyhow!("Could not find {}.", name))
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Per-user staging root, `<temp>/pacrs-<uid>` unless overridden.
    pub tmp_root: PathBuf,
    pub aur_url: String,
    /// `PKGEXT`, the extension makepkg gives built packages.
    pub pkg_ext: String,
    pub editor: Option<PathBuf>,
    pub tools: Tools,
}

impl Config {
    pub fn load<R: Runtime + ?Sized>(runtime: &R, overrides: ConfigOverrides) -> Self {
        Self::load_with(runtime, overrides, |name| which::which(name).ok())
    }

    /// Like [`Config::load`], with `find` standing in for a `PATH` lookup.
    pub fn load_with<R: Runtime + ?Sized>(
        runtime: &R,
        overrides: ConfigOverrides,
        find: impl Fn(&str) -> Option<PathBuf>,
    ) -> Self {
        let tmp_root = overrides
            .tmp_dir
            .unwrap_or_else(|| runtime.temp_dir().join(format!("pacrs-{}", runtime.uid())));

        let aur_url = overrides
            .aur_url
            .unwrap_or_else(|| DEFAULT_AUR_URL.to_string());

        let pkg_ext = runtime
            .env_var("PKGEXT")
            .ok()
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| DEFAULT_PKG_EXT.to_string());

        let wanted = runtime
            .env_var("EDITOR")
            .ok()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "vim".to_string());
        let editor = find(&wanted).or_else(|| find("nano"));
        if editor.is_none() {
            warn!("Could not find {} or nano.", wanted);
        }

        let tools = Tools::discover(&find);
        debug!("Using tmp root {} and AUR at {}", tmp_root.display(), aur_url);

        Self {
            tmp_root,
            aur_url,
            pkg_ext,
            editor,
            tools,
        }
    }

    pub fn install_config(&self) -> InstallConfig {
        InstallConfig {
            tmp_root: self.tmp_root.clone(),
            pkg_ext: self.pkg_ext.clone(),
            editor: self.editor.clone(),
        }
    }

    #[cfg(test)]
    pub fn for_test(tmp_root: impl Into<PathBuf>, aur_url: impl Into<String>) -> Self {
        Self {
            tmp_root: tmp_root.into(),
            aur_url: aur_url.into(),
            pkg_ext: DEFAULT_PKG_EXT.to_string(),
            editor: None,
            tools: Tools::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::env::VarError;

    fn runtime(pkgext: Option<&'static str>, editor: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_temp_dir()
            .returning(|| PathBuf::from("/tmp"));
        runtime.expect_uid().returning(|| 1000);
        runtime
            .expect_env_var()
            .with(eq("PKGEXT"))
            .returning(move |_| pkgext.map(String::from).ok_or(VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq("EDITOR"))
            .returning(move |_| editor.map(String::from).ok_or(VarError::NotPresent));
        runtime
    }

    fn on_path(names: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |name| {
            names
                .contains(&name)
                .then(|| PathBuf::from("/usr/bin").join(name))
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with(
            &runtime(None, None),
            ConfigOverrides::default(),
            on_path(&["pacman", "makepkg", "vercmp", "bash", "sudo", "vim"]),
        );

        assert_eq!(config.tmp_root, PathBuf::from("/tmp/pacrs-1000"));
        assert_eq!(config.aur_url, "https://aur.archlinux.org");
        assert_eq!(config.pkg_ext, ".pkg.tar.zst");
        assert_eq!(config.editor, Some(PathBuf::from("/usr/bin/vim")));
        assert_eq!(
            config.tools.elevation,
            Some(Elevation::Sudo(PathBuf::from("/usr/bin/sudo")))
        );
        assert_eq!(config.tools.pacman().unwrap(), Path::new("/usr/bin/pacman"));
    }

    #[test]
    fn test_overrides_and_environment() {
        let config = Config::load_with(
            &runtime(Some(".pkg.tar.xz"), Some("nvim")),
            ConfigOverrides {
                tmp_dir: Some(PathBuf::from("/var/tmp/mine")),
                aur_url: Some("http://localhost:1234".into()),
            },
            on_path(&["nvim", "pacman-color", "pacman", "su"]),
        );

        assert_eq!(config.tmp_root, PathBuf::from("/var/tmp/mine"));
        assert_eq!(config.aur_url, "http://localhost:1234");
        assert_eq!(config.pkg_ext, ".pkg.tar.xz");
        assert_eq!(config.editor, Some(PathBuf::from("/usr/bin/nvim")));
        assert_eq!(
            config.tools.pacman().unwrap(),
            Path::new("/usr/bin/pacman-color")
        );
        assert_eq!(
            config.tools.elevation,
            Some(Elevation::Su(PathBuf::from("/usr/bin/su")))
        );
    }

    #[test]
    fn test_editor_falls_back_to_nano() {
        let config = Config::load_with(
            &runtime(None, Some("emacs")),
            ConfigOverrides::default(),
            on_path(&["nano"]),
        );
        assert_eq!(config.editor, Some(PathBuf::from("/usr/bin/nano")));
        assert!(config.tools.elevation.is_none());
    }

    #[test]
    fn test_missing_tools_are_reported_by_name() {
        let config = Config::load_with(
            &runtime(None, None),
            ConfigOverrides::default(),
            on_path(&[]),
        );

        assert!(config.editor.is_none());
        assert_eq!(
            config.tools.makepkg().unwrap_err().to_string(),
            "Could not find makepkg."
        );
        assert!(config.tools.vercmp().is_err());
        assert!(config.tools.bash().is_err());
    }
}
