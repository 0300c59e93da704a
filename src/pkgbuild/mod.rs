//! PKGBUILD evaluation.
//!
//! A PKGBUILD is a bash script, so the only faithful way to read its
//! variables is to let bash evaluate it. [`BashParser`] feeds the recipe and
//! an introspection script to a shell and [`parse_output`] turns the echoed
//! `key:value` lines into a [`BuildSpec`].

mod bash;

pub use bash::BashParser;

use async_trait::async_trait;

use crate::error::ParseError;

/// Placeholder stored in empty lists so `info` output reads like pacman's.
pub const NONE: &str = "None";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeParser: Send + Sync {
    /// Evaluate a recipe and return its variables.
    async fn parse(&self, recipe: &[u8]) -> Result<BuildSpec, ParseError>;
}

/// The variables of one evaluated PKGBUILD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSpec {
    pub name: String,
    pub version: String,
    pub release: u32,
    /// 0 when unset.
    pub epoch: u32,
    pub url: String,
    pub description: String,
    pub licenses: Vec<String>,
    pub groups: Vec<String>,
    pub provides: Vec<String>,
    pub depends: Vec<String>,
    pub make_depends: Vec<String>,
    pub check_depends: Vec<String>,
    pub opt_depends: Vec<String>,
    pub conflicts: Vec<String>,
    pub replaces: Vec<String>,
    pub arch: Vec<String>,
    /// Install script file name, empty when the recipe has none.
    pub install: String,
    /// VCS kind (`git`, `svn`, ...), empty for release recipes.
    pub vcs: String,
}

impl BuildSpec {
    /// Run and build dependencies, with the placeholder filtered out.
    pub fn dependency_names(&self) -> Vec<String> {
        self.depends
            .iter()
            .chain(self.make_depends.iter())
            .filter(|d| !is_placeholder(d))
            .cloned()
            .collect()
    }

    pub fn has_deps(&self) -> bool {
        self.depends
            .iter()
            .chain(self.make_depends.iter())
            .any(|d| !is_placeholder(d))
    }

    pub fn has_install(&self) -> bool {
        !self.install.is_empty()
    }

    pub fn is_vcs(&self) -> bool {
        !self.vcs.is_empty()
    }

    /// `[epoch:]pkgver-pkgrel`, the form pacman and makepkg use.
    pub fn version_string(&self) -> String {
        if self.epoch != 0 {
            format!("{}:{}-{}", self.epoch, self.version, self.release)
        } else {
            format!("{}-{}", self.version, self.release)
        }
    }

    /// Architecture makepkg would stamp on a package built on this machine.
    pub fn local_arch(&self) -> String {
        self.local_arch_for(std::env::consts::ARCH)
    }

    /// Like [`local_arch`](Self::local_arch) for an explicit Rust target
    /// architecture name. Empty when the recipe does not support it.
    pub fn local_arch_for(&self, host: &str) -> String {
        if self.arch.len() == 1 && self.arch[0] == "any" {
            return "any".to_string();
        }

        let wanted = match host {
            "x86_64" => "x86_64",
            "x86" => "i686",
            "aarch64" => "aarch64",
            "arm" => "armv7h",
            _ => return String::new(),
        };

        if self.arch.iter().any(|a| a == wanted) {
            wanted.to_string()
        } else {
            String::new()
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    value == NONE
}

fn parse_number(field: &'static str, value: &str) -> Result<u32, ParseError> {
    value.trim().parse().map_err(|_| ParseError::BadNumber {
        field,
        value: value.to_string(),
    })
}

fn with_capacity(field: &'static str, value: &str) -> Result<Vec<String>, ParseError> {
    Ok(Vec::with_capacity(parse_number(field, value)? as usize))
}

/// Builds a [`BuildSpec`] from the introspection script's output.
pub fn parse_output(output: &str) -> Result<BuildSpec, ParseError> {
    let mut spec = BuildSpec::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key {
            "name" => spec.name = value.to_string(),
            "ver" => spec.version = value.to_string(),
            "rel" => spec.release = parse_number("pkgrel", value)?,
            "epoch" if value.trim().is_empty() => spec.epoch = 0,
            "epoch" => spec.epoch = parse_number("epoch", value)?,
            "install" => spec.install = value.to_string(),
            "url" => spec.url = value.to_string(),
            "desc" => spec.description = value.to_string(),
            "vcs" => spec.vcs = value.to_string(),

            "deplen" => spec.depends = with_capacity("deplen", value)?,
            "dep" => spec.depends.push(value.to_string()),
            "makedeplen" => spec.make_depends = with_capacity("makedeplen", value)?,
            "makedep" => spec.make_depends.push(value.to_string()),
            "checkdeplen" => spec.check_depends = with_capacity("checkdeplen", value)?,
            "checkdep" => spec.check_depends.push(value.to_string()),
            "optdeplen" => spec.opt_depends = with_capacity("optdeplen", value)?,
            "optdep" => spec.opt_depends.push(value.to_string()),
            "conflictlen" => spec.conflicts = with_capacity("conflictlen", value)?,
            "conflict" => spec.conflicts.push(value.to_string()),
            "repllen" => spec.replaces = with_capacity("repllen", value)?,
            "repl" => spec.replaces.push(value.to_string()),
            "archlen" => spec.arch = with_capacity("archlen", value)?,
            "arch" => spec.arch.push(value.to_string()),
            "licenselen" => spec.licenses = with_capacity("licenselen", value)?,
            "license" => spec.licenses.push(value.to_string()),
            "grouplen" => spec.groups = with_capacity("grouplen", value)?,
            "group" => spec.groups.push(value.to_string()),
            "providelen" => spec.provides = with_capacity("providelen", value)?,
            "provide" => spec.provides.push(value.to_string()),
            _ => {}
        }
    }

    if spec.arch.is_empty() {
        return Err(ParseError::NoArch);
    }

    for list in [
        &mut spec.depends,
        &mut spec.make_depends,
        &mut spec.check_depends,
        &mut spec.opt_depends,
        &mut spec.conflicts,
        &mut spec.replaces,
        &mut spec.licenses,
        &mut spec.groups,
        &mut spec.provides,
    ] {
        if list.is_empty() {
            list.push(NONE.to_string());
        }
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "name:foo\nver:1.2\nrel:3\nepoch:\ninstall:\n\
        deplen:0\nmakedeplen:0\narchlen:1\narch:x86_64\n";

    #[test]
    fn test_parse_simple_recipe() {
        let spec = parse_output(SIMPLE).unwrap();

        assert_eq!(spec.name, "foo");
        assert_eq!(spec.version, "1.2");
        assert_eq!(spec.release, 3);
        assert_eq!(spec.epoch, 0);
        assert_eq!(spec.arch, vec!["x86_64"]);
        assert_eq!(spec.local_arch_for("x86_64"), "x86_64");
        assert_eq!(spec.version_string(), "1.2-3");
    }

    #[test]
    fn test_empty_lists_get_placeholder_but_no_deps() {
        let spec = parse_output(SIMPLE).unwrap();

        assert_eq!(spec.depends, vec![NONE]);
        assert_eq!(spec.make_depends, vec![NONE]);
        assert_eq!(spec.conflicts, vec![NONE]);
        assert!(!spec.has_deps());
        assert!(spec.dependency_names().is_empty());
    }

    #[test]
    fn test_parse_lists_and_optdep_descriptions() {
        let out = "name:bar\nver:2\nrel:1\nepoch:1\n\
            deplen:2\ndep:glibc\ndep:foo>=1.0\n\
            makedeplen:1\nmakedep:cmake\n\
            optdeplen:1\noptdep:python: for scripts\n\
            archlen:2\narch:i686\narch:x86_64\n\
            install:bar.install\nvcs:git\n";
        let spec = parse_output(out).unwrap();

        assert_eq!(spec.dependency_names(), vec!["glibc", "foo>=1.0", "cmake"]);
        assert_eq!(spec.opt_depends, vec!["python: for scripts"]);
        assert_eq!(spec.version_string(), "1:2-1");
        assert!(spec.has_deps());
        assert!(spec.has_install());
        assert!(spec.is_vcs());
    }

    #[test]
    fn test_bad_pkgrel_names_field() {
        let out = "name:foo\nver:1\nrel:abc\narchlen:1\narch:any\n";
        let err = parse_output(out).unwrap_err();
        assert!(matches!(
            err,
            ParseError::BadNumber { field: "pkgrel", ref value } if value == "abc"
        ));
    }

    #[test]
    fn test_bad_epoch_names_field() {
        let out = "name:foo\nver:1\nrel:1\nepoch:x\narchlen:1\narch:any\n";
        let err = parse_output(out).unwrap_err();
        assert!(matches!(err, ParseError::BadNumber { field: "epoch", .. }));
    }

    #[test]
    fn test_missing_arch_is_error() {
        let out = "name:foo\nver:1\nrel:1\narchlen:0\n";
        assert!(matches!(parse_output(out), Err(ParseError::NoArch)));
    }

    #[test]
    fn test_local_arch() {
        let mut spec = parse_output(SIMPLE).unwrap();
        assert_eq!(spec.local_arch_for("aarch64"), "");

        spec.arch = vec!["any".into()];
        assert_eq!(spec.local_arch_for("aarch64"), "any");

        spec.arch = vec!["i686".into(), "x86_64".into()];
        assert_eq!(spec.local_arch_for("x86"), "i686");
        assert_eq!(spec.local_arch_for("riscv64"), "");
    }

    #[test]
    fn test_unknown_lines_are_ignored() {
        let out = format!("==> some noise\n{}", SIMPLE);
        assert_eq!(parse_output(&out).unwrap().name, "foo");
    }
}
