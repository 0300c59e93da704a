//! Command entry points.
//!
//! Each public function takes the [`Runtime`] and the loaded [`Config`],
//! builds the collaborators it needs and runs. The `run_*` halves take
//! those collaborators directly so they can be exercised with mocks.

use anyhow::{Result, bail};

use crate::runtime::Runtime;

pub mod config;
mod clean;
mod get;
mod info;
mod install;
mod make;
mod search;
mod services;
mod upgrade;

pub use clean::clean;
pub use config::{Config, ConfigOverrides};
pub use get::get;
pub use info::info;
pub use install::install;
pub use make::{make, make_info};
pub use search::search;
pub use upgrade::{UpgradeOptions, upgrade};

/// Commands that build or install refuse to run with root privileges;
/// makepkg will not build as root and elevation is done per transaction.
pub(crate) fn refuse_root<R: Runtime + ?Sized>(runtime: &R) -> Result<()> {
    if runtime.is_privileged() {
        bail!("Can't run as root.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_refuse_root() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_privileged().returning(|| true);
        assert_eq!(
            refuse_root(&runtime).unwrap_err().to_string(),
            "Can't run as root."
        );

        let mut runtime = MockRuntime::new();
        runtime.expect_is_privileged().returning(|| false);
        assert!(refuse_root(&runtime).is_ok());
    }
}
