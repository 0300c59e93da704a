//! User interaction operations (confirmation prompts, editor).

use anyhow::{Result, bail};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::RealRuntime;

/// Core, testable implementation that reads from any BufRead and writes to any Write.
/// Free-standing so tests can exercise it without a RealRuntime.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    default: bool,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let choices = if default { "[Y/n]" } else { "[y/N]" };
    write!(output, "{} {} ", prompt, choices)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(match response.as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}

/// Runs `f`, which waits on the terminal, without holding a runtime worker
/// that other tasks (the interrupt handler among them) need.
pub(crate) fn block_on_terminal<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str, default: bool) -> Result<bool> {
        block_on_terminal(|| {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            let mut stdin_lock = stdin.lock();
            confirm_with_io(prompt, default, &mut stdin_lock, &mut stdout)
        })
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn edit_impl(&self, editor: &Path, file: &Path) -> Result<()> {
        let status = block_on_terminal(|| Command::new(editor).arg(file).status())?;
        if !status.success() {
            bail!("{} exited with {}", editor.display(), status);
        }
        Ok(())
    }
}
