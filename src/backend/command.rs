use crate::error::{CommandError, Result};
use std::path::Path;
use std::process::Command;

/// Run `program args...` in `dir` and return its full standard output
///
/// Any spawn failure or non-zero exit is an error carrying the command's
/// standard error.
pub fn run_command(program: &str, args: &[&str], dir: &Path) -> Result<Vec<u8>> {
    tracing::trace!("Running {} {} in {}", program, args.join(" "), dir.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| CommandError::SpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(CommandError::NonZeroExit {
            program: program.to_string(),
            args: args.join(" "),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into())
    }
}

/// Split NUL-separated command output into paths, dropping empty entries
pub fn split_nul(output: &[u8]) -> Vec<String> {
    output
        .split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).into_owned())
        .collect()
}
