use crate::error::{BridgeError, Result};
use crate::types::RepositoryBlame;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Annotator script, run with the configured python interpreter
///
/// Requires `python-hglib` on the interpreter's path.
pub const ANNOTATOR_SCRIPT: &str = include_str!("hg_annotate.py");

/// Write the annotator script to a temporary file
///
/// The file is removed when the returned handle is dropped.
fn write_script() -> Result<tempfile::NamedTempFile> {
    let mut script = tempfile::Builder::new()
        .prefix("hg-annotate")
        .suffix(".py")
        .tempfile()
        .map_err(|e| BridgeError::ScriptWriteFailed(e.to_string()))?;

    script
        .write_all(ANNOTATOR_SCRIPT.as_bytes())
        .and_then(|_| script.flush())
        .map_err(|e| BridgeError::ScriptWriteFailed(e.to_string()))?;

    Ok(script)
}

/// Run the annotator over a mercurial repository and decode its JSON output
///
/// With `target` set only that path is annotated, otherwise every file
/// tracked at `revision`. `hg` is exported as `HG`, the executable both
/// python-hglib and the script's own file listing run. Script progress on
/// stderr is forwarded to the debug log.
pub fn run_annotator(
    python: &str,
    hg: &str,
    repo: &Path,
    revision: &str,
    target: Option<&str>,
) -> Result<RepositoryBlame> {
    let repo = repo.canonicalize()?;
    let script = write_script()?;

    tracing::info!(
        "Running hg annotator on {} at {}",
        repo.display(),
        revision
    );

    let mut cmd = Command::new(python);
    cmd.arg(script.path()).arg(&repo).arg(revision);
    if let Some(path) = target {
        cmd.arg(path);
    }

    let mut child = cmd
        .env("HG", hg)
        .current_dir(&repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| crate::error::CommandError::SpawnFailed {
            program: python.to_string(),
            reason: e.to_string(),
        })?;

    let stderr = child.stderr.take().map(|pipe| {
        std::thread::spawn(move || {
            let mut captured = Vec::new();
            for line in BufReader::new(pipe).lines().map_while(|l| l.ok()) {
                tracing::debug!("hg annotator: {}", line);
                captured.push(line);
            }
            captured.join("\n")
        })
    });

    let decoded = match child.stdout.take() {
        Some(stdout) => serde_json::from_reader::<_, RepositoryBlame>(BufReader::new(stdout))
            .map_err(|e| e.to_string()),
        None => Err("stdout was not captured".to_string()),
    };

    let status = child.wait()?;
    let stderr = stderr
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    // A failing script usually leaves stdout empty, so its exit status says
    // more than the decode error.
    if !status.success() {
        return Err(BridgeError::ExitFailed {
            status: status.to_string(),
            stderr,
        }
        .into());
    }

    let blame = decoded.map_err(BridgeError::DecodeFailed)?;
    tracing::info!(
        "hg annotator returned {} files and {} commits",
        blame.file_count(),
        blame.commits.len()
    );
    Ok(blame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlameError;
    use tempfile::TempDir;

    #[test]
    fn test_script_is_embedded() {
        assert!(ANNOTATOR_SCRIPT.contains("import hglib"));
        assert!(ANNOTATOR_SCRIPT.contains("\"Commits\""));
        assert!(ANNOTATOR_SCRIPT.contains("\"Hunks\""));
    }

    #[test]
    fn test_script_file_removed_on_drop() {
        let script = write_script().unwrap();
        let path = script.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ANNOTATOR_SCRIPT);
        assert!(path.extension().is_some_and(|ext| ext == "py"));

        drop(script);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_repo_is_io_error() {
        let err = run_annotator("python", "hg", Path::new("/nonexistent/hg/repo"), "tip", None).unwrap_err();
        assert!(matches!(err, BlameError::Io(_)));
    }

    #[test]
    fn test_missing_interpreter() {
        let temp = TempDir::new().unwrap();
        let err = run_annotator("charblame-no-such-python", "hg", temp.path(), "tip", None).unwrap_err();
        assert!(matches!(err, BlameError::Command(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_decodes_stdout_of_interpreter() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("fake-python");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho progress >&2\nprintf '%s' '{\"Commits\":{},\"Hunks\":{\"empty-file.txt\":[]}}'\n",
        )
        .unwrap();
        set_executable(&fake);

        let blame = run_fake(&fake, temp.path()).unwrap();
        assert_eq!(blame.file_count(), 1);
        assert!(blame.hunks["empty-file.txt"].is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_reported_before_decode_error() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("fake-python");
        std::fs::write(&fake, "#!/bin/sh\necho 'no module named hglib' >&2\nexit 1\n").unwrap();
        set_executable(&fake);

        let err = run_fake(&fake, temp.path()).unwrap_err();
        match err {
            BlameError::Bridge(BridgeError::ExitFailed { stderr, .. }) => {
                assert!(stderr.contains("hglib"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_hg_program_exported_to_script() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("fake-python");
        std::fs::write(
            &fake,
            "#!/bin/sh\nprintf '{\"Commits\":{},\"Hunks\":{\"%s\":[]}}' \"$HG\"\n",
        )
        .unwrap();
        set_executable(&fake);

        let blame = run_fake_with_hg(&fake, "/opt/mercurial/bin/hg", temp.path()).unwrap();
        assert!(blame.hunks.contains_key("/opt/mercurial/bin/hg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_garbage_output_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("fake-python");
        std::fs::write(&fake, "#!/bin/sh\necho 'not json'\n").unwrap();
        set_executable(&fake);

        let err = run_fake(&fake, temp.path()).unwrap_err();
        assert!(matches!(err, BlameError::Bridge(BridgeError::DecodeFailed(_))));
    }

    /// Run a shell script standing in for the python interpreter
    ///
    /// Exec can fail with ETXTBSY while a concurrently forked test process
    /// still holds the freshly written script open, so spawn failures are retried.
    #[cfg(unix)]
    fn run_fake(fake: &Path, repo: &Path) -> Result<RepositoryBlame> {
        run_fake_with_hg(fake, "hg", repo)
    }

    #[cfg(unix)]
    fn run_fake_with_hg(fake: &Path, hg: &str, repo: &Path) -> Result<RepositoryBlame> {
        let mut attempts = 0;
        loop {
            match run_annotator(fake.to_str().unwrap(), hg, repo, "tip", None) {
                Err(BlameError::Command(_)) if attempts < 5 => {
                    attempts += 1;
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                result => return result,
            }
        }
    }

    #[cfg(unix)]
    fn set_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
