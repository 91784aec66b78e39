//! Scoring Delegate: the only place that launches the external scorer.
//!
//! Invocation: `<executable> [<script>] <resume path> <keywords>`.
//! stdout carries exactly one JSON payload; stderr is diagnostics only.
//!
//! # Draining
//! Both pipes are read to EOF concurrently with `wait()`. Reading one pipe
//! and then the other can deadlock once the child fills the unread pipe's
//! buffer and blocks on write.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::checker::upload::KeywordSpec;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("failed to launch scorer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while collecting scorer output: {0}")]
    Io(#[from] std::io::Error),

    #[error("scorer exited unsuccessfully (exit code {exit_code:?})")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("scorer did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Captured output of a successful (exit code 0) scorer run.
#[derive(Debug, Clone)]
pub struct ScorerOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Launches the configured scorer. Built once at startup and shared via `AppState`.
#[derive(Debug, Clone)]
pub struct ScoringDelegate {
    executable: PathBuf,
    script: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ScoringDelegate {
    pub fn new(executable: PathBuf, script: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            executable,
            script,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.scorer_executable.clone(),
            config.scorer_script.clone(),
            config.scorer_timeout,
        )
    }

    /// Runs the scorer against `resume` and waits for it to exit.
    ///
    /// The child is killed if this future is dropped (client gone) or the
    /// timeout fires. No retries.
    pub async fn run(
        &self,
        resume: &Path,
        keywords: &KeywordSpec,
    ) -> Result<ScorerOutput, DelegateError> {
        let mut command = Command::new(&self.executable);
        if let Some(script) = &self.script {
            command.arg(script);
        }
        command
            .arg(resume)
            .arg(keywords.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            "Launching scorer {} (script: {:?}) for {}",
            self.executable.display(),
            self.script,
            resume.display()
        );

        let mut child = command.spawn().map_err(|source| DelegateError::Spawn {
            program: self.executable.display().to_string(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let collected = {
            let collect = async {
                tokio::try_join!(drain(stdout), drain(stderr), child.wait())
            };
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
                None => Some(collect.await),
            }
        };
        let Some(collected) = collected else {
            let limit = self.timeout.unwrap_or_default();
            warn!("Scorer exceeded {limit:?}, killing it");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed-out scorer: {e}");
            }
            return Err(DelegateError::TimedOut(limit));
        };
        let (stdout, stderr, status) = collected?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        log_diagnostics(&stderr);

        finish(status, stdout, stderr)
    }
}

async fn drain<R: AsyncRead + Unpin>(mut pipe: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn missing_pipe(name: &str) -> DelegateError {
    DelegateError::Io(std::io::Error::other(format!("scorer {name} was not captured")))
}

fn log_diagnostics(stderr: &str) {
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        debug!(target: "scorer", "{line}");
    }
}

fn finish(status: ExitStatus, stdout: String, stderr: String) -> Result<ScorerOutput, DelegateError> {
    info!("Scorer exited with {status}");
    if !status.success() {
        return Err(DelegateError::Failed {
            exit_code: status.code(),
            stderr,
        });
    }
    Ok(ScorerOutput { stdout, stderr })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;

    fn script(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        writeln!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    fn sh_delegate(script: &tempfile::NamedTempFile, timeout: Option<Duration>) -> ScoringDelegate {
        ScoringDelegate::new(
            PathBuf::from("sh"),
            Some(script.path().to_path_buf()),
            timeout,
        )
    }

    fn keywords(s: &str) -> KeywordSpec {
        KeywordSpec::from_field(Some(s.to_string()))
    }

    #[tokio::test]
    async fn test_passes_path_and_keywords_as_positional_args() {
        let s = script(r#"printf '%s|%s' "$1" "$2""#);
        let out = sh_delegate(&s, None)
            .run(Path::new("/tmp/resume.pdf"), &keywords("java,spring"))
            .await
            .unwrap();
        assert_eq!(out.stdout, "/tmp/resume.pdf|java,spring");
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr_separately() {
        let s = script("echo '{\"ats_score\": 1}'; echo 'loading model' >&2");
        let out = sh_delegate(&s, None)
            .run(Path::new("x.pdf"), &keywords("rust"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "{\"ats_score\": 1}");
        assert_eq!(out.stderr.trim(), "loading model");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_code_and_stderr() {
        let s = script("echo 'model missing' >&2; exit 3");
        let err = sh_delegate(&s, None)
            .run(Path::new("x.pdf"), &keywords("rust"))
            .await
            .unwrap_err();
        match err {
            DelegateError::Failed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("model missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_large_output_on_both_pipes_does_not_deadlock() {
        // Well past the usual 64 KiB pipe buffer on each stream.
        let s = script(
            "i=0; while [ $i -lt 20000 ]; do echo 'stdout line padding padding'; \
             echo 'stderr line padding padding' >&2; i=$((i+1)); done",
        );
        let out = sh_delegate(&s, Some(Duration::from_secs(30)))
            .run(Path::new("x.pdf"), &keywords("rust"))
            .await
            .unwrap();
        assert_eq!(out.stdout.lines().count(), 20000);
        assert_eq!(out.stderr.lines().count(), 20000);
    }

    #[tokio::test]
    async fn test_timeout_kills_hung_scorer() {
        let s = script("exec sleep 30");
        let err = sh_delegate(&s, Some(Duration::from_millis(200)))
            .run(Path::new("x.pdf"), &keywords("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let delegate = ScoringDelegate::new(
            PathBuf::from("/nonexistent/scorer-binary"),
            None,
            None,
        );
        let err = delegate
            .run(Path::new("x.pdf"), &keywords("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::Spawn { .. }));
    }
}
