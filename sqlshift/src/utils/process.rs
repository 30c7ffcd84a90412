//! Runs external programs (`pg_dump`, `psql`) and turns failures into errors.
//!
//! Arguments are passed as a vector, never through a shell, and secrets are
//! only ever placed in the child's environment so they cannot appear in the
//! logged command line.

use log::{debug, info};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Failure of an external program.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("'{}' was not found; is it installed and on PATH?", .0.display())]
    NotInstalled(PathBuf),

    #[error("Failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' exited with {status}: {stderr}", .program.display())]
    Failed {
        program: PathBuf,
        status: String,
        stderr: String,
    },
}

/// An external command with its arguments and extra environment.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a variable to the child environment. Values are never logged.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// The command line as it would be typed, for logs and messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command to completion. Stdout is discarded; stderr is captured
    /// and returned in the error when the exit status is non-zero.
    pub fn run(&self) -> Result<(), ProcessError> {
        info!("Running command: {}", self.display());
        debug!(
            "Child environment overrides: {}",
            self.envs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(", ")
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotInstalled(self.program.clone())
                } else {
                    ProcessError::Spawn {
                        program: self.program.clone(),
                        source,
                    }
                }
            })?;

        if output.status.success() {
            debug!("'{}' finished successfully.", self.program.display());
            Ok(())
        } else {
            Err(ProcessError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_hides_environment() {
        let cmd = ExternalCommand::new("psql")
            .args(["-h", "db.example.com"])
            .arg("--single-transaction")
            .env("PGPASSWORD", "hunter2");
        let shown = cmd.display();
        assert_eq!(shown, "psql -h db.example.com --single-transaction");
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_missing_program() {
        let err = ExternalCommand::new("sqlshift-definitely-not-a-real-binary")
            .run()
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotInstalled(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_captures_stderr() {
        let err = ExternalCommand::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run()
            .unwrap_err();
        match err {
            ProcessError::Failed { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_env_reaches_child() {
        ExternalCommand::new("sh")
            .args(["-c", "test \"$SQLSHIFT_PROBE\" = yes"])
            .env("SQLSHIFT_PROBE", "yes")
            .run()
            .unwrap();
    }
}
