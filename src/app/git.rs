use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("`{command}` output is not valid UTF-8")]
    InvalidUtf8 { command: String },
}

/// Runs an external program to completion and captures its stdout.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<String, CommandError>;
}

/// Spawns real processes from the command search path.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<String, CommandError> {
        let command = format!("{} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| CommandError::InvalidUtf8 { command })
    }
}

/// The handful of git queries the generator needs.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn toplevel(&self, cwd: &Path) -> Result<PathBuf, CommandError> {
        let out = self.runner.run("git", &["rev-parse", "--show-toplevel"], cwd)?;
        Ok(PathBuf::from(out.trim()))
    }

    /// Tracked plus untracked-but-not-ignored files, relative to `repo_root`.
    pub fn ls_files(&self, repo_root: &Path) -> Result<Vec<String>, CommandError> {
        let out = self.runner.run(
            "git",
            &["ls-files", "-z", "--cached", "--others", "--exclude-standard"],
            repo_root,
        )?;
        Ok(out
            .split('\0')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn remote_origin_url(&self, cwd: &Path) -> Option<String> {
        self.query(&["config", "--get", "remote.origin.url"], cwd)
    }

    pub fn current_branch(&self, cwd: &Path) -> Option<String> {
        self.query(&["symbolic-ref", "--short", "HEAD"], cwd)
    }

    fn query(&self, args: &[&str], cwd: &Path) -> Option<String> {
        match self.runner.run("git", args, cwd) {
            Ok(out) => Some(out.trim().to_string()).filter(|s| !s.is_empty()),
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        }
    }
}
