//! Applies a [`Redirection`] list to the three standard descriptors of a
//! freshly-built child `Command`.
//!
//! `std::process::Command` performs the descriptor swaps (via the platform's
//! fork/dup2 under the hood on Unix) once `spawn()` is called, so the opens
//! below happen in the parent but the duplication onto fd 0/1/2 happens as
//! part of the child's own setup, without hand-rolling `fork`/`execvp`.

use os_pipe::{PipeReader, PipeWriter};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::process::Stdio;

use crate::ast::{RedirKind, Redirection};

/// Where a command stage's stdin comes from before its own redirections
/// are applied — inherited from the shell, or the read end of the
/// previous pipeline stage's pipe.
pub enum StdinSource {
    Inherit,
    Pipe(PipeReader),
}

/// Where a command stage's stdout goes before its own redirections are
/// applied — inherited from the shell, or the write end of a pipe to the
/// next pipeline stage.
pub enum StdoutSink {
    Inherit,
    Pipe(PipeWriter),
}

/// A file/descriptor could not be opened or duplicated. Carries the
/// diagnostic text to be written to stderr before the child that would
/// have used it exits with status 1.
#[derive(Debug)]
pub struct RedirectError(pub String);

impl std::fmt::Display for RedirectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One resolved destination for a standard descriptor.
enum Dest {
    Inherit,
    Pipe(PipeWriter),
    File(File),
}

impl Dest {
    fn try_clone(&self) -> io::Result<Dest> {
        Ok(match self {
            Dest::Inherit => Dest::Inherit,
            Dest::Pipe(w) => Dest::Pipe(w.try_clone()?),
            Dest::File(f) => Dest::File(f.try_clone()?),
        })
    }

    fn into_stdio(self) -> Stdio {
        match self {
            Dest::Inherit => Stdio::inherit(),
            Dest::Pipe(w) => Stdio::from(w),
            Dest::File(f) => Stdio::from(f),
        }
    }
}

/// The three standard descriptors resolved from a command's redirection
/// list, ready to hand to `Command::stdin`/`stdout`/`stderr`.
pub struct Plan {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

/// Resolve a command's redirection list against this stage's default
/// stdin/stdout into a `Plan`.
///
/// Redirections are applied in textual order, so `> out.txt 2>&1` sends
/// stderr to `out.txt` while `2>&1 > out.txt`
/// leaves stderr on the original stdout (or, mid-pipeline, the pipe to the
/// next stage).
pub fn resolve(
    redirections: &[Redirection],
    default_stdin: StdinSource,
    default_stdout: StdoutSink,
) -> Result<Plan, RedirectError> {
    let mut stdin = match default_stdin {
        StdinSource::Inherit => Stdio::inherit(),
        StdinSource::Pipe(r) => Stdio::from(r),
    };
    let mut stdout_dest = match default_stdout {
        StdoutSink::Inherit => Dest::Inherit,
        StdoutSink::Pipe(w) => Dest::Pipe(w),
    };
    let mut stderr_dest = Dest::Inherit;

    for redir in redirections {
        match &redir.kind {
            RedirKind::In(path) => {
                let file = File::open(path)
                    .map_err(|e| RedirectError(format!("seal: {path}: {e}")))?;
                stdin = Stdio::from(file);
            }
            RedirKind::Out(path) => {
                stdout_dest = Dest::File(open_truncate(path)?);
            }
            RedirKind::Append(path) => {
                stdout_dest = Dest::File(open_append(path)?);
            }
            RedirKind::Err(path) => {
                stderr_dest = Dest::File(open_truncate(path)?);
            }
            RedirKind::ErrToOut => {
                stderr_dest = stdout_dest
                    .try_clone()
                    .map_err(|e| RedirectError(format!("seal: 2>&1: {e}")))?;
            }
        }
    }

    Ok(Plan {
        stdin,
        stdout: stdout_dest.into_stdio(),
        stderr: stderr_dest.into_stdio(),
    })
}

fn open_truncate(path: &str) -> Result<File, RedirectError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .map_err(|e| RedirectError(format!("seal: {path}: {e}")))
}

fn open_append(path: &str) -> Result<File, RedirectError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o644)
        .open(path)
        .map_err(|e| RedirectError(format!("seal: {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Redirection;
    use std::io::Read;

    fn redir(kind: RedirKind) -> Redirection {
        Redirection { kind }
    }

    #[test]
    fn stdin_redirect_opens_file() {
        let dir = std::env::temp_dir().join(format!("seal_redirect_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("in.txt");
        std::fs::write(&path, "abc\n").unwrap();

        let _plan = resolve(
            &[redir(RedirKind::In(path.display().to_string()))],
            StdinSource::Inherit,
            StdoutSink::Inherit,
        )
        .unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "abc\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_file_is_error() {
        let err = resolve(
            &[redir(RedirKind::In("/nonexistent/seal-test-path".to_string()))],
            StdinSource::Inherit,
            StdoutSink::Inherit,
        )
        .unwrap_err();
        assert!(err.0.contains("/nonexistent/seal-test-path"));
    }

    #[test]
    fn err_to_out_after_out_resolves_without_error() {
        let dir = std::env::temp_dir().join(format!("seal_redirect_test2_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("combined.txt");

        // `> file 2>&1` — stderr should land in the same file as stdout.
        let _plan = resolve(
            &[
                redir(RedirKind::Out(path.display().to_string())),
                redir(RedirKind::ErrToOut),
            ],
            StdinSource::Inherit,
            StdoutSink::Inherit,
        )
        .unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn err_to_out_before_out_does_not_error() {
        // `2>&1 > file` — stderr clones whatever stdout was *before* the
        // later redirect, i.e. the inherited terminal, not the file.
        let dir = std::env::temp_dir().join(format!("seal_redirect_test3_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.txt");

        let _plan = resolve(
            &[
                redir(RedirKind::ErrToOut),
                redir(RedirKind::Out(path.display().to_string())),
            ],
            StdinSource::Inherit,
            StdoutSink::Inherit,
        )
        .unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
