//! The parsed representation of one input line: [`Pipeline`], [`Command`],
//! [`Redirection`] — produced by the parser, consumed by the executor.

use std::fmt;

/// What a redirection connects a file descriptor to.
///
/// Every variant but [`RedirKind::ErrToOut`] carries a filename; `ErrToOut`
/// carries none (it duplicates whatever fd 1 currently points to, resolved
/// at the time it is applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirKind {
    /// `< file` — stdin from file.
    In(String),
    /// `> file` — stdout to file, truncating.
    Out(String),
    /// `>> file` — stdout to file, appending.
    Append(String),
    /// `2> file` — stderr to file, truncating.
    Err(String),
    /// `2>&1` — stderr duplicated from stdout.
    ErrToOut,
}

/// One redirection, in the textual order it appeared in the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub kind: RedirKind,
}

/// A single command in a pipeline: its argv and its redirections.
///
/// `argv` is never empty (the parser rejects empty commands). `background`
/// is copied onto every `Command` of a `Pipeline` uniformly — see [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    pub redirections: Vec<Redirection>,
    pub background: bool,
}

impl Command {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// One or more commands joined by `|`.
///
/// `commands` is never empty (the parser rejects a pipeline with zero
/// commands). `background` applies to the pipeline as a whole — an `&`
/// appearing in *any* command position raises it, not just the last, so
/// it is hoisted here rather than tracked per-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub background: bool,
}

impl fmt::Display for Pipeline {
    /// Human-readable rendering used as a job table's command string:
    /// `argv[0]` of each stage joined by ` | `, suffixed with ` &` when
    /// backgrounded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .commands
            .iter()
            .map(|c| c.program())
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{joined}")?;
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}
