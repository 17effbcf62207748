//! Folds a token sequence (from [`crate::lexer`]) into a [`Pipeline`].
//!
//! Grammar:
//! ```text
//! pipeline := command ('|' command)* ['&']
//! command  := word (word | redir)*
//! redir    := ('<' | '>' | '>>' | '2>') word | '2>&1'
//! ```

use crate::ast::{Command, Pipeline, RedirKind, Redirection};

/// A parse failure: a redirection operator with nothing after it, or a
/// command (or pipeline) with no words at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingFilename { operator: String },
    EmptyCommand,
    EmptyPipeline,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingFilename { operator } => {
                write!(f, "parse error: expected filename after '{operator}'")
            }
            ParseError::EmptyCommand => write!(f, "parse error: empty command"),
            ParseError::EmptyPipeline => write!(f, "parse error: empty pipeline"),
        }
    }
}

/// Parse a full token sequence into a [`Pipeline`].
pub fn parse(tokens: &[String]) -> Result<Pipeline, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyPipeline);
    }

    let mut commands = Vec::new();
    let mut background = false;

    for run in tokens.split(|tok| tok == "|") {
        let (command, saw_background) = parse_command(run)?;
        background |= saw_background;
        commands.push(command);
    }

    if commands.is_empty() {
        return Err(ParseError::EmptyPipeline);
    }

    // Background is raised pipeline-wide from an `&` in any command
    // position — a deliberate divergence from conventional shells.
    for command in &mut commands {
        command.background = background;
    }

    Ok(Pipeline {
        commands,
        background,
    })
}

/// Parse one `|`-delimited run of tokens into a `Command`, returning
/// whether a `&` was seen within it.
fn parse_command(tokens: &[String]) -> Result<(Command, bool), ParseError> {
    let mut argv = Vec::new();
    let mut redirections = Vec::new();
    let mut background = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "&" => {
                background = true;
            }
            "2>&1" => {
                redirections.push(Redirection {
                    kind: RedirKind::ErrToOut,
                });
            }
            "<" | ">" | ">>" | "2>" => {
                i += 1;
                let filename = tokens.get(i).ok_or_else(|| ParseError::MissingFilename {
                    operator: token.to_string(),
                })?;
                let kind = match token {
                    "<" => RedirKind::In(filename.clone()),
                    ">" => RedirKind::Out(filename.clone()),
                    ">>" => RedirKind::Append(filename.clone()),
                    "2>" => RedirKind::Err(filename.clone()),
                    _ => unreachable!(),
                };
                redirections.push(Redirection { kind });
            }
            word => argv.push(word.to_string()),
        }
        i += 1;
    }

    if argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    Ok((
        Command {
            argv,
            redirections,
            background,
        },
        background,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_line(line: &str) -> Result<Pipeline, ParseError> {
        parse(&tokenize(line))
    }

    #[test]
    fn single_command_no_redirections() {
        let pipeline = parse_line("echo hello world").unwrap();
        assert_eq!(pipeline.commands.len(), 1);
        assert_eq!(pipeline.commands[0].argv, vec!["echo", "hello", "world"]);
        assert!(pipeline.commands[0].redirections.is_empty());
        assert!(!pipeline.background);
    }

    #[test]
    fn two_stage_pipeline() {
        let pipeline = parse_line("ls | wc -l").unwrap();
        assert_eq!(pipeline.commands.len(), 2);
        assert_eq!(pipeline.commands[0].argv, vec!["ls"]);
        assert_eq!(pipeline.commands[1].argv, vec!["wc", "-l"]);
    }

    #[test]
    fn background_flag_set() {
        let pipeline = parse_line("sleep 30 &").unwrap();
        assert!(pipeline.background);
        assert!(pipeline.commands[0].background);
    }

    #[test]
    fn background_flag_applies_pipeline_wide() {
        // `&` appears mid-pipeline; it still marks the whole pipeline,
        // not just the command it trails.
        let pipeline = parse_line("sleep 1 & | cat").unwrap();
        assert!(pipeline.background);
        assert!(pipeline.commands.iter().all(|c| c.background));
    }

    #[test]
    fn redirections_in_textual_order() {
        let pipeline = parse_line("cat < in.txt > out.txt 2>&1").unwrap();
        let redirs = &pipeline.commands[0].redirections;
        assert_eq!(redirs.len(), 3);
        assert!(matches!(&redirs[0].kind, RedirKind::In(f) if f == "in.txt"));
        assert!(matches!(&redirs[1].kind, RedirKind::Out(f) if f == "out.txt"));
        assert!(matches!(redirs[2].kind, RedirKind::ErrToOut));
    }

    #[test]
    fn missing_filename_is_error() {
        assert_eq!(
            parse_line("echo >"),
            Err(ParseError::MissingFilename {
                operator: ">".to_string()
            })
        );
    }

    #[test]
    fn empty_command_is_error() {
        assert_eq!(parse_line("echo | | cat"), Err(ParseError::EmptyCommand));
    }

    #[test]
    fn empty_pipeline_is_error() {
        assert_eq!(parse(&[]), Err(ParseError::EmptyPipeline));
    }

    #[test]
    fn append_and_stderr_redirections() {
        let pipeline = parse_line("cmd >> out.txt 2> err.txt").unwrap();
        let redirs = &pipeline.commands[0].redirections;
        assert!(matches!(&redirs[0].kind, RedirKind::Append(f) if f == "out.txt"));
        assert!(matches!(&redirs[1].kind, RedirKind::Err(f) if f == "err.txt"));
    }
}
