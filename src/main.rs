mod ast;
mod builtins;
mod executor;
mod job_control;
mod jobs;
mod lexer;
mod parser;
mod redirect;
mod shell;
mod signal;
mod status;

use std::io::{self, BufRead, Write};

use shell::ShellState;

fn main() {
    let (mut state, mut signal_pipe) = match ShellState::init() {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("seal: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();

    loop {
        signal_pipe.drain();
        signal::reap_background(&mut state.jobs, state.interactive);

        if state.interactive {
            print!("seal> ");
            let _ = io::stdout().flush();
        }

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(e) => {
                eprintln!("seal: {e}");
                continue;
            }
        };

        if bytes_read == 0 {
            break;
        }

        let tokens = lexer::tokenize(&line);
        if tokens.is_empty() {
            continue;
        }

        let pipeline = match parser::parse(&tokens) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("seal: {e}");
                continue;
            }
        };

        executor::execute_pipeline(&pipeline, &mut state);
    }

    // EOF always exits 0, regardless of the last command's status.
    state.teardown();
    std::process::exit(0);
}
