//! Built-in command implementations: `cd`, `exit`, `jobs`, `fg`, `bg`,
//! `export`, `help`. Dispatched by the executor's fast path and run in
//! the shell process itself, never forked.

use std::env;
use std::io::Write;

use crate::ast::Command;
use crate::job_control::{self, ForegroundTerminalGuard, WaitOutcome};
use crate::jobs::JobState;
use crate::shell::ShellState;

/// Dispatch one already-parsed builtin command. Only reached via the
/// executor's fast path, so `command.program()` is always one of the names
/// below.
pub fn dispatch(command: &Command, state: &mut ShellState) -> i32 {
    let args = command.args();
    match command.program() {
        "cd" => cd(args),
        "exit" => exit(args, state),
        "jobs" => jobs(state),
        "fg" => fg(args, state),
        "bg" => bg(args, state),
        "export" => export(args),
        "help" => help(),
        other => {
            eprintln!("seal: {other}: not a builtin");
            1
        }
    }
}

fn cd(args: &[String]) -> i32 {
    let target = match args.first() {
        Some(dir) => dir.clone(),
        None => match env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                eprintln!("seal: cd: HOME not set");
                return 1;
            }
        },
    };

    match env::set_current_dir(&target) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("seal: cd: {target}: {e}");
            1
        }
    }
}

fn exit(args: &[String], state: &mut ShellState) -> ! {
    let status = args
        .first()
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(0);
    state.teardown();
    std::process::exit(status);
}

fn jobs(state: &ShellState) -> i32 {
    for job in state.jobs.enumerate() {
        println!("[{}]  {}\t\t{}", job.id, job.state.label(), job.command);
    }
    let _ = std::io::stdout().flush();
    0
}

fn resolve_job_id(args: &[String], default: Option<usize>) -> Option<usize> {
    match args.first() {
        Some(arg) => arg.parse::<usize>().ok(),
        None => default,
    }
}

fn fg(args: &[String], state: &mut ShellState) -> i32 {
    let Some(id) = resolve_job_id(args, state.jobs.most_recent_id()) else {
        eprintln!("seal: no such job");
        return 1;
    };
    let Some(job) = state.jobs.get(id) else {
        eprintln!("seal: no such job");
        return 1;
    };
    let pgid = job.pgid;
    let command_string = job.command.clone();

    if let Err(e) = job_control::send_continue_to_group(pgid) {
        eprintln!("seal: fg: {e}");
        return 1;
    }
    state.jobs.update_state(pgid, JobState::Running);

    let guard = if state.interactive {
        match ForegroundTerminalGuard::new(pgid) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("seal: fg: {e}");
                None
            }
        }
    } else {
        None
    };

    // `wait_for_pgid` doesn't know which stage is the pipeline's last one
    // here, so the reported exit code is whichever pid is reaped last.
    let outcome = job_control::wait_for_pgid(pgid, None);
    drop(guard);

    let _mask = job_control::SignalBlockGuard::block();
    match outcome {
        Ok(WaitOutcome::Stopped) => {
            state.jobs.update_state(pgid, JobState::Stopped);
            println!("[{id}]+  Stopped\t\t{command_string}");
            128 + libc::SIGTSTP
        }
        Ok(WaitOutcome::Exited(code)) => {
            state.jobs.remove(id);
            code
        }
        Err(e) => {
            eprintln!("seal: fg: {e}");
            1
        }
    }
}

fn bg(args: &[String], state: &mut ShellState) -> i32 {
    let Some(id) = resolve_job_id(args, state.jobs.most_recent_stopped_id()) else {
        eprintln!("seal: no such job");
        return 1;
    };
    let Some(pgid) = state.jobs.get(id).map(|j| j.pgid) else {
        eprintln!("seal: no such job");
        return 1;
    };

    if let Err(e) = job_control::send_continue_to_group(pgid) {
        eprintln!("seal: bg: {e}");
        return 1;
    }
    state.jobs.update_state(pgid, JobState::Running);
    0
}

fn export(args: &[String]) -> i32 {
    let Some(assignment) = args.first() else {
        eprintln!("seal: export: missing argument");
        return 1;
    };

    match assignment.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            unsafe {
                env::set_var(name, value);
            }
            0
        }
        _ => {
            eprintln!("seal: export: expected NAME=VALUE");
            1
        }
    }
}

fn help() -> i32 {
    println!("seal: a job-control shell");
    println!("builtins: cd [dir], exit [status], jobs, fg [id], bg [id], export NAME=VALUE, help");
    println!("operators: | < > >> 2> 2>&1 &");
    0
}
