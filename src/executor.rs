//! Runs a parsed [`Pipeline`]: forks one child per stage, wires pipes
//! between them, assigns the whole pipeline a single process group, and
//! either waits on it in the foreground or records it as a background job.
//!
//! Each child's setup (pgid, terminal grab, signal dispositions) runs via
//! `std::process::Command`'s `pre_exec` hook rather than hand-rolled
//! `fork`/`execvp`.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use crate::ast::Pipeline;
use crate::builtins;
use crate::job_control::{self, ForegroundTerminalGuard, WaitOutcome};
use crate::jobs::JobState;
use crate::redirect::{self, StdinSource, StdoutSink};
use crate::shell::ShellState;

const BUILTIN_NAMES: &[&str] = &["cd", "exit", "jobs", "fg", "bg", "export", "help"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Execute one parsed pipeline, returning the shell-visible exit code.
pub fn execute_pipeline(pipeline: &Pipeline, state: &mut ShellState) -> i32 {
    // Built-in fast path: a lone command, no pipes, whose program is a
    // builtin runs in the shell process directly.
    if pipeline.commands.len() == 1 && is_builtin(pipeline.commands[0].program()) {
        return builtins::dispatch(&pipeline.commands[0], state);
    }

    match run_external_pipeline(pipeline, state) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("seal: {e}");
            1
        }
    }
}

fn run_external_pipeline(pipeline: &Pipeline, state: &mut ShellState) -> io::Result<i32> {
    let stage_count = pipeline.commands.len();
    let foreground = !pipeline.background;
    let interactive = state.interactive;

    let mut pgid: libc::pid_t = 0;
    let mut next_stdin = StdinSource::Inherit;
    let mut last_pid: Option<libc::pid_t> = None;
    let mut member_pids: Vec<libc::pid_t> = Vec::with_capacity(stage_count);

    for (index, command) in pipeline.commands.iter().enumerate() {
        let is_last_stage = index + 1 == stage_count;

        let (stdout_sink, carried_reader) = if is_last_stage {
            (StdoutSink::Inherit, None)
        } else {
            let (reader, writer) = os_pipe::pipe()?;
            (StdoutSink::Pipe(writer), Some(reader))
        };

        let stdin_source = std::mem::replace(&mut next_stdin, StdinSource::Inherit);
        let plan = redirect::resolve(&command.redirections, stdin_source, stdout_sink)
            .map_err(|e| io::Error::other(e.0))?;

        let mut child_command = Command::new(command.program());
        child_command.args(command.args());
        child_command.stdin(plan.stdin);
        child_command.stdout(plan.stdout);
        child_command.stderr(plan.stderr);

        // Copied into the pre_exec closure, which runs in the forked child
        // before exec: join the pipeline's process group, grab the
        // terminal if this is a foreground pipeline, and restore default
        // signal dispositions.
        let leader_pgid = pgid;
        let grab_terminal = foreground && interactive;

        unsafe {
            child_command.pre_exec(move || {
                let own_pid = libc::getpid();
                let target_pgid = if leader_pgid == 0 { own_pid } else { leader_pgid };
                libc::setpgid(0, target_pgid);
                if grab_terminal {
                    libc::tcsetpgrp(libc::STDIN_FILENO, target_pgid);
                }
                libc::signal(libc::SIGINT, libc::SIG_DFL);
                libc::signal(libc::SIGQUIT, libc::SIG_DFL);
                libc::signal(libc::SIGTSTP, libc::SIG_DFL);
                libc::signal(libc::SIGTTIN, libc::SIG_DFL);
                libc::signal(libc::SIGTTOU, libc::SIG_DFL);
                Ok(())
            });
        }

        let spawned = match child_command.spawn() {
            Ok(child) => child,
            Err(e) => {
                eprintln!("seal: {}: {e}", command.program());
                // Earlier stages of this pipeline, if any, are left running;
                // SIGCHLD reaping collects them rather than being killed here.
                return Ok(127);
            }
        };

        let child_pid = spawned.id() as libc::pid_t;
        // Race-free: set the child's pgid from the parent side too, since
        // either the parent or the child might run first after fork.
        let resolved_pgid = if pgid == 0 { child_pid } else { pgid };
        job_control::set_process_group(child_pid, resolved_pgid)?;
        pgid = resolved_pgid;
        last_pid = Some(child_pid);
        member_pids.push(child_pid);

        // `spawned` isn't kept around: reaping happens by pgid (foreground
        // wait below, or the SIGCHLD self-pipe for background jobs), not
        // through `Child::wait`. Letting it drop here is safe — it doesn't
        // kill the process, only releases our side of the handle.
        drop(spawned);

        if let Some(reader) = carried_reader {
            next_stdin = StdinSource::Pipe(reader);
        }
    }

    if pipeline.background {
        let command_string = pipeline.to_string();
        let added = {
            let _mask = job_control::SignalBlockGuard::block();
            state
                .jobs
                .add(pgid, command_string, JobState::Running, member_pids)
        };
        match added {
            Some(id) => println!("[{id}] {pgid}"),
            None => eprintln!("seal: jobs table full"),
        }
        return Ok(0);
    }

    let _terminal_guard = if interactive {
        Some(ForegroundTerminalGuard::new(pgid)?)
    } else {
        None
    };

    match job_control::wait_for_pgid(pgid, last_pid)? {
        WaitOutcome::Stopped => {
            let command_string = pipeline.to_string();
            let added = {
                let _mask = job_control::SignalBlockGuard::block();
                state.jobs.add(
                    pgid,
                    command_string.clone(),
                    JobState::Stopped,
                    member_pids,
                )
            };
            match added {
                Some(id) => println!("[{id}]+  Stopped\t\t{command_string}"),
                None => eprintln!("seal: jobs table full"),
            }
            Ok(128 + libc::SIGTSTP)
        }
        WaitOutcome::Exited(code) => Ok(code),
    }
}
