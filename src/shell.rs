//! Shell-wide state and its init/teardown lifecycle.

use std::io;

use crate::jobs::{JobState, JobTable};
use crate::signal::ChildSignalPipe;

/// Everything the executor, builtins, and main loop share.
pub struct ShellState {
    pub jobs: JobTable,
    pub shell_pgid: libc::pid_t,
    pub interactive: bool,
    saved_termios: Option<libc::termios>,
}

impl ShellState {
    /// Claim the terminal (if interactive), install the SIGCHLD self-pipe,
    /// and return a ready-to-run shell.
    pub fn init() -> io::Result<(Self, ChildSignalPipe)> {
        let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) } == 1;
        let shell_pid = unsafe { libc::getpid() };
        let mut saved_termios = None;

        if interactive {
            loop {
                let foreground_pgid = unsafe { libc::tcgetpgrp(libc::STDIN_FILENO) };
                let own_pgid = unsafe { libc::getpgrp() };
                if foreground_pgid == own_pgid {
                    break;
                }
                unsafe {
                    libc::kill(-own_pgid, libc::SIGTTIN);
                }
            }

            unsafe {
                libc::signal(libc::SIGINT, libc::SIG_IGN);
                libc::signal(libc::SIGQUIT, libc::SIG_IGN);
                libc::signal(libc::SIGTSTP, libc::SIG_IGN);
                libc::signal(libc::SIGTTIN, libc::SIG_IGN);
                libc::signal(libc::SIGTTOU, libc::SIG_IGN);
            }

            crate::job_control::set_process_group(shell_pid, shell_pid)?;

            let rc = unsafe { libc::tcsetpgrp(libc::STDIN_FILENO, shell_pid) };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut termios: libc::termios = unsafe { std::mem::zeroed() };
            if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut termios) } != 0 {
                return Err(io::Error::last_os_error());
            }
            saved_termios = Some(termios);
        }

        let signal_pipe = ChildSignalPipe::install()?;

        Ok((
            Self {
                jobs: JobTable::new(),
                shell_pgid: shell_pid,
                interactive,
                saved_termios,
            },
            signal_pipe,
        ))
    }

    /// Terminate every remaining job and, if interactive, restore the
    /// terminal's saved attributes.
    pub fn teardown(&self) {
        for job in self.jobs.enumerate() {
            if matches!(job.state, JobState::Running | JobState::Stopped) {
                unsafe {
                    libc::kill(-job.pgid, libc::SIGTERM);
                }
            }
        }

        if self.interactive {
            if let Some(termios) = &self.saved_termios {
                unsafe {
                    libc::tcsetattr(libc::STDIN_FILENO, libc::TCSADRAIN, termios);
                }
            }
        }
    }
}
