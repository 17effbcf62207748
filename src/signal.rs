//! SIGCHLD delivery via the self-pipe trick.
//!
//! The signal handler itself only writes one byte to a pipe — the only
//! async-signal-safe thing it does. All real work (reaping, job-state
//! updates, printing `Done` lines) happens later, driven from the main
//! loop, once we're back in normal control flow.

use std::io::{self, Read, Write};
use std::os::unix::io::RawFd;
use std::os::unix::net::UnixStream;
use std::sync::OnceLock;

use crate::jobs::{JobState, JobTable};

static SELF_PIPE_WRITE_FD: OnceLock<RawFd> = OnceLock::new();

extern "C" fn on_sigchld(_signum: libc::c_int) {
    if let Some(&fd) = SELF_PIPE_WRITE_FD.get() {
        let byte: [u8; 1] = [0];
        unsafe {
            libc::write(fd, byte.as_ptr() as *const libc::c_void, 1);
        }
    }
}

/// The read end of the self-pipe, handed back to the main loop for
/// draining. Construction installs the SIGCHLD handler.
pub struct ChildSignalPipe {
    read_end: UnixStream,
}

impl ChildSignalPipe {
    pub fn install() -> io::Result<Self> {
        let (read_end, write_end) = UnixStream::pair()?;
        read_end.set_nonblocking(true)?;
        write_end.set_nonblocking(true)?;

        use std::os::unix::io::IntoRawFd;
        let write_fd = write_end.into_raw_fd();
        // Leaked on purpose: lives for the process, referenced only by the
        // signal handler via the static above.
        let _ = SELF_PIPE_WRITE_FD.set(write_fd);

        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_sigchld as usize;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = libc::SA_RESTART;
            libc::sigaction(libc::SIGCHLD, &action, std::ptr::null_mut());
        }

        Ok(Self { read_end })
    }

    /// Drain whatever bytes are queued. Called once per main-loop
    /// iteration before reaping, so a SIGCHLD that arrives mid-reap isn't
    /// lost (edge-triggered notification, level-triggered reaping).
    pub fn drain(&mut self) {
        let mut buf = [0u8; 64];
        loop {
            match self.read_end.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }
}

/// Reap every child that has exited, stopped, or continued without
/// blocking, updating `jobs` and printing `Done`/`Stopped` notices when
/// `interactive`. Background completions are reported once, then their
/// slot is freed.
pub fn reap_background(jobs: &mut JobTable, interactive: bool) {
    loop {
        let mut raw_status: libc::c_int = 0;
        let pid = unsafe {
            libc::waitpid(
                -1,
                &mut raw_status,
                libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED,
            )
        };

        if pid <= 0 {
            break;
        }

        // Looked up by member pid, not `getpgid(pid)`: once `waitpid` has
        // reaped a terminated child the kernel has already released its
        // process table entry, so `getpgid` on it would return ESRCH. Every
        // stage's pid was recorded at spawn time, so membership lookup
        // works regardless of whether the pid is still alive.
        if unsafe { libc::WIFSTOPPED(raw_status) } {
            jobs.update_state_by_member(pid, JobState::Stopped);
            continue;
        }

        if unsafe { libc::WIFCONTINUED(raw_status) } {
            jobs.update_state_by_member(pid, JobState::Running);
            continue;
        }

        if crate::status::exit_code_from_wait_status(raw_status).is_some() {
            if let Some((id, command)) = jobs.note_member_exited(pid) {
                if interactive {
                    println!("[{id}]+  Done\t\t{command}");
                    let _ = io::stdout().flush();
                }
            }
        }
    }
}
