//! Conversion between raw `waitpid` statuses and shell-visible exit codes.

/// Decode a raw `waitpid` status for a process known to have terminated
/// (exited or killed by a signal) into a shell exit code.
///
/// Processes terminated by a signal map to `128 + signal`, matching every
/// POSIX shell's `$?` convention. Returns `None` if the status describes
/// neither an exit nor a signal termination (e.g. a stop/continue status
/// reaped through the same call by mistake).
pub fn exit_code_from_wait_status(raw_status: libc::c_int) -> Option<i32> {
    if unsafe { libc::WIFEXITED(raw_status) } {
        return Some(unsafe { libc::WEXITSTATUS(raw_status) });
    }

    if unsafe { libc::WIFSIGNALED(raw_status) } {
        let signal = unsafe { libc::WTERMSIG(raw_status) };
        return Some(128 + signal);
    }

    None
}
