//! The job table: a bounded array of [`Job`] slots.
//!
//! Slot `k` owns job id `k + 1`; the lowest free slot wins on `add`, which
//! keeps ids stable and low as the table churns — `jobs`/`fg n` depend on
//! this.

/// Bound on simultaneously tracked jobs.
pub const MAX_JOBS: usize = 64;

/// The lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl JobState {
    pub fn label(self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
        }
    }
}

/// A single tracked background or stopped job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: usize,
    pub pgid: libc::pid_t,
    pub command: String,
    pub state: JobState,
    /// pids of every stage still outstanding. Populated at spawn time and
    /// drained one-by-one as each stage is reaped, so a terminated member's
    /// owning job can be found without asking the kernel for its pgid —
    /// `waitpid` has already reclaimed the pid by the time we'd ask.
    pub member_pids: Vec<libc::pid_t>,
}

/// Fixed-capacity job table. Slot `k` (0-based) holds job id `k + 1`.
pub struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    active_count: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            slots: [const { None }; MAX_JOBS],
            active_count: 0,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Add a job, returning its id. `None` if the table is full — the
    /// caller prints `seal: jobs table full`. `member_pids` is every stage's
    /// pid, used later to resolve a reaped pid back to this job.
    pub fn add(
        &mut self,
        pgid: libc::pid_t,
        command: String,
        state: JobState,
        member_pids: Vec<libc::pid_t>,
    ) -> Option<usize> {
        let slot = self.slots.iter().position(|s| s.is_none())?;
        let id = slot + 1;
        self.slots[slot] = Some(Job {
            id,
            pgid,
            command,
            state,
            member_pids,
        });
        self.active_count += 1;
        Some(id)
    }

    /// Remove a job by id. Idempotent on unoccupied slots.
    pub fn remove(&mut self, job_id: usize) {
        if job_id == 0 || job_id > MAX_JOBS {
            return;
        }
        let slot = job_id - 1;
        if self.slots[slot].take().is_some() {
            self.active_count -= 1;
        }
    }

    pub fn get(&self, job_id: usize) -> Option<&Job> {
        if job_id == 0 || job_id > MAX_JOBS {
            return None;
        }
        self.slots[job_id - 1].as_ref()
    }

    pub fn find_by_pgid(&self, pgid: libc::pid_t) -> Option<&Job> {
        self.slots.iter().flatten().find(|j| j.pgid == pgid)
    }

    /// Set the state of the job owning `pgid`, if any is tracked.
    pub fn update_state(&mut self, pgid: libc::pid_t, state: JobState) {
        if let Some(job) = self.slots.iter_mut().flatten().find(|j| j.pgid == pgid) {
            job.state = state;
        }
    }

    /// Set the state of the job that has `pid` among its outstanding
    /// members. Used while reaping, where the pid is still live (stopped or
    /// continued, not yet exited) so membership lookup works without
    /// mutating the table.
    pub fn update_state_by_member(&mut self, pid: libc::pid_t, state: JobState) {
        if let Some(job) = self
            .slots
            .iter_mut()
            .flatten()
            .find(|j| j.member_pids.contains(&pid))
        {
            job.state = state;
        }
    }

    /// Record that `pid` — one stage of some tracked job — has exited or
    /// been killed. Once every member of that job has been accounted for,
    /// the slot is freed and `(job_id, command)` is returned so the caller
    /// can print the completion notice; returns `None` while members remain
    /// outstanding, or if `pid` isn't tracked at all.
    pub fn note_member_exited(&mut self, pid: libc::pid_t) -> Option<(usize, String)> {
        for slot in &mut self.slots {
            let Some(job) = slot else { continue };
            let Some(pos) = job.member_pids.iter().position(|&p| p == pid) else {
                continue;
            };
            job.member_pids.remove(pos);
            if job.member_pids.is_empty() {
                let id = job.id;
                let command = job.command.clone();
                *slot = None;
                self.active_count -= 1;
                return Some((id, command));
            }
            return None;
        }
        None
    }

    /// All occupied jobs, in slot (ascending id) order.
    pub fn enumerate(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    /// The highest job id currently occupied — the `fg`/`bg` "no argument"
    /// default target when a more specific rule (most-recent-stopped)
    /// doesn't apply.
    pub fn most_recent_id(&self) -> Option<usize> {
        self.enumerate().map(|j| j.id).max()
    }

    /// Id of the most-recently-added stopped job, walked in reverse slot
    /// order. This is "most recent by slot", not "most recent by time" —
    /// acceptable given the lowest-free-id allocation policy.
    pub fn most_recent_stopped_id(&self) -> Option<usize> {
        self.slots
            .iter()
            .rev()
            .flatten()
            .find(|j| j.state == JobState::Stopped)
            .map(|j| j.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_lowest_free_id() {
        let mut table = JobTable::new();
        let a = table
            .add(100, "a".into(), JobState::Running, vec![100])
            .unwrap();
        let b = table
            .add(200, "b".into(), JobState::Running, vec![200])
            .unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        table.remove(a);
        let c = table
            .add(300, "c".into(), JobState::Running, vec![300])
            .unwrap();
        assert_eq!(c, 1, "freed slot 1 should be reused before a new one");
    }

    #[test]
    fn add_remove_round_trip_restores_table() {
        let mut table = JobTable::new();
        let before: Vec<_> = table.enumerate().map(|j| j.id).collect();
        let id = table
            .add(42, "sleep 1".into(), JobState::Running, vec![42])
            .unwrap();
        table.remove(id);
        let after: Vec<_> = table.enumerate().map(|j| j.id).collect();
        assert_eq!(before, after);
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn table_full_returns_none() {
        let mut table = JobTable::new();
        for i in 0..MAX_JOBS {
            let pid = i as libc::pid_t + 1;
            assert!(table
                .add(pid, "x".into(), JobState::Running, vec![pid])
                .is_some());
        }
        assert!(table
            .add(9999, "overflow".into(), JobState::Running, vec![9999])
            .is_none());
    }

    #[test]
    fn find_by_pgid_and_update_state() {
        let mut table = JobTable::new();
        let id = table
            .add(55, "cmd".into(), JobState::Running, vec![55])
            .unwrap();
        table.update_state(55, JobState::Stopped);
        assert_eq!(table.get(id).unwrap().state, JobState::Stopped);
        assert_eq!(table.find_by_pgid(55).unwrap().id, id);
    }

    #[test]
    fn active_count_matches_occupied_slots() {
        let mut table = JobTable::new();
        let a = table
            .add(1, "a".into(), JobState::Running, vec![1])
            .unwrap();
        table.add(2, "b".into(), JobState::Running, vec![2]).unwrap();
        assert_eq!(table.active_count(), 2);
        table.remove(a);
        assert_eq!(table.active_count(), 1);
    }

    #[test]
    fn most_recent_stopped_prefers_highest_slot() {
        let mut table = JobTable::new();
        let a = table
            .add(1, "a".into(), JobState::Stopped, vec![1])
            .unwrap();
        let b = table
            .add(2, "b".into(), JobState::Running, vec![2])
            .unwrap();
        let c = table
            .add(3, "c".into(), JobState::Stopped, vec![3])
            .unwrap();
        assert_eq!(table.most_recent_stopped_id(), Some(c));
        table.remove(c);
        assert_eq!(table.most_recent_stopped_id(), Some(a));
        let _ = b;
    }

    #[test]
    fn update_state_by_member_finds_any_stage_pid() {
        let mut table = JobTable::new();
        let id = table
            .add(10, "sleep 1 | cat".into(), JobState::Running, vec![10, 11])
            .unwrap();
        // The second stage's pid, not the pgid/leader pid.
        table.update_state_by_member(11, JobState::Stopped);
        assert_eq!(table.get(id).unwrap().state, JobState::Stopped);
    }

    #[test]
    fn note_member_exited_waits_for_every_stage() {
        let mut table = JobTable::new();
        let id = table
            .add(20, "sleep 1 | cat".into(), JobState::Running, vec![20, 21])
            .unwrap();

        // Non-leader stage exits first: job stays tracked.
        assert_eq!(table.note_member_exited(21), None);
        assert!(table.get(id).is_some());

        // Leader exits last: job is reported done and removed.
        let done = table.note_member_exited(20).unwrap();
        assert_eq!(done, (id, "sleep 1 | cat".to_string()));
        assert!(table.get(id).is_none());
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn note_member_exited_ignores_untracked_pid() {
        let mut table = JobTable::new();
        table
            .add(30, "x".into(), JobState::Running, vec![30])
            .unwrap();
        assert_eq!(table.note_member_exited(999), None);
    }

    #[test]
    fn remove_is_idempotent_on_unoccupied_slot() {
        let mut table = JobTable::new();
        table.remove(5);
        table.remove(5);
        assert_eq!(table.active_count(), 0);
    }
}
