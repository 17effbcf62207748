use std::io::Write;
use std::process::{Command, Stdio};

fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_seal"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn seal");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn backgrounded_pipeline_prints_job_id_and_pgid() {
    let output = run_shell(&["sleep 0.2 &", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]"), "stdout was: {stdout}");
    assert!(stdout.contains("Running"), "stdout was: {stdout}");
}

#[test]
fn second_background_job_gets_the_next_free_id() {
    let output = run_shell(&["sleep 0.2 &", "sleep 0.2 &", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]"), "stdout was: {stdout}");
    assert!(stdout.contains("[2]"), "stdout was: {stdout}");
}

#[test]
fn completed_background_job_is_reaped_before_the_next_prompt() {
    // Non-interactive (piped stdin), so no "Done" line is printed, but the
    // slot is freed: after a foreground command that outlasts the
    // background one, `jobs` shows nothing left.
    let output = run_shell(&["sleep 0.1 &", "sleep 1", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let jobs_section = stdout.rsplit("jobs").next().unwrap_or("");
    assert!(
        !jobs_section.contains("Running"),
        "expected no running jobs left, stdout was: {stdout}"
    );
}

#[test]
fn fg_on_unknown_job_id_reports_error() {
    let output = run_shell(&["fg 99"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no such job"), "stderr was: {stderr}");
}

#[test]
fn bg_on_unknown_job_id_reports_error() {
    let output = run_shell(&["bg 99"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no such job"), "stderr was: {stderr}");
}
