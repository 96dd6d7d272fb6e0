//! Crash survival specs
//!
//! A child process (this test binary, re-executed) stages a payload and
//! blocks inside the function until it is killed. The payload must survive
//! on disk, unlocked, and be recoverable.

use crate::prelude::*;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

const CHILD_DIR_VAR: &str = "RCV_SPECS_CHILD_DIR";
const READY: &str = "RCV-CHILD-READY";

/// Body of the child process; does nothing unless spawned by the test below
#[test]
#[ignore = "run as a child process by content_survives_process_kill"]
fn blocked_child() {
    let Some(dir) = std::env::var_os(CHILD_DIR_VAR) else {
        return;
    };
    let rec = Recoverable::new(PathBuf::from(dir), |_: &[u8]| {
        println!("{READY}");
        std::io::stdout().flush()?;
        // Block until killed; the parent never writes to stdin
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>(())
    });
    let _ = rec.call(b"blocked");
}

#[test]
fn content_survives_process_kill() {
    let dir = JournalDir::new();
    let mut child = Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "recover_crash::blocked_child",
            "--ignored",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_DIR_VAR, dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let ready = BufReader::new(stdout)
        .lines()
        .any(|line| line.map(|l| l.contains(READY)).unwrap_or(false));
    if !ready {
        let _ = child.kill();
        let _ = child.wait();
        panic!("child exited before staging its payload");
    }

    // While the child lives, its entry is staged and cannot be claimed
    let id = dir.assert_single_entry(b"blocked");
    let other = Recoverable::new(dir.path(), |_: &[u8]| Ok::<_, ValueError>(()));
    assert!(other.recover(&id).unwrap_err().is_locked());
    assert!(!dir.is_lockable(&id));

    child.kill().unwrap();
    child.wait().unwrap();

    // The OS dropped the lock with the process; the payload stayed
    let survivor = dir.assert_single_entry(b"blocked");
    assert_eq!(survivor, id);
    assert!(dir.is_lockable(&id));

    let rec = Recoverable::new(dir.path(), |payload: &[u8]| {
        Ok::<_, ValueError>(payload.to_vec())
    });
    assert_eq!(rec.recover(&id).unwrap(), b"blocked");
    dir.assert_empty();
}
