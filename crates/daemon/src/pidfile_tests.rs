use super::*;

#[test]
fn acquire_writes_the_current_pid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("daemon.pid");
    let pid_file = PidFile::acquire(&path).expect("acquire");
    let contents = std::fs::read_to_string(pid_file.path()).expect("read");
    assert_eq!(contents.trim().parse::<u32>().expect("parse"), std::process::id());
}

#[test]
fn acquire_fails_when_another_handle_already_holds_the_lock() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("daemon.pid");
    std::fs::write(&path, "12345").expect("write");

    // A distinct open file description on the same path, locked exclusively:
    // `flock` conflicts are per-open-description, so this reproduces the
    // two-daemons-racing-at-once scenario without spawning a real process.
    let holder = std::fs::OpenOptions::new().write(true).open(&path).expect("open");
    holder.lock_exclusive().expect("lock");

    let err = PidFile::acquire(&path).unwrap_err();
    assert!(matches!(err, DaemonError::AlreadyRunning(pid) if pid == 12345));
}

#[test]
fn acquire_reclaims_a_file_with_stale_contents_but_no_lock() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("daemon.pid");
    // A PID value exceedingly unlikely to be alive, and nobody holds the
    // advisory lock on this path, so acquisition must succeed.
    std::fs::write(&path, "999999").expect("write");

    let pid_file = PidFile::acquire(&path).expect("acquire over stale file");
    let contents = std::fs::read_to_string(pid_file.path()).expect("read");
    assert_eq!(contents.trim().parse::<u32>().expect("parse"), std::process::id());
}

#[test]
fn acquire_overwrites_an_unreadable_pid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("daemon.pid");
    std::fs::write(&path, "not-a-pid").expect("write");

    let pid_file = PidFile::acquire(&path).expect("acquire over garbage file");
    let contents = std::fs::read_to_string(pid_file.path()).expect("read");
    assert_eq!(contents.trim().parse::<u32>().expect("parse"), std::process::id());
}
