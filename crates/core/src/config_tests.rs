use std::io::Write;

use super::*;

#[test]
fn defaults_match_documented_timeouts() {
    let config = Config::default();
    assert_eq!(config.daemon.task_timeout(), Some(Duration::from_secs(5 * 60)));
    assert_eq!(config.daemon.idle_timeout(), None);
    assert_eq!(config.daemon.heartbeat_interval(), Some(Duration::from_secs(5)));
    assert_eq!(config.daemon.stuck_timeout(), Duration::from_secs(10 * 60));
    assert_eq!(config.cache_ttl(), Duration::from_secs(5 * 60));
}

#[test]
fn load_falls_back_to_defaults_when_file_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nonexistent.yaml");
    let config = Config::load(&path).expect("load");
    assert_eq!(config.backend, "sqlite");
}

#[test]
fn load_parses_yaml_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).expect("create");
    writeln!(file, "backend: file\ncache_ttl_secs: 60\n").expect("write");

    let config = Config::load(&path).expect("load");
    assert_eq!(config.backend, "file");
    assert_eq!(config.cache_ttl_secs, 60);
}

#[test]
fn load_rejects_malformed_yaml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "backend: [unterminated").expect("write");

    assert!(Config::load(&path).is_err());
}

#[test]
#[serial_test::serial]
fn analytics_env_override_takes_precedence() {
    std::env::set_var("TODOAT_ANALYTICS_ENABLED", "false");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load(&dir.path().join("missing.yaml")).expect("load");
    assert!(!config.analytics_enabled);
    std::env::remove_var("TODOAT_ANALYTICS_ENABLED");
}

#[test]
#[serial_test::serial]
fn runtime_dir_falls_back_to_uid_scoped_tmp_path_when_unset() {
    let saved = std::env::var_os("XDG_RUNTIME_DIR");
    std::env::remove_var("XDG_RUNTIME_DIR");

    let dir = runtime_dir();
    assert!(dir.to_string_lossy().contains("todoat-"));

    if let Some(value) = saved {
        std::env::set_var("XDG_RUNTIME_DIR", value);
    }
}

#[test]
#[serial_test::serial]
fn runtime_dir_honors_xdg_override() {
    let saved = std::env::var_os("XDG_RUNTIME_DIR");
    std::env::set_var("XDG_RUNTIME_DIR", "/tmp/xdg-test-runtime");

    assert_eq!(runtime_dir(), PathBuf::from("/tmp/xdg-test-runtime/todoat"));

    match saved {
        Some(value) => std::env::set_var("XDG_RUNTIME_DIR", value),
        None => std::env::remove_var("XDG_RUNTIME_DIR"),
    }
}
