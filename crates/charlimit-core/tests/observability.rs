//! Global subscriber installation.
//!
//! Lives in its own test binary: the subscriber can be installed once per
//! process.

use camino::Utf8PathBuf;
use charlimit_core::Config;
use charlimit_core::observability::init_from_config;
use tempfile::TempDir;

#[test]
#[allow(unsafe_code)]
fn configured_log_dir_receives_json_lines() {
    // SAFETY: this binary runs a single test, nothing else reads the env.
    unsafe {
        std::env::remove_var("CHARLIMIT_LOG_DIR");
    }
    let tmp = TempDir::new().unwrap();
    let config = Config {
        log_dir: Some(Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()),
        ..Default::default()
    };

    let guard = init_from_config(&config, false, 0).unwrap();
    assert!(guard.is_some());
    tracing::error!(marker_count = 3, "log pipeline ready");
    drop(guard);

    let logs: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("charlimit.jsonl"))
        })
        .collect();
    assert_eq!(logs.len(), 1);
    let contents = std::fs::read_to_string(&logs[0]).unwrap();
    let line = contents.lines().find(|line| line.contains("log pipeline ready")).unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["level"], "ERROR");
    assert_eq!(event["fields"]["marker_count"], 3);

    assert!(init_from_config(&config, false, 0).is_err());
}
