use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.get_apple_script_interpreter(), "/usr/bin/osascript");
    assert_eq!(config.get_shell(), "/bin/bash");
    assert_eq!(config.get_inbox_capacity(), DEFAULT_INBOX_CAPACITY);
}

#[test]
fn test_default_scripts_dir_is_in_home() {
    let config = Config::default();
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.get_scripts_dir(), home.join(".findermenu"));
}

#[test]
fn test_scripts_dir_tilde_is_expanded() {
    let config = Config {
        scripts_dir: Some("~/menu-scripts".to_string()),
        ..Config::default()
    };
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.get_scripts_dir(), home.join("menu-scripts"));
}

#[test]
fn test_zero_inbox_capacity_falls_back_to_default() {
    let config = Config {
        inbox_capacity: Some(0),
        ..Config::default()
    };
    assert_eq!(config.get_inbox_capacity(), DEFAULT_INBOX_CAPACITY);
}

#[test]
fn test_config_deserializes_camel_case_keys() {
    let json = r#"{
        "scriptsDir": "/opt/scripts",
        "busDir": "/tmp/bus",
        "appleScriptInterpreter": "osascript",
        "shell": "/bin/sh",
        "inboxCapacity": 8
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.get_scripts_dir(), PathBuf::from("/opt/scripts"));
    assert_eq!(config.get_bus_dir(), PathBuf::from("/tmp/bus"));
    assert_eq!(config.get_apple_script_interpreter(), "osascript");
    assert_eq!(config.get_shell(), "/bin/sh");
    assert_eq!(config.get_inbox_capacity(), 8);
    assert_eq!(config.log_dir, None);
}

#[test]
fn test_empty_object_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_config_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir.path().join("config.json"));
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_config_malformed_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let config = load_config(&path);
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_config_reads_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{"shell": "/bin/zsh"}"#).unwrap();

    let config = load_config(&path);
    assert_eq!(config.get_shell(), "/bin/zsh");
}

#[test]
fn test_default_config_path_file_name() {
    let path = default_config_path();
    assert!(path.ends_with("findermenu/config.json"));
}

#[test]
fn test_read_config_reports_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{"inboxCapacity": "many"}"#).unwrap();

    match read_config(&path) {
        Err(crate::error::FinderMenuError::Config { path: reported, .. }) => {
            assert_eq!(reported, path);
        }
        other => panic!("Expected Config error, got {:?}", other),
    }
    assert_eq!(read_config(&temp_dir.path().join("missing.json")).unwrap(), None);
}
