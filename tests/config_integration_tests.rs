//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Defaults when no configuration file exists
//! - Saving and reloading a modified configuration
//! - Partial files falling back to defaults per field
//! - Invalid YAML reported as an error

use camino::Utf8PathBuf;
use rigpanel::ConfigManager;
use rigpanel::config::CONFIG_FILE_NAME;
use rigpanel::models::RigConfig;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.config_path(), config_path.join(CONFIG_FILE_NAME));
}

#[test]
fn test_create_config_manager_makes_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("RigPanel Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn test_load_defaults_without_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_config().unwrap();

    assert_eq!(config.serial.port, "/dev/ttyUSB0");
    assert_eq!(config.serial.baud_rate, 115_200);
    assert_eq!(config.serial.read_timeout(), Duration::from_secs(1));
    assert_eq!(config.daq.sample_rate, 4000.0);
    assert_eq!(config.daq.sync_mode, 2);
    assert_eq!(config.console.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.panel.default_command, "n2000 i248 g0 h0 v1 r5 p40 m");
}

#[test]
fn test_save_and_reload() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = RigConfig::default();
    config.serial.port = "/dev/ttyACM1".to_string();
    config.daq.sample_count = 250;
    config.console.max_lines = 200;
    config.console.line_format = "{levelname} {message}".to_string();
    manager.save_config(&config).unwrap();

    assert!(manager.config_path().exists());

    let loaded = manager.load_config().unwrap();
    assert_eq!(loaded.serial.port, "/dev/ttyACM1");
    assert_eq!(loaded.daq.sample_count, 250);
    assert_eq!(loaded.console.max_lines, 200);
    assert_eq!(loaded.console.line_format, "{levelname} {message}");
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.config_path(),
        "daq:\n  sample_rate: 2000\nlogging:\n  debug: false\n",
    )
    .unwrap();

    let config = manager.load_config().unwrap();
    assert_eq!(config.daq.sample_rate, 2000.0);
    assert_eq!(config.daq.high_channel, 1);
    assert!(!config.logging.debug);
    assert_eq!(config.logging.log_prefix, "rigpanel");
    assert_eq!(config.serial.baud_rate, 115_200);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.config_path(), "serial: [unterminated\n").unwrap();

    assert!(manager.load_config().is_err());
}
