use super::Config;
use crate::error::Error;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("marksect.toml")).unwrap();

    assert_eq!(config.config_file, "/etc/asterisk/pjsip.conf");
    assert_eq!(config.log_file, "/var/log/asterisk/full");
    assert_eq!(config.reload_command, "sudo systemctl reload asterisk");
    assert!(config.reload);
}

#[test]
fn test_file_values_override_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "config_file = \"/tmp/pjsip.conf\"\nreload = false").unwrap();
    file.flush().unwrap();

    let config = Config::load_from(file.path()).unwrap();

    assert_eq!(config.config_file, "/tmp/pjsip.conf");
    assert!(!config.reload);
    assert_eq!(config.log_file, "/var/log/asterisk/full");
}

#[test]
fn test_unparseable_file_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "config_file = [not toml").unwrap();
    file.flush().unwrap();

    assert!(matches!(
        Config::load_from(file.path()),
        Err(Error::Config { .. })
    ));
}

#[test]
fn test_environment_overrides() {
    let config = Config::load_from(Path::new("definitely/not/here.toml"))
        .unwrap()
        .with_overrides(|key| match key {
            "PJSIP_CONFIG" => Some("/srv/pjsip.conf".to_string()),
            "RELOAD_COMMAND" => Some("true".to_string()),
            _ => None,
        });

    assert_eq!(config.config_file, "/srv/pjsip.conf");
    assert_eq!(config.reload_command, "true");
    assert_eq!(config.log_file, "/var/log/asterisk/full");
}
