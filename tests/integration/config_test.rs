//! Config file loading

use std::io::Write;

use roomchat::client::Config;
use roomchat::shared::{AppConfig, ConfigError, RoomId};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
server_url = "https://chat.example.com"
token = "abc"

[identity]
id = "7"
author_name = "alice"

[reconnect]
max_attempts = 0
"#
    )
    .unwrap();

    let app = crate::assert_ok!(AppConfig::load(file.path()));
    let config = Config::from(app);
    let room = RoomId::new("general").unwrap();

    assert_eq!(config.identity().unwrap().author_name, "alice");
    assert_eq!(config.history_url(&room), "https://chat.example.com/api/rooms/general/");
    assert_eq!(config.channel_url(&room), "wss://chat.example.com/ws/chat/general/");
    assert!(!config.reconnect_policy().is_enabled());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    crate::assert_err!(AppConfig::load(dir.path().join("missing.toml")), ConfigError::Io(_));
}

#[test]
fn test_load_invalid_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"server_url = "ftp://chat.example.com""#).unwrap();
    crate::assert_err!(AppConfig::load(file.path()), ConfigError::InvalidUrl(_));
}
