use enochecker_core::config::{EnoConfig, LogFormat, DEFAULT_BIND_ADDRESS};
use enochecker_core::error::EnoError;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = EnoConfig::default();

    assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
    assert_eq!(config.checker.name, "dummy");
    assert_eq!(config.connection.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.connection.io_timeout, None);
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
fn test_load_from_toml() {
    let toml_content = r#"
[server]
bind_address = "127.0.0.1:9100"

[checker]
name = "linestore"
service_port = 4242
service_id = 7

[connection]
connect_timeout = "750ms"
buffer_capacity = 4096
read_chunk_size = 512
io_timeout = "3s"

[logging]
level = "debug"
format = "json"

[client]
request_timeout_grace = "2s"
"#;

    let temp_file = NamedTempFile::new().unwrap();
    fs::write(temp_file.path(), toml_content).unwrap();

    let config = EnoConfig::load(temp_file.path()).unwrap();

    assert_eq!(config.server.bind_address, "127.0.0.1:9100");
    assert_eq!(config.checker.name, "linestore");
    assert_eq!(config.checker.service_port, 4242);
    assert_eq!(config.checker.service_id, 7);
    assert_eq!(config.connection.connect_timeout, Duration::from_millis(750));
    assert_eq!(config.connection.buffer_capacity, 4096);
    assert_eq!(config.connection.read_chunk_size, 512);
    assert_eq!(config.connection.io_timeout, Some(Duration::from_secs(3)));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.client.request_timeout_grace, Duration::from_secs(2));
}

#[test]
fn test_invalid_toml_is_configuration_error() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(temp_file.path(), "[checker\nname = ").unwrap();

    let result = EnoConfig::load(temp_file.path());
    assert!(matches!(result, Err(EnoError::ConfigurationError { .. })));
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(temp_file.path(), "[connection]\nbuffer_capacity = 0\n").unwrap();

    assert!(EnoConfig::load(temp_file.path()).is_err());
}

#[test]
fn test_missing_file() {
    let result = EnoConfig::load(Path::new("/nonexistent/enochecker.toml"));
    assert!(matches!(result, Err(EnoError::ConfigurationError { .. })));
}

#[test]
fn test_config_serialization_roundtrip() {
    let mut config = EnoConfig::test();
    config.connection.io_timeout = Some(Duration::from_millis(1500));

    let text = toml::to_string(&config).unwrap();
    let parsed = EnoConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}
