//! Integration tests for volley-config

use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;
use volley_config::domains::logging::{LogFormat, LogLevel};
use volley_config::*;

#[test]
fn test_default_config_validation() {
    let config = VolleyConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("VOLLEY_REQUEST_COUNT", Some("500")),
        ("VOLLEY_CONCURRENCY", Some("25")),
        ("VOLLEY_HTTP_TIMEOUT", Some("5")),
        ("VOLLEY_WORKLOAD", Some("mixed")),
        ("VOLLEY_LOG_LEVEL", Some("debug")),
        ("VOLLEY_LOG_FORMAT", Some("json")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.run.request_count, 500);
        assert_eq!(config.run.concurrency, 25);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.database.workload, Workload::Mixed);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.notify.is_none());
    });
}

#[test]
fn test_invalid_env_value_is_rejected() {
    with_vars(vec![("VOLLEY_CONCURRENCY", Some("many"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });
}

#[test]
fn test_zero_concurrency_fails_validation() {
    with_vars(vec![("VOLLEY_CONCURRENCY", Some("0"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::DomainError { .. }));
    });
}

#[test]
fn test_notify_from_env() {
    let vars = vec![
        ("VOLLEY_NOTIFY_TOKEN", Some("secret")),
        ("VOLLEY_NOTIFY_CHAT_ID", Some("42")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();
        let notify = config.notify.expect("notify section should be created");
        assert_eq!(notify.token, "secret");
        assert_eq!(notify.chat_id, 42);
    });

    with_vars(vec![("VOLLEY_NOTIFY_TOKEN", Some("secret"))], || {
        assert!(ConfigLoader::new().from_env().is_err());
    });
}

#[test]
fn test_yaml_config_serialization() {
    let yaml = VolleyConfig::generate_sample();
    let parsed: VolleyConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.run.concurrency, VolleyConfig::default().run.concurrency);
}

#[test]
fn test_comprehensive_config_file() {
    let yaml = r#"
run:
  request_count: 100
  concurrency: 10
  payload_seed: 7
  settle_timeout: 1

http:
  target_url: "http://127.0.0.1:9000"
  timeout: 3
  message_text: "/stress"

listener:
  bind_address: "0.0.0.0"
  port: 9001

database:
  url: "mysql://root:pw@localhost/volley"
  max_connections: 10
  workload: upsert
  bootstrap_schema: false

notify:
  token: "abc"
  chat_id: -100

logging:
  level: warn
  format: compact
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = ConfigLoader::with_prefix("VOLLEY_TEST_UNSET")
        .load(Some(file.path()))
        .unwrap();

    assert_eq!(config.run.request_count, 100);
    assert_eq!(config.run.payload_seed, 7);
    assert_eq!(config.run.settle_timeout, Duration::from_secs(1));
    assert_eq!(config.http.message_text, "/stress");
    assert_eq!(config.listener.port, 9001);
    assert_eq!(config.database.pool_size(config.run.concurrency), 10);
    assert_eq!(config.database.workload, Workload::Upsert);
    assert!(!config.database.bootstrap_schema);
    let notify = config.notify.unwrap();
    assert_eq!(notify.api_base, "https://api.telegram.org");
    assert_eq!(notify.chat_id, -100);
    assert_eq!(config.logging.level, LogLevel::Warn);
}

#[test]
fn test_missing_file_is_an_error() {
    let err = ConfigLoader::new()
        .from_file("/definitely/not/here.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}
