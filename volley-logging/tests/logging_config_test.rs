use volley_config::domains::logging::{LogFormat, LogLevel, LoggingConfig};
use volley_logging::{init_logging_from_config, init_simple_tracing};

#[test]
fn test_logging_config_integration() {
    let yaml_config = r#"
level: debug
format: json
include_location: true
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();

    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);

    init_logging_from_config(&config).unwrap();
}

#[test]
fn test_repeated_initialization_is_harmless() {
    init_simple_tracing("info").unwrap();
    init_simple_tracing("debug").unwrap();
    init_logging_from_config(&LoggingConfig::default()).unwrap();
}

#[test]
fn test_invalid_level_falls_back() {
    // An unparsable directive must not make initialization fail
    init_simple_tracing("[[not a filter").unwrap();
}
