//! Installs the global subscriber, so it lives in its own test binary.

use fsrouter::logging::{init_logging, try_init_logging, LogConfig, LogFormat};

#[test]
fn test_second_init_is_harmless() {
    let config = LogConfig {
        log_level: "error".to_string(),
        format: LogFormat::Pretty,
        target_filter: Some("fsrouter=error".to_string()),
        include_location: false,
    };
    assert!(init_logging(&config).is_ok());
    try_init_logging(&config);
    assert!(init_logging(&LogConfig::default()).is_err());
}
