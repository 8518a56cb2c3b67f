//! End-to-end configuration tests

use mb_forecast::config::{Config, ForecastStrategy};

#[test]
fn test_example_config_loads() {
    // The shipped example must stay loadable; main falls back to it
    let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();

    assert_eq!(config.market.max_entries, 300);
    assert_eq!(config.forecast.strategy, ForecastStrategy::Sequence);
    assert_eq!(config.forecast.window_size, 5);
    assert_eq!(config.forecast.epochs, 10);
    assert_eq!(config.telemetry.metrics_port, 9090);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let toml = r#"
        [catalog]
        base_url = "https://xivapi.com"
        items_path = "./items.json"

        [market]
        base_url = "https://universalis.app/api/v2"
        max_entries = 100
        timeout_secs = 5

        [artifacts]
        dir = "./artifacts"

        [dashboard]
        bind_address = "127.0.0.1:8050"

        [telemetry]
        metrics_port = 9090
        log_level = "debug"
    "#;

    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.forecast.strategy, ForecastStrategy::Sequence);
    assert_eq!(config.forecast.retrain_after_secs, 3600);
    assert_eq!(config.capture.buffer_size, 1000);
}
