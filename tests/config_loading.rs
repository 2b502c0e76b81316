use std::fs;

use action_flow::{Pacing, Variant};
use busflow_cli::config::{load_config, ConfigError};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn loads_yaml_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("busflow.yaml");
    fs::write(
        &path,
        r#"
browser:
  headless: true
  window_width: 1280
booking:
  variant: indexed
  pacing: fast
  to: Ajmer
  passenger:
    first_name: Asha
artifacts_dir: /tmp/busflow-shots
"#,
    )
    .unwrap();

    let loaded = assert_ok!(load_config(Some(&path)).await);
    assert_eq!(loaded.path.as_deref(), Some(path.as_path()));

    let config = loaded.config;
    assert!(config.browser.headless);
    assert_eq!(config.browser.window_width, 1280);
    assert_eq!(config.browser.window_height, 900);
    assert_eq!(config.booking.variant, Variant::Indexed);
    assert_eq!(config.booking.pacing_for(Variant::Indexed), Pacing::Fast);

    let booking = config.booking.booking(Variant::Indexed);
    assert_eq!(booking.from, "Delhi");
    assert_eq!(booking.to, "Ajmer");
    assert_eq!(booking.days_ahead, 7);
    assert_eq!(booking.passenger.first_name, "Asha");
    assert_eq!(booking.passenger.last_name, "test");
}

#[tokio::test]
async fn missing_explicit_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.yaml");
    let err = assert_err!(load_config(Some(&path)).await);
    assert!(matches!(err, ConfigError::NotFound(p) if p == path));
}

#[tokio::test]
async fn malformed_yaml_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "booking: [unterminated\n").unwrap();
    let err = assert_err!(load_config(Some(&path)).await);
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.yaml"));
}

#[tokio::test]
async fn unknown_variant_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("variant.yaml");
    fs::write(&path, "booking:\n  variant: scenic\n").unwrap();
    let err = assert_err!(load_config(Some(&path)).await);
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[tokio::test]
async fn invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.yaml");
    fs::write(&path, "locator:\n  scan_limit: 0\n").unwrap();
    let err = assert_err!(load_config(Some(&path)).await);
    assert!(matches!(err, ConfigError::Invalid(_)));
}
