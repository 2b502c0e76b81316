use std::io::Write;

use action_locator::{ElementFilter, Pick};
use action_primitives::AnchorDescriptor;
use busflow_recipes::{Intent, IntentTable, RecipeError};

const OVERRIDES: &str = r##"
continue-button:
  candidates:
    - anchor: { kind: css, selector: "#btnContinue" }
      label: primary
    - anchor: { kind: text, scope: button, content: Continue }
  options:
    timeout_ms: 5000
mobile:
  candidates:
    - anchor: { kind: css, selector: "input#mobileNo" }
  options:
    scan_limit: 3
    filters:
      - { kind: exclude_numeric_attr_below, name: maxlength, threshold: 8 }
"##;

#[test]
fn overrides_file_replaces_named_intents_only() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(OVERRIDES.as_bytes()).unwrap();

    let table = IntentTable::load(file.path()).unwrap();
    let builtin = IntentTable::builtin();

    let cont = table.get(Intent::ContinueButton);
    assert_eq!(cont.candidates.len(), 2);
    assert_eq!(
        cont.candidates.0[0].anchor,
        AnchorDescriptor::css("#btnContinue")
    );
    assert_eq!(cont.candidates.0[0].label.as_deref(), Some("primary"));
    assert_eq!(
        cont.candidates.0[1].anchor,
        AnchorDescriptor::text("button", "Continue")
    );
    assert_eq!(cont.options.timeout_ms, 5000);
    assert_eq!(cont.options.poll_interval_ms, 100);

    let mobile = table.get(Intent::Mobile);
    assert_eq!(mobile.options.scan_limit, 3);
    assert_eq!(mobile.options.pick, Pick::FirstVisible);
    assert_eq!(
        mobile.options.filters,
        vec![ElementFilter::ExcludeNumericAttrBelow {
            name: "maxlength".into(),
            threshold: 8
        }]
    );

    assert_eq!(table.get(Intent::Email), builtin.get(Intent::Email));
}

#[test]
fn unknown_intent_in_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "checkout-button:\n  candidates: []").unwrap();
    let err = IntentTable::load(file.path()).unwrap_err();
    assert!(matches!(err, RecipeError::Parse(_)));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intents.yaml");
    let err = IntentTable::load(&path).unwrap_err();
    assert!(matches!(err, RecipeError::Io { .. }));
    assert!(err.to_string().contains("intents.yaml"));
}

#[test]
fn dumped_table_is_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intents.yaml");
    std::fs::write(&path, IntentTable::builtin().to_yaml().unwrap()).unwrap();
    assert_eq!(IntentTable::load(&path).unwrap(), IntentTable::builtin());
}
