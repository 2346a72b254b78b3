use hsn_validator::utils::validation::Validate;
use hsn_validator::{ReasonCode, TableStore, TomlConfig, ValidationService};
use serde_json::json;
use tempfile::TempDir;

fn setup(config_body: &str) -> (TempDir, TomlConfig) {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("master.tsv");
    std::fs::write(
        &data_path,
        "Code\tText\n0101\tLive horses\n0101\tDuplicate horses\n9954\tConstruction services\n\t(blank)\n",
    )
    .unwrap();

    let config_path = dir.path().join("hsn.toml");
    std::fs::write(
        &config_path,
        format!(
            "[data]\npath = \"{}\"\ncode_column = \"Code\"\ndescription_column = \"Text\"\n{}",
            data_path.display(),
            config_body
        ),
    )
    .unwrap();

    let config = TomlConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();
    (dir, config)
}

fn build_service(config: &TomlConfig) -> ValidationService {
    let store = TableStore::from_source(&config.table_source().unwrap());
    ValidationService::new(store, config.guardrail_chain()).with_audit(config.service.audit)
}

#[test]
fn test_service_from_config_with_default_guardrails() {
    let (_dir, config) = setup("");
    let service = build_service(&config);

    assert_eq!(service.table_len(), 2);

    let results = service.validate(&json!(["0101"]));
    assert_eq!(results[0].description.as_deref(), Some("Live horses"));

    let results = service.validate(&json!(["0101", "9954"]));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].reason_code, Some(ReasonCode::BlockedByGuardrail));
    assert_eq!(
        service.last_audit().unwrap().blocked_by.as_deref(),
        Some("block_code_prefix")
    );

    assert!(service.screen_message("this is STUPID").is_some());
}

#[test]
fn test_service_from_config_without_guardrails_and_last_wins() {
    let (_dir, config) = setup(
        "duplicate_policy = \"last_wins\"\n\n[guardrails]\nenabled = false\n\n[service]\naudit = false\n",
    );
    let service = build_service(&config);

    let results = service.validate(&json!(["0101", "9954"]));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].description.as_deref(), Some("Duplicate horses"));
    assert_eq!(results[1].description.as_deref(), Some("Construction services"));
    assert!(service.screen_message("this is STUPID").is_none());
    assert!(service.last_audit().is_none());
}
