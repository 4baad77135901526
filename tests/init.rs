use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "strata init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".strata.toml");
    assert!(config_path.exists(), ".strata.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    for section in ["[history]", "[scoring]", "[scan]", "[llm]"] {
        assert!(content.contains(section), "missing {section}");
    }

    // Every value is commented out, so parsing yields the defaults.
    let config = strata_core::StrataConfig::from_toml(&content).unwrap();
    assert_eq!(config.history.depth, 10);
    assert_eq!(config.scoring.dead_code_threshold_days, 365);
    let _: toml::Value = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".strata.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".strata.toml")).unwrap();
    assert_eq!(content, "# existing");
}
