use std::path::Path;

use agentic_eda::config::EdaConfig;
use agentic_eda::error::EdaError;

#[test]
fn explicit_config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
max_consecutive_tool_calls = 4
sandbox_template = "eda-python-3.11"
browser_agent_command = ["python", "browser_agent.py"]
"#,
    )
    .unwrap();

    let config = EdaConfig::load(Some(&path)).unwrap();
    assert_eq!(config.max_consecutive_tool_calls, 4);
    assert_eq!(config.sandbox_template.as_deref(), Some("eda-python-3.11"));
    assert_eq!(
        config.browser_agent_command,
        Some(vec!["python".to_string(), "browser_agent.py".to_string()])
    );
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let err = EdaConfig::load(Some(Path::new("/definitely/not/here/config.toml"))).unwrap_err();
    assert!(matches!(err, EdaError::Configuration(ref m) if m.contains("cannot read")));
}

#[test]
fn malformed_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "max_consecutive_tool_calls = \"many\"\n").unwrap();

    assert!(matches!(
        EdaConfig::load(Some(&path)),
        Err(EdaError::Configuration(_))
    ));
}
