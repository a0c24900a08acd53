use super::*;

#[test]
fn test_empty_file_yields_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:8000");
    assert_eq!(config.chat.reply_timeout_secs, 300);
    assert_eq!(config.chat.extraction_timeout_secs, 60);
    assert_eq!(config.docking.output_dir, PathBuf::from("out/docking_result"));
    assert!(config.landing.messages.is_none());
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = Config::from_toml(
        r#"
        [docking]
        vina_image = "local/vina:dev"

        [llm]
        default_backend = "ollama"

        [llm.ollama]
        model = "llama3:8b"
        base_url = "http://localhost:11434"
        "#,
    )
    .unwrap();
    assert_eq!(config.docking.vina_image, "local/vina:dev");
    assert_eq!(config.docking.docker_binary, "docker");
    assert_eq!(config.llm.default_backend, "ollama");
    let ollama = config.llm.ollama.unwrap();
    assert_eq!(ollama.model, "llama3:8b");
    assert!(ollama.api_key.is_empty());
}

#[test]
fn test_landing_messages_must_be_four() {
    let err = Config::from_toml(
        r#"
        [landing]
        messages = ["one", "two"]
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_ligand_converter_defaults_have_placeholders() {
    let ligand = LigandConfig::default();
    assert!(ligand.args.iter().any(|a| a.contains("{smiles}")));
    assert!(ligand.args.iter().any(|a| a == "{output}"));
}

#[test]
fn test_load_from_missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pharmadock.toml");
    std::fs::write(&path, "[server]\nbind = \"0.0.0.0:9000\"\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:9000");
}
