//! Configuration layering tests

use sbatch_verify::config::{ConfigError, ConfigOrigin, EffectiveConfig};
use sbatch_verify::submit::SubmitCommand;
use std::fs;

#[test]
fn test_host_file_cli_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let host = dir.path().join("host.toml");
    let explicit = dir.path().join("site.toml");

    fs::write(
        &host,
        "[controller]\nurl = \"http://host-layer:6820\"\napi_version = \"v0.0.39\"\n[submit]\nextra_flags = \"-A host\"\n",
    )
    .unwrap();
    fs::write(&explicit, "[controller]\nurl = \"http://file-layer:6820\"\n").unwrap();

    let cli = EffectiveConfig::cli_layer(None, Some("v0.0.41"));
    let config = EffectiveConfig::build(Some(&host), Some(&explicit), cli).unwrap();
    let settings = config.settings().unwrap();

    assert_eq!(settings.controller.url, "http://file-layer:6820");
    assert_eq!(settings.controller.api_version, "v0.0.41");
    assert_eq!(settings.submit.extra_flags, "-A host");
    assert_eq!(settings.submit.tool, "sbatch");

    let origins: Vec<_> = config.sources.iter().map(|s| s.origin.clone()).collect();
    assert_eq!(
        origins,
        vec![ConfigOrigin::Builtin, ConfigOrigin::Host, ConfigOrigin::File, ConfigOrigin::Cli]
    );
    assert!(config.sources[1].digest.is_some());
}

#[test]
fn test_submit_settings_flow_into_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.toml");
    fs::write(&path, "[submit]\nextra_flags = \"\"\nwrap = \"--wrap='hostname'\"\n").unwrap();

    let config = EffectiveConfig::build(None, Some(&path), None).unwrap();
    let command = SubmitCommand::from_settings(&config.settings().unwrap().submit);

    assert_eq!(
        command.command_line("-p debug"),
        "sbatch --begin=\"now+1second\" --wrap='hostname' -p debug"
    );
    assert_eq!(
        command.argv("-p debug").unwrap(),
        vec!["sbatch", "--begin=now+1second", "--wrap=hostname", "-p", "debug"]
    );
}

#[test]
fn test_secret_keys_redacted_in_printed_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.toml");
    fs::write(&path, "[token]\nstatic_jwt = \"eyJ.secret.sig\"\n").unwrap();

    let config = EffectiveConfig::build(None, Some(&path), None).unwrap();
    let json = config.to_json().unwrap();

    assert!(!json.contains("eyJ.secret.sig"));
    assert_eq!(config.redactions, vec!["token.static_jwt".to_string()]);
    assert_eq!(config.get_str("token.env_var"), Some("SLURM_JWT"));
}

#[test]
fn test_invalid_api_version_rejected() {
    let cli = EffectiveConfig::cli_layer(Some("http://localhost:6820"), Some("0.0.40"));
    let err = EffectiveConfig::build(None, None, cli).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("api_version"));
}
