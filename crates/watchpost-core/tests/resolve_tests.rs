//! Integration tests for resolving configuration files from disk

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use watchpost_core::config::{
    ConfigError, DropAction, OutputKind, Severity, resolve_config,
};

/// Helper to write a settings file into the temp dir
fn write_config(temp_dir: &TempDir, contents: &str) -> PathBuf {
    let path = temp_dir.path().join("watchpost.yaml");
    fs::write(&path, contents).unwrap();
    path
}

/// Helper to create a rules directory with the given file names
fn rules_dir(root: &Path, name: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for file in files {
        fs::write(dir.join(file), "- macro: always_true\n  condition: (evt.num>=0)\n").unwrap();
    }
    dir
}

#[test]
fn test_full_document() {
    let temp_dir = TempDir::new().unwrap();
    let base_rules = temp_dir.path().join("base_rules.yaml");
    fs::write(&base_rules, "- list: shells\n  items: [bash]\n").unwrap();
    let rules_d = rules_dir(temp_dir.path(), "rules.d", &["20-net.yaml", "10-fs.yaml"]);
    fs::create_dir(rules_d.join("disabled")).unwrap();

    let contents = format!(
        r#"
rules_file:
  - {base}
  - {missing}
  - {dir}

json_output: true
json_include_tags_property: false
log_stderr: true
log_syslog: false
log_level: notice
priority: warning
buffered_outputs: true

file_output:
  enabled: true
  keep_alive: false
  filename: ./events.txt
stdout_output:
  enabled: true
http_output:
  enabled: true
  url: http://collector:2801/
grpc:
  enabled: true
  bind_address: "unix:///run/watchpost/watchpost.sock"
  threadiness: 8
grpc_output:
  enabled: true

webserver:
  enabled: true
  listen_port: 9000
  ssl_enabled: false

syscall_event_drops:
  actions:
    - log
    - alert
  threshold: 0.25
  rate: 0.5
  max_burst: 10

metadata_download:
  max_mb: 200
  chunk_wait_us: 500
  watch_freq_sec: 5

load_plugins: [cloudtrail]
plugins:
  - name: cloudtrail
    library_path: libcloudtrail.so
    init_config: ""
    open_params: "s3://trail-bucket/"
  - name: json
    library_path: libjson.so
    init_config: ""
"#,
        base = base_rules.display(),
        missing = temp_dir.path().join("missing.yaml").display(),
        dir = rules_d.display(),
    );
    let path = write_config(&temp_dir, &contents);

    let config = resolve_config::<&str>(&path, &[]).unwrap();

    assert_eq!(config.config_file, path);
    assert_eq!(
        config.rules_files,
        vec![
            base_rules,
            rules_d.join("10-fs.yaml"),
            rules_d.join("20-net.yaml"),
        ]
    );

    assert!(config.json.enabled);
    assert!(config.json.include_output_property);
    assert!(!config.json.include_tags_property);

    let kinds: Vec<_> = config.outputs.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        [OutputKind::File, OutputKind::Stdout, OutputKind::Http, OutputKind::Grpc]
    );
    let file = config.output(OutputKind::File).unwrap();
    assert_eq!(file.option("filename"), Some("./events.txt"));
    assert_eq!(file.option("keep_alive"), Some("false"));

    assert_eq!(config.grpc.bind_address, "unix:///run/watchpost/watchpost.sock");
    assert_eq!(config.grpc.threadiness, 8);

    assert_eq!(config.logging.level, Severity::Notice);
    assert!(config.logging.stderr);
    assert!(!config.logging.syslog);
    assert_eq!(config.min_priority, Severity::Warning);
    assert!(config.buffered_outputs);

    assert!(config.webserver.enabled);
    assert_eq!(config.webserver.listen_port, 9000);

    let drops = &config.syscall_event_drops;
    assert!(drops.actions.contains(DropAction::Log));
    assert!(drops.actions.contains(DropAction::Alert));
    assert!(!drops.actions.contains(DropAction::Ignore));
    assert_eq!(drops.threshold, 0.25);
    assert_eq!(drops.rate, 0.5);
    assert_eq!(drops.max_burst, 10.0);

    assert_eq!(config.metadata_download.max_mb, 200);
    assert_eq!(config.metadata_download.chunk_wait_us, 500);
    assert_eq!(config.metadata_download.watch_freq_sec, 5);

    assert_eq!(config.plugins.len(), 1);
    let plugin = config.plugin("cloudtrail").unwrap();
    assert_eq!(plugin.open_params, "s3://trail-bucket/");
    assert!(config.plugin("json").is_none());
}

#[test]
fn test_overrides_applied_before_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        "log_level: info\nstdout_output:\n  enabled: false\n",
    );

    let config = resolve_config(
        &path,
        &["stdout_output.enabled=true", "log_level=debug", "json_output=true"],
    )
    .unwrap();

    assert_eq!(config.logging.level, Severity::Debug);
    assert!(config.json.enabled);
    assert_eq!(config.outputs[0].kind, OutputKind::Stdout);
}

#[test]
fn test_malformed_override_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "stdout_output:\n  enabled: true\n");

    let err = resolve_config(&path, &["log_level"]).unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
}

#[test]
fn test_all_outputs_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        "file_output:\n  enabled: false\nstdout_output:\n  enabled: false\nsyslog_output:\n  enabled: false\n\
         program_output:\n  enabled: false\nhttp_output:\n  enabled: false\ngrpc_output:\n  enabled: false\n",
    );

    let err = resolve_config::<&str>(&path, &[]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("No outputs configured"), "{message}");
    assert!(message.contains("watchpost.yaml"), "{message}");
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = resolve_config::<&str>(&temp_dir.path().join("absent.yaml"), &[]).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_unparseable_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "stdout_output: {enabled: true\n");
    let err = resolve_config::<&str>(&path, &[]).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_rules_directory_added_by_override() {
    let temp_dir = TempDir::new().unwrap();
    let dir = rules_dir(temp_dir.path(), "extra", &["b.yaml", "a.yaml"]);
    let path = write_config(&temp_dir, "stdout_output:\n  enabled: true\n");

    let option = format!("rules_file={}", dir.display());
    let config = resolve_config(&path, &[option]).unwrap();
    assert_eq!(config.rules_files, vec![dir.join("a.yaml"), dir.join("b.yaml")]);
}

#[test]
fn test_configuration_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<watchpost_core::Configuration>();
}
