//! Plugin declarations and the `load_plugins` allow-list

use super::document::RawDocument;
use super::error::ConfigError;
use super::types::PluginConfig;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory relative plugin paths are resolved against
pub const DEFAULT_PLUGINS_DIR: &str = "/usr/share/watchpost/plugins";

/// One entry of the `plugins` sequence as written in the document
#[derive(Debug, Deserialize)]
struct PluginDeclaration {
    name: String,
    library_path: String,
    init_config: Option<Value>,
    init_config_file: Option<String>,
    open_params: Option<Value>,
    open_params_file: Option<String>,
}

/// Read the declared plugins and keep those allowed by `load_plugins`.
///
/// Without a `load_plugins` key every plugin is kept. With one, even an
/// empty one, only the named plugins are kept. All declarations are decoded
/// before filtering, so a malformed entry fails resolution either way.
pub fn load_plugins(document: &RawDocument) -> Result<Vec<PluginConfig>, ConfigError> {
    let allow_list: Option<BTreeSet<String>> = if document.is_defined("load_plugins") {
        Some(document.get_sequence::<String>("load_plugins")?.into_iter().collect())
    } else {
        None
    };

    let plugins_dir: PathBuf =
        document.get_scalar("plugins_dir", PathBuf::from(DEFAULT_PLUGINS_DIR))?;

    let declared = read_declarations(document, &plugins_dir).map_err(|message| {
        ConfigError::Plugins {
            path: document.source().to_path_buf(),
            message,
        }
    })?;

    Ok(declared
        .into_iter()
        .filter(|plugin| match &allow_list {
            None => true,
            Some(allowed) if allowed.contains(&plugin.name) => true,
            Some(_) => {
                debug!("Plugin {} not in load_plugins, skipping", plugin.name);
                false
            }
        })
        .collect())
}

fn read_declarations(document: &RawDocument, plugins_dir: &Path) -> Result<Vec<PluginConfig>, String> {
    let items = match document.node("plugins") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => return Err("plugins must be a sequence".to_string()),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let declaration: PluginDeclaration = serde_yaml::from_value(item.clone())
                .map_err(|e| format!("plugins[{index}]: {e}"))?;
            decode_plugin(declaration, plugins_dir)
        })
        .collect()
}

fn decode_plugin(declaration: PluginDeclaration, plugins_dir: &Path) -> Result<PluginConfig, String> {
    let name = declaration.name;

    let init_config = read_text_or_file(
        declaration.init_config.as_ref(),
        declaration.init_config_file.as_deref(),
        plugins_dir,
    )
    .map_err(|e| format!("plugin \"{name}\": {e}"))?
    .ok_or_else(|| format!("plugin \"{name}\": init_config or init_config_file is required"))?;

    let open_params = read_text_or_file(
        declaration.open_params.as_ref(),
        declaration.open_params_file.as_deref(),
        plugins_dir,
    )
    .map_err(|e| format!("plugin \"{name}\": {e}"))?
    .unwrap_or_default();

    Ok(PluginConfig {
        library_path: under_plugins_dir(plugins_dir, &declaration.library_path),
        name,
        init_config,
        open_params,
    })
}

/// Resolve an inline value, or the contents of a file, to plugin text.
///
/// Inline mappings and sequences are passed on as JSON. The inline form
/// wins when both are given.
fn read_text_or_file(
    inline: Option<&Value>,
    file: Option<&str>,
    plugins_dir: &Path,
) -> Result<Option<String>, String> {
    if let Some(value) = inline {
        return inline_text(value).map(Some);
    }
    let Some(file) = file else {
        return Ok(None);
    };
    let path = under_plugins_dir(plugins_dir, file);
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| format!("could not read {}: {e}", path.display()))
}

fn inline_text(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Mapping(_) | Value::Sequence(_) => {
            serde_json::to_string(value).map_err(|e| format!("cannot encode config as JSON: {e}"))
        }
        Value::Tagged(tagged) => inline_text(&tagged.value),
    }
}

fn under_plugins_dir(plugins_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        plugins_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> RawDocument {
        RawDocument::from_yaml_str(yaml, "watchpost.yaml").unwrap()
    }

    const TWO_PLUGINS: &str = r#"
plugins:
  - name: a
    library_path: liba.so
    init_config: ""
  - name: b
    library_path: /opt/plugins/libb.so
    init_config: "cfg"
    open_params: "params"
"#;

    fn names(plugins: &[PluginConfig]) -> Vec<&str> {
        plugins.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_no_allow_list_keeps_all() {
        let plugins = load_plugins(&doc(TWO_PLUGINS)).unwrap();
        assert_eq!(names(&plugins), ["a", "b"]);
    }

    #[test]
    fn test_allow_list_filters() {
        let yaml = format!("load_plugins: [a]\n{TWO_PLUGINS}");
        let plugins = load_plugins(&doc(&yaml)).unwrap();
        assert_eq!(names(&plugins), ["a"]);
    }

    #[test]
    fn test_empty_allow_list_keeps_none() {
        let yaml = format!("load_plugins: []\n{TWO_PLUGINS}");
        assert!(load_plugins(&doc(&yaml)).unwrap().is_empty());
    }

    #[test]
    fn test_library_path_resolution() {
        let plugins = load_plugins(&doc(TWO_PLUGINS)).unwrap();
        assert_eq!(
            plugins[0].library_path,
            Path::new(DEFAULT_PLUGINS_DIR).join("liba.so")
        );
        assert_eq!(plugins[1].library_path, PathBuf::from("/opt/plugins/libb.so"));
        assert_eq!(plugins[1].init_config, "cfg");
        assert_eq!(plugins[1].open_params, "params");
        assert_eq!(plugins[0].open_params, "");
    }

    #[test]
    fn test_structured_init_config_becomes_json() {
        let yaml = r#"
plugins:
  - name: k8saudit
    library_path: libk8saudit.so
    init_config:
      maxEventSize: 262144
      sslCertificate: /etc/watchpost/watchpost.pem
"#;
        let plugins = load_plugins(&doc(yaml)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&plugins[0].init_config).unwrap();
        assert_eq!(parsed["maxEventSize"], 262144);
        assert_eq!(parsed["sslCertificate"], "/etc/watchpost/watchpost.pem");
    }

    #[test]
    fn test_config_from_files() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("init.json"), "{\"x\":1}").unwrap();
        let params = temp.path().join("params.txt");
        std::fs::write(&params, "http://:9765/events").unwrap();

        let yaml = format!(
            "plugins_dir: {}\nplugins:\n  - name: c\n    library_path: libc.so\n    init_config_file: init.json\n    open_params_file: {}\n",
            temp.path().display(),
            params.display()
        );
        let plugins = load_plugins(&doc(&yaml)).unwrap();
        assert_eq!(plugins[0].init_config, "{\"x\":1}");
        assert_eq!(plugins[0].open_params, "http://:9765/events");
        assert_eq!(plugins[0].library_path, temp.path().join("libc.so"));
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let yaml = "plugins:\n  - name: c\n    library_path: /x.so\n    init_config_file: /nonexistent/init.json\n";
        let err = load_plugins(&doc(yaml)).unwrap_err();
        assert!(matches!(err, ConfigError::Plugins { .. }));
        assert!(err.to_string().contains("could not load plugins config"));
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let yaml = "plugins:\n  - library_path: /x.so\n    init_config: \"\"\n";
        assert!(matches!(
            load_plugins(&doc(yaml)),
            Err(ConfigError::Plugins { .. })
        ));
    }

    #[test]
    fn test_missing_init_config_is_fatal() {
        let yaml = "plugins:\n  - name: c\n    library_path: /x.so\n";
        let err = load_plugins(&doc(yaml)).unwrap_err();
        assert!(err.to_string().contains("init_config"));
    }

    #[test]
    fn test_malformed_declaration_fails_even_when_filtered_out() {
        let yaml = "load_plugins: [a]\nplugins:\n  - name: a\n    library_path: /a.so\n    init_config: \"\"\n  - oops\n";
        assert!(load_plugins(&doc(yaml)).is_err());
    }

    #[test]
    fn test_no_plugins_key() {
        assert!(load_plugins(&doc("")).unwrap().is_empty());
    }
}
