//! YAML configuration files and their custom tags.
//!
//! Three tags are resolved right after parsing, before any section is
//! deserialized:
//!
//! - `!q [value, unit]` becomes the quantity mapping `{value, unit}`;
//! - `!env "{HOME}/runs"` substitutes environment variables;
//! - `!slice [start, stop, step]` becomes `{start, stop, step}`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::logging::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("bad `{tag}` value: {message}")]
    Tag { tag: String, message: String },
    #[error("environment variable `{0}` is not set")]
    Env(String),
    #[error("output file {0} exists and `overwrite` is false")]
    OutputExists(PathBuf),
    #[error("{0}")]
    Invalid(String),
}

/// Reads `path` and resolves every custom tag.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&text)
}

pub fn parse_yaml(text: &str) -> Result<Value, ConfigError> {
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_tags(serde_yaml::from_str(text)?, &env)
}

/// Deserializes one config shape from a resolved document.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ConfigError> {
    Ok(serde_yaml::from_value(value)?)
}

/// The `logging` section, or the defaults when it is absent.
pub fn logging_section(document: &Value) -> Result<LoggingConfig, ConfigError> {
    match document.get("logging") {
        Some(section) if !section.is_null() => Ok(serde_yaml::from_value(section.clone())?),
        _ => Ok(LoggingConfig::default()),
    }
}

/// Replaces tagged nodes anywhere in `value`.
pub fn resolve_tags(value: Value, env: &HashMap<String, String>) -> Result<Value, ConfigError> {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let inner = resolve_tags(tagged.value, env)?;
            match tag.trim_start_matches('!') {
                "q" => quantity(inner),
                "env" => substitute_env(inner, env),
                "slice" => slice(inner),
                _ => Err(tag_error(&tag, "unknown tag")),
            }
        }
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| resolve_tags(item, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, item)| Ok((key, resolve_tags(item, env)?)))
            .collect::<Result<Mapping, ConfigError>>()
            .map(Value::Mapping),
        other => Ok(other),
    }
}

fn tag_error(tag: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Tag {
        tag: tag.to_string(),
        message: message.into(),
    }
}

fn quantity(value: Value) -> Result<Value, ConfigError> {
    let Value::Sequence(items) = value else {
        return Err(tag_error("!q", "expected `[value, unit]`"));
    };
    let [number, unit] = <[Value; 2]>::try_from(items)
        .map_err(|items| tag_error("!q", format!("expected 2 items, got {}", items.len())))?;
    if !unit.is_string() {
        return Err(tag_error("!q", "unit must be a string"));
    }

    let mut mapping = Mapping::new();
    mapping.insert("value".into(), number);
    mapping.insert("unit".into(), unit);
    Ok(Value::Mapping(mapping))
}

fn substitute_env(value: Value, env: &HashMap<String, String>) -> Result<Value, ConfigError> {
    let Value::String(template) = value else {
        return Err(tag_error("!env", "only strings can hold environment variables"));
    };

    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let value = env.get(&name).ok_or_else(|| ConfigError::Env(name.clone()))?;
                output.push_str(value);
            }
            c => output.push(c),
        }
    }
    Ok(Value::String(output))
}

fn slice(value: Value) -> Result<Value, ConfigError> {
    let Value::Sequence(items) = value else {
        return Err(tag_error("!slice", "expected `[start, stop, step]`"));
    };
    if items.is_empty() || items.len() > 3 {
        return Err(tag_error("!slice", format!("expected 1 to 3 items, got {}", items.len())));
    }
    if let Some(bad) = items.iter().find(|item| !(item.is_null() || item.is_u64())) {
        return Err(tag_error("!slice", format!("`{bad:?}` is not an index")));
    }

    let mut items = items.into_iter();
    let mut mapping = Mapping::new();
    for key in ["start", "stop", "step"] {
        mapping.insert(key.into(), items.next().unwrap_or(Value::Null));
    }
    Ok(Value::Mapping(mapping))
}

/// Refuses to replace an existing `path` unless `overwrite` is set, in which
/// case the old file is removed.
pub fn prepare_output(path: &Path, overwrite: bool) -> Result<(), ConfigError> {
    if !path.is_file() {
        return Ok(());
    }
    if !overwrite {
        return Err(ConfigError::OutputExists(path.to_path_buf()));
    }
    fs::remove_file(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> HashMap<String, String> {
        HashMap::from([("RUNS".to_string(), "/data/runs".to_string())])
    }

    fn resolve(text: &str) -> Result<Value, ConfigError> {
        resolve_tags(serde_yaml::from_str(text).unwrap(), &env())
    }

    #[test]
    fn test_quantity_tag_becomes_mapping() {
        let value = resolve("eps: !q [0.2, kpc]\nposition: !q [[1, 2, 3], kpc]").unwrap();
        assert_eq!(value["eps"]["value"].as_f64(), Some(0.2));
        assert_eq!(value["eps"]["unit"], Value::from("kpc"));
        assert_eq!(value["position"]["value"][2].as_u64(), Some(3));

        let eps: units::Quantity = serde_yaml::from_value(value["eps"].clone()).unwrap();
        assert!((eps.value_in(&units::Unit::kpc()).unwrap() - 0.2).abs() < 1e-12);

        assert!(matches!(resolve("x: !q [1]"), Err(ConfigError::Tag { .. })));
        assert!(matches!(resolve("x: !q [1, 2]"), Err(ConfigError::Tag { .. })));
    }

    #[test]
    fn test_env_tag_substitutes_variables() {
        let value = resolve("out: !env \"{RUNS}/model-{{i}}.fits\"").unwrap();
        assert_eq!(value["out"], Value::from("/data/runs/model-{i}.fits"));

        assert!(matches!(resolve("out: !env \"{NOPE}\""), Err(ConfigError::Env(name)) if name == "NOPE"));
        assert!(matches!(resolve("out: !env 5"), Err(ConfigError::Tag { .. })));
    }

    #[test]
    fn test_slice_tag_fills_missing_bounds() {
        let value = resolve("a: !slice [10]\nb: !slice [1, 100, 2]").unwrap();
        assert_eq!(value["a"]["start"].as_u64(), Some(10));
        assert!(value["a"]["stop"].is_null());
        assert_eq!(value["b"]["step"].as_u64(), Some(2));

        assert!(resolve("a: !slice []").is_err());
        assert!(resolve("a: !slice [-1]").is_err());
    }

    #[test]
    fn test_tags_resolve_inside_nested_nodes() {
        let value = resolve("tasks:\n  - args: {eps: !q [200, pc]}").unwrap();
        assert_eq!(value["tasks"][0]["args"]["eps"]["unit"], Value::from("pc"));
        assert!(matches!(resolve("x: !what 1"), Err(ConfigError::Tag { .. })));
    }

    #[test]
    fn test_existing_output_needs_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fits");
        assert!(prepare_output(&path, false).is_ok());

        fs::write(&path, b"old").unwrap();
        assert!(matches!(prepare_output(&path, false), Err(ConfigError::OutputExists(_))));
        prepare_output(&path, true).unwrap();
        assert!(!path.exists());
    }
}
