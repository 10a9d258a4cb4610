//! Name-to-constructor registries for tasks, models and integrators.
//!
//! Built-in plugins are registered explicitly at start-up. External plugins
//! are dynamic libraries exporting
//!
//! ```ignore
//! #[unsafe(no_mangle)]
//! pub fn omtool_register_plugins(registrar: &mut omtool::plugins::PluginRegistrar) {
//!     registrar.tasks.register("MyTask", my_task);
//! }
//! ```
//!
//! and are discovered by glob patterns from the config's `imports` section.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use analysis::TaskConstructor;
use libloading::{Library, Symbol};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;

use crate::integrators::{IntegratorConstructor, register_builtin_integrators};
use crate::models::{ModelConstructor, register_builtin_models};

/// Symbol every plugin library exports.
pub const REGISTER_SYMBOL: &[u8] = b"omtool_register_plugins";

type RegisterFn = fn(&mut PluginRegistrar);

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },
    #[error("cannot import {path}: {message}")]
    Import { path: PathBuf, message: String },
}

/// Constructors of one plugin kind.
#[derive(Debug, Clone)]
pub struct Registry<C> {
    kind: &'static str,
    entries: BTreeMap<String, C>,
}

impl<C: Copy> Registry<C> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Adds `constructor` under `name`; the first registration of a name wins.
    pub fn register(&mut self, name: &str, constructor: C) -> bool {
        if self.entries.contains_key(name) {
            warn!(target: "plugins", "{}", json!({"error": "name conflict", "kind": self.kind, "name": name}));
            return false;
        }
        debug!(target: "plugins", "{}", json!({"message": "registered", "kind": self.kind, "name": name}));
        self.entries.insert(name.to_string(), constructor);
        true
    }

    pub fn get(&self, name: &str) -> Option<C> {
        self.entries.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<C, PluginError> {
        self.get(name).ok_or_else(|| PluginError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_task_imports() -> Vec<String> {
    vec!["tools/tasks/*".to_string()]
}

fn default_model_imports() -> Vec<String> {
    vec!["tools/models/*".to_string()]
}

fn default_integrator_imports() -> Vec<String> {
    vec!["tools/integrators/*".to_string()]
}

/// Glob patterns of plugin libraries per kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Imports {
    #[serde(default = "default_task_imports")]
    pub tasks: Vec<String>,
    #[serde(default = "default_model_imports")]
    pub models: Vec<String>,
    #[serde(default = "default_integrator_imports")]
    pub integrators: Vec<String>,
}

impl Default for Imports {
    fn default() -> Self {
        Self {
            tasks: default_task_imports(),
            models: default_model_imports(),
            integrators: default_integrator_imports(),
        }
    }
}

impl Imports {
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .iter()
            .chain(&self.models)
            .chain(&self.integrators)
            .map(String::as_str)
    }
}

/// All registries plus the libraries their external entries live in.
pub struct PluginRegistrar {
    pub tasks: Registry<TaskConstructor>,
    pub models: Registry<ModelConstructor>,
    pub integrators: Registry<IntegratorConstructor>,
    // Declared last so registries drop before the code they point into.
    libraries: Vec<Library>,
}

impl Default for PluginRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistrar {
    /// Empty registries.
    pub fn new() -> Self {
        Self {
            tasks: Registry::new("task"),
            models: Registry::new("model"),
            integrators: Registry::new("integrator"),
            libraries: Vec::new(),
        }
    }

    /// Registries holding every built-in plugin.
    pub fn with_builtins() -> Self {
        let mut registrar = Self::new();
        for (name, constructor) in analysis::builtin_tasks() {
            registrar.tasks.register(name, constructor);
        }
        register_builtin_models(&mut registrar.models);
        register_builtin_integrators(&mut registrar.integrators);
        registrar
    }

    /// Loads every plugin library matched by `patterns`.
    ///
    /// Failures are logged and returned; loading continues with the next file.
    pub fn load<'a>(&mut self, patterns: impl IntoIterator<Item = &'a str>) -> Vec<PluginError> {
        let mut errors = Vec::new();
        for path in discover(patterns) {
            if !is_library(&path) {
                debug!(target: "plugins", "{}", json!({"message": "not a plugin library", "path": path.display().to_string()}));
                continue;
            }
            if let Err(error) = self.load_library(&path) {
                warn!(target: "plugins", "{}", json!({"error": error.to_string(), "path": path.display().to_string()}));
                errors.push(error);
            }
        }
        errors
    }

    fn load_library(&mut self, path: &Path) -> Result<(), PluginError> {
        let import_error = |e: libloading::Error| PluginError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        // SAFETY: plugin libraries are trusted code named by the user's config.
        let library = unsafe { Library::new(path) }.map_err(import_error)?;
        let register = {
            // SAFETY: the symbol is declared with the `RegisterFn` signature.
            let symbol: Symbol<RegisterFn> = unsafe { library.get(REGISTER_SYMBOL) }.map_err(import_error)?;
            *symbol
        };
        register(self);
        self.libraries.push(library);
        debug!(target: "plugins", "{}", json!({"message": "imported", "path": path.display().to_string()}));
        Ok(())
    }
}

/// Sorted, deduplicated files matched by `patterns`.
pub fn discover<'a>(patterns: impl IntoIterator<Item = &'a str>) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(target: "plugins", "{}", json!({"error": e.to_string(), "pattern": pattern}));
                continue;
            }
        };
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => warn!(target: "plugins", "{}", json!({"error": e.to_string(), "pattern": pattern})),
            }
        }
    }
    files
}

fn is_library(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn dummy(_: &serde_yaml::Value) -> Result<Box<dyn analysis::Task>, analysis::TaskError> {
        Err(analysis::TaskError::Config("dummy".to_string()))
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry: Registry<TaskConstructor> = Registry::new("task");
        assert!(registry.register("Dummy", dummy));
        assert!(!registry.register("Dummy", dummy));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("Dummy").is_some());
        assert!(matches!(
            registry.require("Other"),
            Err(PluginError::NotFound { kind: "task", name }) if name == "Other"
        ));
    }

    #[test]
    fn test_builtins_are_registered() {
        let registrar = PluginRegistrar::with_builtins();
        assert!(registrar.tasks.get("MassProfileTask").is_some());
        assert!(registrar.tasks.get("CenterTask").is_some());
        assert!(registrar.tasks.get("PotentialCenterTask").is_some());
        let models: Vec<&str> = registrar.models.names().collect();
        assert_eq!(models, ["body", "csv", "fits", "plummer_sphere", "set"]);
        assert!(registrar.integrators.get("leapfrog").is_some());
        assert!(registrar.integrators.get("dummy").is_some());
    }

    #[test]
    fn test_discovery_sorts_and_skips_non_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join(format!("b.{}", std::env::consts::DLL_EXTENSION));
        fs::write(dir.path().join("a.py"), b"").unwrap();
        fs::write(&library, b"not really a library").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let pattern = format!("{}/*", dir.path().display());
        let found = discover([pattern.as_str(), pattern.as_str()]);
        assert_eq!(found.len(), 2);

        let mut registrar = PluginRegistrar::new();
        let errors = registrar.load([pattern.as_str()]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], PluginError::Import { path, .. } if *path == library));
        assert!(registrar.tasks.is_empty());
    }
}
