//! Plugin loader.
//!
//! A plugin is a directory holding an entry point `main.<kind>`, where
//! `<kind>` names a registered [`ScriptVm`]. The directory name becomes
//! the plugin name. Loading never stops at the first bad plugin: every
//! failure is collected and the rest still load.

mod text;

pub use text::TextVm;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: no main.<kind> entry point")]
    NoEntryPoint(PathBuf),

    #[error("{path}: no script engine for kind {kind:?}")]
    UnknownVm { path: PathBuf, kind: String },

    #[error("plugin {0} is already loaded")]
    AlreadyLoaded(String),

    #[error("plugin {0} is not loaded")]
    NotLoaded(String),
}

/// Values a script can read when it runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptVars {
    pub nick: String,
    /// Empty for private invocations.
    pub channel: String,
}

/// A script engine.
pub trait ScriptVm: Send + Sync {
    /// File extension of the entry points this engine runs.
    fn kind(&self) -> &'static str;

    fn load_script(&self, name: &str, source: &str) -> Result<(), PluginError>;

    /// Run a loaded script; its output is the reply text.
    fn run(&self, name: &str, vars: &ScriptVars) -> Result<String, PluginError>;
}

/// Outcome of loading a set of plugin directories.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub errors: Vec<PluginError>,
}

/// Registered engines plus the plugins loaded into them.
pub struct PluginHost {
    vms: Vec<Arc<dyn ScriptVm>>,
    plugins: RwLock<BTreeMap<String, Arc<dyn ScriptVm>>>,
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new(vec![Arc::new(TextVm::new())])
    }
}

impl PluginHost {
    pub fn new(vms: Vec<Arc<dyn ScriptVm>>) -> Self {
        Self {
            vms,
            plugins: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load every sub-directory of every dir in `dirs`.
    pub fn load_plugins<P: AsRef<Path>>(&self, dirs: &[P]) -> LoadReport {
        let mut report = LoadReport::default();
        for dir in dirs {
            let dir = dir.as_ref();
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(source) => {
                    warn!(dir = %dir.display(), error = %source, "Plugin directory unreadable");
                    report.errors.push(PluginError::Io {
                        path: dir.to_path_buf(),
                        source,
                    });
                    continue;
                }
            };

            let mut candidates: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            candidates.sort();

            for path in candidates {
                match self.load_plugin(&path) {
                    Ok(name) => report.loaded.push(name),
                    Err(e) => {
                        warn!(error = %e, "Plugin not loaded");
                        report.errors.push(e);
                    }
                }
            }
        }
        info!(
            loaded = report.loaded.len(),
            failed = report.errors.len(),
            "Plugins loaded"
        );
        report
    }

    /// Load one plugin directory. Returns the plugin name.
    pub fn load_plugin(&self, path: &Path) -> Result<String, PluginError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PluginError::NoEntryPoint(path.to_path_buf()))?;
        if self.plugins.read().contains_key(&name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let (vm, entry) = self.entry_point(path)?;
        let source = std::fs::read_to_string(&entry).map_err(|source| PluginError::Io {
            path: entry.clone(),
            source,
        })?;
        vm.load_script(&name, &source)?;

        debug!(plugin = %name, kind = vm.kind(), "Plugin loaded");
        self.plugins.write().insert(name.clone(), vm);
        Ok(name)
    }

    /// Find `main.<kind>` for a registered engine. An entry point for an
    /// unregistered kind is reported as such rather than as missing.
    fn entry_point(&self, path: &Path) -> Result<(Arc<dyn ScriptVm>, PathBuf), PluginError> {
        for vm in &self.vms {
            let entry = path.join(format!("main.{}", vm.kind()));
            if entry.is_file() {
                return Ok((Arc::clone(vm), entry));
            }
        }

        let entries = std::fs::read_dir(path).map_err(|source| PluginError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        for entry in entries.filter_map(Result::ok) {
            let file = entry.path();
            if file.file_stem().is_some_and(|stem| stem == "main")
                && let Some(kind) = file.extension()
            {
                return Err(PluginError::UnknownVm {
                    path: path.to_path_buf(),
                    kind: kind.to_string_lossy().into_owned(),
                });
            }
        }
        Err(PluginError::NoEntryPoint(path.to_path_buf()))
    }

    /// Loaded plugin names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.plugins.read().keys().cloned().collect()
    }

    pub fn run(&self, name: &str, vars: &ScriptVars) -> Result<String, PluginError> {
        let vm = self
            .plugins
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        vm.run(name, vars)
    }
}
