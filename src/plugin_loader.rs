//! Resolving engine plugins from a location string
//!
//! The analyzer only depends on [`PluginResolver`]. [`ModulePluginResolver`]
//! is the filesystem-backed adapter: plugin modules are registered in-process
//! under the file that stands for them, and a location resolves to a module
//! by (canonicalized) path. A module must export a zero-argument
//! `create_engine_plugin` factory.

use crate::engine_api::EnginePlugin;
use crate::error::{AnalyzerError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Name of the factory export every plugin module must provide
pub const PLUGIN_FACTORY_EXPORT: &str = "create_engine_plugin";

pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn EnginePlugin> + Send + Sync>;

/// Resolves a plugin from a location string
pub trait PluginResolver: Send + Sync {
    fn resolve(&self, location: &str, config_root: &Path) -> Result<Arc<dyn EnginePlugin>>;
}

/// A loadable unit: named factory exports
#[derive(Clone, Default)]
pub struct PluginModule {
    exports: HashMap<String, PluginFactory>,
}

impl PluginModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module exporting `create_engine_plugin`
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn EnginePlugin> + Send + Sync + 'static,
    {
        Self::new().export(PLUGIN_FACTORY_EXPORT, factory)
    }

    pub fn export<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn EnginePlugin> + Send + Sync + 'static,
    {
        self.exports.insert(name.to_string(), Arc::new(factory));
        self
    }

    fn factory(&self) -> Option<&PluginFactory> {
        self.exports.get(PLUGIN_FACTORY_EXPORT)
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.exports.keys().collect();
        names.sort();
        f.debug_struct("PluginModule").field("exports", &names).finish()
    }
}

/// Path-keyed table of plugin modules
#[derive(Debug, Default)]
pub struct ModulePluginResolver {
    modules: RwLock<HashMap<PathBuf, PluginModule>>,
}

impl ModulePluginResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under the file at `path`, which must exist
    pub fn register_module(&self, path: &Path, module: PluginModule) -> Result<()> {
        let key = canonical(path).map_err(|reason| AnalyzerError::FailedToDynamicallyLoadModule {
            module: path.display().to_string(),
            reason,
        })?;
        let mut modules = self.modules.write().unwrap_or_else(|e| e.into_inner());
        modules.insert(key, module);
        Ok(())
    }
}

impl PluginResolver for ModulePluginResolver {
    fn resolve(&self, location: &str, config_root: &Path) -> Result<Arc<dyn EnginePlugin>> {
        let requested = Path::new(location);
        let path = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            config_root.join(requested)
        };
        let module_name = path.display().to_string();

        let key = canonical(&path).map_err(|reason| AnalyzerError::FailedToDynamicallyLoadModule {
            module: module_name.clone(),
            reason,
        })?;

        let factory = {
            let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
            let module = modules.get(&key).ok_or_else(|| {
                AnalyzerError::FailedToDynamicallyLoadModule {
                    module: module_name.clone(),
                    reason: "the file is not a registered plugin module".to_string(),
                }
            })?;
            module
                .factory()
                .cloned()
                .ok_or(AnalyzerError::FailedToDynamicallyAddEnginePlugin {
                    module: module_name,
                })?
        };

        Ok(factory())
    }
}

fn canonical(path: &Path) -> std::result::Result<PathBuf, String> {
    path.canonicalize().map_err(|e| e.to_string())
}
