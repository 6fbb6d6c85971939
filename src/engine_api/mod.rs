//! Contract between the analyzer and plugin-supplied engines
//!
//! A plugin declares engine names and constructs engines on request. An
//! engine describes its rules and runs a subset of them against a workspace.
//! The analyzer trusts none of this blindly: names, rule lists and
//! violations are all validated on the way in.

mod events;
mod types;

pub use events::{EngineEvent, EngineEventEmitter, EngineEventListener, EngineEventType};
pub use types::{
    CodeLocation, DescribeOptions, EngineRunResults, PathPoint, RuleDescription, RuleType,
    RunOptions, SeverityLevel, Violation,
};

use async_trait::async_trait;
use std::sync::Arc;

/// Highest contract version this analyzer understands
pub const ENGINE_API_VERSION: u32 = 1;

/// Free-form engine configuration
pub type ConfigObject = serde_json::Map<String, serde_json::Value>;

/// An analysis engine wrapping one external tool
#[async_trait]
pub trait Engine: Send + Sync {
    /// Stable identifier; must equal the name the plugin declared
    fn name(&self) -> &str;

    /// List the rules this engine offers, optionally scoped to a workspace
    async fn describe_rules(&self, options: &DescribeOptions)
        -> anyhow::Result<Vec<RuleDescription>>;

    /// Run the named rules. Violations must reference only these rules.
    async fn run_rules(
        &self,
        rule_names: &[String],
        options: &RunOptions,
    ) -> anyhow::Result<EngineRunResults>;

    /// Register a listener for one kind of engine event
    fn on_event(&self, event_type: EngineEventType, listener: EngineEventListener);
}

/// Factory for one or more engines
#[async_trait]
pub trait EnginePlugin: Send + Sync {
    fn api_version(&self) -> u32 {
        ENGINE_API_VERSION
    }

    fn available_engine_names(&self) -> anyhow::Result<Vec<String>>;

    /// Human-readable description of the engine's configuration, if any
    fn describe_engine_config(&self, _engine_name: &str) -> Option<String> {
        None
    }

    /// Turn the raw user configuration into what `create_engine` expects
    async fn create_engine_config(
        &self,
        _engine_name: &str,
        raw_config: &ConfigObject,
    ) -> anyhow::Result<ConfigObject> {
        Ok(raw_config.clone())
    }

    async fn create_engine(
        &self,
        engine_name: &str,
        config: &ConfigObject,
    ) -> anyhow::Result<Arc<dyn Engine>>;
}
