//! Code Analyzer: multi-engine static analysis orchestrator
//!
//! Engines are supplied by plugins. The analyzer registers them, gathers
//! and filters their rules with selector strings, runs the selected rules
//! against a workspace and validates what comes back before handing it to
//! the caller. Progress, logs and per-engine results are published as
//! events while this happens.

pub mod analyzer;
pub mod config;
pub mod engine_api;
pub mod error;
pub mod events;
pub mod messages;
pub mod plugin_loader;
pub mod progress;
pub mod results;
pub mod rules;
pub mod utils;
pub mod workspace;

pub use analyzer::{CodeAnalyzer, RunOptions, SelectOptions};
pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use events::{Event, EventType, LogLevel, SubscriptionId};
pub use results::{CodeLocation, EngineRunResults, RunResults, Violation};
pub use rules::{Rule, RuleSelection, RuleType, SeverityLevel};
pub use workspace::Workspace;
