//! Log message catalog

use std::fmt;

/// Messages the analyzer writes to its log stream
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage<'a> {
    EngineFromFutureApiDetected {
        plugin_version: u32,
        engine_names: &'a [String],
        supported_version: u32,
    },
    DuplicateEngine {
        engine: &'a str,
    },
    PluginErrorFromCreateEngineConfig {
        engine: &'a str,
        error: String,
    },
    PluginErrorFromCreateEngine {
        engine: &'a str,
        error: String,
    },
    EngineNameContradiction {
        requested: &'a str,
        actual: &'a str,
    },
    EngineAdded {
        engine: &'a str,
    },
    GatheringRulesFromEngine {
        engine: &'a str,
    },
    FinishedGatheringRulesFromEngine {
        count: usize,
        engine: &'a str,
    },
    RulePropertyOverridden {
        property: &'a str,
        rule: &'a str,
        engine: &'a str,
        old_value: String,
        new_value: String,
    },
    RunningWithRunOptions {
        options: String,
    },
    RunningEngineWithRules {
        engine: &'a str,
        rules: &'a [String],
    },
    FinishedRunningEngine {
        engine: &'a str,
    },
    EngineRunFailed {
        engine: &'a str,
        error: &'a str,
    },
}

impl fmt::Display for LogMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMessage::EngineFromFutureApiDetected {
                plugin_version,
                engine_names,
                supported_version,
            } => write!(
                f,
                "An engine plugin with api version {} providing engine(s) {} was detected. \
                 Only api version {} is supported, so the plugin is treated as version {}.",
                plugin_version,
                quoted_list(engine_names),
                supported_version,
                supported_version
            ),
            LogMessage::DuplicateEngine { engine } => write!(
                f,
                "Failed to add engine '{}' because an engine with that name was already added.",
                engine
            ),
            LogMessage::PluginErrorFromCreateEngineConfig { engine, error } => write!(
                f,
                "Failed to create the configuration for engine '{}': {}",
                engine, error
            ),
            LogMessage::PluginErrorFromCreateEngine { engine, error } => {
                write!(f, "Failed to create engine '{}': {}", engine, error)
            }
            LogMessage::EngineNameContradiction { requested, actual } => write!(
                f,
                "Engine '{}' was requested from its plugin but the created engine is named '{}'. \
                 The engine will not be added.",
                requested, actual
            ),
            LogMessage::EngineAdded { engine } => write!(f, "Engine '{}' was added.", engine),
            LogMessage::GatheringRulesFromEngine { engine } => {
                write!(f, "Gathering rules from engine '{}'.", engine)
            }
            LogMessage::FinishedGatheringRulesFromEngine { count, engine } => write!(
                f,
                "Finished gathering {} rule(s) from engine '{}'.",
                count, engine
            ),
            LogMessage::RulePropertyOverridden {
                property,
                rule,
                engine,
                old_value,
                new_value,
            } => write!(
                f,
                "The {} of rule '{}' of engine '{}' was overridden from {} to {}.",
                property, rule, engine, old_value, new_value
            ),
            LogMessage::RunningWithRunOptions { options } => {
                write!(f, "Running with run options: {}", options)
            }
            LogMessage::RunningEngineWithRules { engine, rules } => write!(
                f,
                "Running engine '{}' with rules: {}",
                engine,
                quoted_list(rules)
            ),
            LogMessage::FinishedRunningEngine { engine } => {
                write!(f, "Finished running engine '{}'.", engine)
            }
            LogMessage::EngineRunFailed { engine, error } => write!(
                f,
                "Engine '{}' failed unexpectedly while running rules: {}",
                engine, error
            ),
        }
    }
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("\"{}\"", s)).collect();
    format!("[{}]", quoted.join(","))
}
