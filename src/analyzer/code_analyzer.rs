//! The analyzer: engine registration, rule selection and runs

use super::start_points::{
    parse_path_start_point, validate_path_start_points_are_inside_workspace,
};
use super::validation::{validate_engine_run_results, validate_rule_descriptions};
use crate::config::Config;
use crate::engine_api::{
    self, DescribeOptions, Engine, EngineEvent, EngineEventType, EnginePlugin, RuleDescription,
    ENGINE_API_VERSION,
};
use crate::error::{AnalyzerError, Result};
use crate::events::{
    EngineLogEvent, EngineResultsEvent, EngineRunProgressEvent, Event, EventBus, EventType,
    LogEvent, LogLevel, RuleSelectionProgressEvent, SubscriptionId,
};
use crate::messages::LogMessage;
use crate::plugin_loader::{ModulePluginResolver, PluginResolver};
use crate::progress::EngineProgressAggregator;
use crate::results::{EngineRunResults, RunResults};
use crate::rules::{Rule, RuleSelection};
use crate::utils::{Clock, RealClock, SimpleUniqueIdGenerator, UniqueIdGenerator};
use crate::workspace::Workspace;
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Options for [`CodeAnalyzer::select_rules`]
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Engines may offer different rules depending on what the workspace holds
    pub workspace: Option<Workspace>,
}

/// Options for [`CodeAnalyzer::run`]
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub workspace: Workspace,
    /// `<file>` or `<file>#<method1>;<method2>;...`
    pub path_start_points: Vec<String>,
}

impl RunOptions {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            path_start_points: Vec::new(),
        }
    }

    pub fn with_path_start_points<I, S>(mut self, start_points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_start_points = start_points.into_iter().map(Into::into).collect();
        self
    }
}

struct RegisteredEngine {
    engine: Arc<dyn Engine>,
    plugin: Arc<dyn EnginePlugin>,
}

/// State shared with engine event listeners
struct AnalyzerState {
    config: Config,
    clock: RwLock<Arc<dyn Clock>>,
    events: EventBus,
    engines: RwLock<BTreeMap<String, RegisteredEngine>>,
    rules_cache: Mutex<HashMap<String, Arc<Vec<Arc<Rule>>>>>,
    discovery_progress: Mutex<EngineProgressAggregator>,
}

impl AnalyzerState {
    fn now(&self) -> DateTime<Utc> {
        self.clock.read().unwrap_or_else(|e| e.into_inner()).now()
    }

    fn engine(&self, engine_name: &str) -> Option<Arc<dyn Engine>> {
        let engines = self.engines.read().unwrap_or_else(|e| e.into_inner());
        engines.get(engine_name).map(|r| Arc::clone(&r.engine))
    }

    fn has_engine(&self, engine_name: &str) -> bool {
        let engines = self.engines.read().unwrap_or_else(|e| e.into_inner());
        engines.contains_key(engine_name)
    }

    fn discovery_progress(&self) -> MutexGuard<'_, EngineProgressAggregator> {
        self.discovery_progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn emit_log(&self, log_level: LogLevel, message: impl fmt::Display) {
        let message = message.to_string();
        log::log!(target: "code_analyzer", log_level.to_log_level(), "{}", message);
        self.events.emit(&Event::Log(LogEvent {
            timestamp: self.now(),
            log_level,
            message,
        }));
    }

    fn emit_engine_log(&self, engine_name: &str, log_level: LogLevel, message: &str) {
        log::log!(target: "code_analyzer", log_level.to_log_level(), "[{}] {}", engine_name, message);
        self.events.emit(&Event::EngineLog(EngineLogEvent {
            timestamp: self.now(),
            engine_name: engine_name.to_string(),
            log_level,
            message: message.to_string(),
        }));
    }

    fn emit_rule_selection_progress(&self, percent_complete: f64) {
        self.events
            .emit(&Event::RuleSelectionProgress(RuleSelectionProgressEvent {
                timestamp: self.now(),
                percent_complete,
            }));
    }

    fn emit_engine_run_progress(&self, engine_name: &str, percent_complete: f64) {
        self.events.emit(&Event::EngineRunProgress(EngineRunProgressEvent {
            timestamp: self.now(),
            engine_name: engine_name.to_string(),
            percent_complete,
        }));
    }

    fn update_rule_discovery_progress(&self, engine_name: &str, percent_complete: f64) {
        let aggregated = {
            let mut progress = self.discovery_progress();
            progress.set_progress_for(engine_name, percent_complete);
            progress.aggregated_progress_percentage()
        };
        self.emit_rule_selection_progress(aggregated);
    }
}

/// Orchestrates engines supplied by plugins.
///
/// Engines are registered once and kept for the lifetime of the analyzer.
/// Discovered rules are cached per workspace id (or per current directory
/// when no workspace is given).
pub struct CodeAnalyzer {
    state: Arc<AnalyzerState>,
    id_generator: Box<dyn UniqueIdGenerator>,
    plugin_resolver: Arc<dyn PluginResolver>,
}

impl CodeAnalyzer {
    pub fn new(config: Config) -> Self {
        Self {
            state: Arc::new(AnalyzerState {
                config,
                clock: RwLock::new(Arc::new(RealClock)),
                events: EventBus::new(),
                engines: RwLock::new(BTreeMap::new()),
                rules_cache: Mutex::new(HashMap::new()),
                discovery_progress: Mutex::new(EngineProgressAggregator::new()),
            }),
            id_generator: Box::new(SimpleUniqueIdGenerator::default()),
            plugin_resolver: Arc::new(ModulePluginResolver::new()),
        }
    }

    /// Use `clock` for event timestamps
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        *self.state.clock.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(clock);
        self
    }

    pub fn with_unique_id_generator(mut self, generator: impl UniqueIdGenerator + 'static) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    /// Use `resolver` for [`CodeAnalyzer::dynamically_add_engine_plugin`]
    pub fn with_plugin_resolver(mut self, resolver: Arc<dyn PluginResolver>) -> Self {
        self.plugin_resolver = resolver;
        self
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Create a workspace with a fresh id. Every path must exist.
    pub fn create_workspace<P: AsRef<Path>>(&self, files_and_folders: &[P]) -> Result<Workspace> {
        Workspace::new(self.id_generator.unique_id("workspace"), files_and_folders)
    }

    /// Register every engine `plugin` declares.
    ///
    /// Only a failure to list the engine names is an error. Engines that
    /// cannot be created, are already registered, or report a different
    /// name are skipped with an error log.
    pub async fn add_engine_plugin(&self, plugin: Arc<dyn EnginePlugin>) -> Result<()> {
        let engine_names = plugin
            .available_engine_names()
            .map_err(|source| AnalyzerError::PluginErrorFromGetAvailableEngineNames { source })?;

        let api_version = plugin.api_version();
        if api_version > ENGINE_API_VERSION {
            self.state.emit_log(
                LogLevel::Warn,
                LogMessage::EngineFromFutureApiDetected {
                    plugin_version: api_version,
                    engine_names: &engine_names,
                    supported_version: ENGINE_API_VERSION,
                },
            );
        }

        join_all(
            engine_names
                .iter()
                .map(|name| self.create_and_add_engine_if_valid(name, &plugin)),
        )
        .await;
        Ok(())
    }

    /// Resolve a plugin from `location` (relative paths resolve against the
    /// config root) and register its engines
    pub async fn dynamically_add_engine_plugin(&self, location: &str) -> Result<()> {
        let plugin = self
            .plugin_resolver
            .resolve(location, &self.state.config.config_root())?;
        self.add_engine_plugin(plugin).await
    }

    /// Registered engine names, sorted
    pub fn engine_names(&self) -> Vec<String> {
        let engines = self.state.engines.read().unwrap_or_else(|e| e.into_inner());
        engines.keys().cloned().collect()
    }

    /// The owning plugin's description of an engine's configuration
    pub fn describe_engine_config(&self, engine_name: &str) -> Option<String> {
        let plugin = {
            let engines = self.state.engines.read().unwrap_or_else(|e| e.into_inner());
            Arc::clone(&engines.get(engine_name)?.plugin)
        };
        plugin.describe_engine_config(engine_name)
    }

    /// Select every rule, from every engine, matching at least one selector.
    /// No selectors means `["Recommended"]`.
    pub async fn select_rules<S: AsRef<str>>(
        &self,
        selectors: &[S],
        options: &SelectOptions,
    ) -> Result<RuleSelection> {
        self.state.emit_rule_selection_progress(0.0);

        let all_rules = self.all_rules(options.workspace.as_ref()).await?;
        let selection = RuleSelection::from_selectors(&all_rules, selectors);

        self.state.emit_rule_selection_progress(100.0);
        Ok(selection)
    }

    /// Run the selected rules. Engines run concurrently.
    ///
    /// An engine that fails while running yields an unexpected-error result
    /// for that engine only. Invalid options or invalid engine output fail
    /// the whole call.
    pub async fn run(&self, selection: &RuleSelection, options: &RunOptions) -> Result<RunResults> {
        let engine_options = extract_engine_run_options(options)?;
        self.state.emit_log(
            LogLevel::Debug,
            LogMessage::RunningWithRunOptions {
                options: serde_json::to_string(&engine_options).unwrap_or_default(),
            },
        );

        let engine_names = selection.engine_names();
        let per_engine = try_join_all(
            engine_names
                .iter()
                .map(|name| self.run_engine_and_validate_results(name, selection, &engine_options)),
        )
        .await?;

        let mut run_results = RunResults::new();
        for engine_results in per_engine {
            run_results.add_engine_run_results(engine_results);
        }
        Ok(run_results)
    }

    pub fn on_event<F>(&self, event_type: EventType, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.state.events.subscribe(event_type, Arc::new(handler))
    }

    /// Returns false if `id` was not subscribed
    pub fn off_event(&self, id: SubscriptionId) -> bool {
        self.state.events.unsubscribe(id)
    }

    async fn create_and_add_engine_if_valid(&self, engine_name: &str, plugin: &Arc<dyn EnginePlugin>) {
        let state = &self.state;
        if state.has_engine(engine_name) {
            state.emit_log(LogLevel::Error, LogMessage::DuplicateEngine { engine: engine_name });
            return;
        }

        let raw_config = state.config.engine_config_for(engine_name);
        let engine_config = match plugin.create_engine_config(engine_name, &raw_config).await {
            Ok(config) => config,
            Err(e) => {
                state.emit_log(
                    LogLevel::Error,
                    LogMessage::PluginErrorFromCreateEngineConfig {
                        engine: engine_name,
                        error: format!("{:#}", e),
                    },
                );
                return;
            }
        };

        let engine = match plugin.create_engine(engine_name, &engine_config).await {
            Ok(engine) => engine,
            Err(e) => {
                state.emit_log(
                    LogLevel::Error,
                    LogMessage::PluginErrorFromCreateEngine {
                        engine: engine_name,
                        error: format!("{:#}", e),
                    },
                );
                return;
            }
        };

        if engine.name() != engine_name {
            state.emit_log(
                LogLevel::Error,
                LogMessage::EngineNameContradiction {
                    requested: engine_name,
                    actual: engine.name(),
                },
            );
            return;
        }

        // Another plugin may have registered the name while we were awaiting
        let inserted = {
            let mut engines = state.engines.write().unwrap_or_else(|e| e.into_inner());
            if engines.contains_key(engine_name) {
                false
            } else {
                engines.insert(
                    engine_name.to_string(),
                    RegisteredEngine {
                        engine: Arc::clone(&engine),
                        plugin: Arc::clone(plugin),
                    },
                );
                true
            }
        };
        if !inserted {
            state.emit_log(LogLevel::Error, LogMessage::DuplicateEngine { engine: engine_name });
            return;
        }

        state.emit_log(LogLevel::Debug, LogMessage::EngineAdded { engine: engine_name });
        self.listen_to_engine_events(&*engine);
    }

    fn listen_to_engine_events(&self, engine: &dyn Engine) {
        let engine_name = engine.name().to_string();

        let (state, name) = (Arc::downgrade(&self.state), engine_name.clone());
        engine.on_event(
            EngineEventType::Log,
            Arc::new(move |event: &EngineEvent| {
                if let (Some(state), EngineEvent::Log { level, message }) = (state.upgrade(), event) {
                    state.emit_engine_log(&name, *level, message);
                }
            }),
        );

        let (state, name) = (Arc::downgrade(&self.state), engine_name.clone());
        engine.on_event(
            EngineEventType::DescribeRulesProgress,
            Arc::new(move |event: &EngineEvent| {
                if let (Some(state), EngineEvent::DescribeRulesProgress { percent_complete }) =
                    (state.upgrade(), event)
                {
                    state.update_rule_discovery_progress(&name, *percent_complete);
                }
            }),
        );

        let (state, name) = (Arc::downgrade(&self.state), engine_name);
        engine.on_event(
            EngineEventType::RunRulesProgress,
            Arc::new(move |event: &EngineEvent| {
                if let (Some(state), EngineEvent::RunRulesProgress { percent_complete }) =
                    (state.upgrade(), event)
                {
                    state.emit_engine_run_progress(&name, *percent_complete);
                }
            }),
        );
    }

    async fn all_rules(&self, workspace: Option<&Workspace>) -> Result<Arc<Vec<Arc<Rule>>>> {
        let cache_key = match workspace {
            Some(ws) => ws.id().to_string(),
            None => std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        };

        let cached = {
            let cache = self.state.rules_cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.get(&cache_key).cloned()
        };
        if let Some(rules) = cached {
            return Ok(rules);
        }

        let engine_names = self.engine_names();
        self.state.discovery_progress().reset(&engine_names);

        let describe_options = DescribeOptions {
            workspace: workspace.cloned(),
        };
        let per_engine = try_join_all(
            engine_names
                .iter()
                .map(|name| self.all_rules_for(name, &describe_options)),
        )
        .await?;

        let rules: Arc<Vec<Arc<Rule>>> = Arc::new(per_engine.into_iter().flatten().collect());
        let mut cache = self.state.rules_cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(cache_key, Arc::clone(&rules));
        Ok(rules)
    }

    async fn all_rules_for(&self, engine_name: &str, options: &DescribeOptions) -> Result<Vec<Arc<Rule>>> {
        let state = &self.state;
        let Some(engine) = state.engine(engine_name) else {
            return Ok(Vec::new());
        };

        state.emit_log(LogLevel::Debug, LogMessage::GatheringRulesFromEngine { engine: engine_name });
        let descriptions = engine.describe_rules(options).await.map_err(|source| {
            AnalyzerError::EngineFailedToDescribeRules {
                engine: engine_name.to_string(),
                source,
            }
        })?;
        state.emit_log(
            LogLevel::Debug,
            LogMessage::FinishedGatheringRulesFromEngine {
                count: descriptions.len(),
                engine: engine_name,
            },
        );

        validate_rule_descriptions(engine_name, &descriptions)?;
        let rules = descriptions
            .into_iter()
            .map(|d| Arc::new(Rule::new(engine_name, self.apply_rule_overrides(engine_name, d))))
            .collect();

        state.update_rule_discovery_progress(engine_name, 100.0);
        Ok(rules)
    }

    fn apply_rule_overrides(&self, engine_name: &str, mut description: RuleDescription) -> RuleDescription {
        let rule_override = self
            .state
            .config
            .rule_override_for(engine_name, &description.name);

        if let Some(severity) = rule_override.severity {
            self.state.emit_log(
                LogLevel::Debug,
                LogMessage::RulePropertyOverridden {
                    property: "severity",
                    rule: &description.name,
                    engine: engine_name,
                    old_value: description.severity_level.to_string(),
                    new_value: severity.to_string(),
                },
            );
            description.severity_level = severity;
        }

        if let Some(tags) = rule_override.tags {
            self.state.emit_log(
                LogLevel::Debug,
                LogMessage::RulePropertyOverridden {
                    property: "tags",
                    rule: &description.name,
                    engine: engine_name,
                    old_value: serde_json::to_string(&description.tags).unwrap_or_default(),
                    new_value: serde_json::to_string(&tags).unwrap_or_default(),
                },
            );
            description.tags = tags;
        }

        description
    }

    async fn run_engine_and_validate_results(
        &self,
        engine_name: &str,
        selection: &RuleSelection,
        options: &engine_api::RunOptions,
    ) -> Result<Arc<EngineRunResults>> {
        let state = &self.state;
        state.emit_engine_run_progress(engine_name, 0.0);

        let rule_names: Vec<String> = selection
            .rules_for(engine_name)
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        state.emit_log(
            LogLevel::Debug,
            LogMessage::RunningEngineWithRules {
                engine: engine_name,
                rules: &rule_names,
            },
        );

        let outcome = match state.engine(engine_name) {
            Some(engine) => engine.run_rules(&rule_names, options).await,
            None => Err(anyhow::anyhow!("No engine named '{}' has been added.", engine_name)),
        };
        let api_results = match outcome {
            Ok(results) => results,
            Err(error) => {
                let results = EngineRunResults::unexpected_error(engine_name, error);
                state.emit_log(
                    LogLevel::Error,
                    LogMessage::EngineRunFailed {
                        engine: engine_name,
                        error: results.error_message().unwrap_or_default(),
                    },
                );
                return Ok(Arc::new(results));
            }
        };

        validate_engine_run_results(engine_name, &api_results, selection)?;
        let results = Arc::new(EngineRunResults::completed(engine_name, &api_results, selection));

        state.emit_engine_run_progress(engine_name, 100.0);
        state.emit_log(LogLevel::Debug, LogMessage::FinishedRunningEngine { engine: engine_name });
        state.events.emit(&Event::EngineResults(EngineResultsEvent {
            timestamp: state.now(),
            results: Arc::clone(&results),
        }));
        Ok(results)
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new(Config::with_defaults())
    }
}

impl fmt::Debug for CodeAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeAnalyzer")
            .field("engines", &self.engine_names())
            .field("events", &self.state.events)
            .finish()
    }
}

/// Check the caller's run options and resolve start points for engines
fn extract_engine_run_options(options: &RunOptions) -> Result<engine_api::RunOptions> {
    if options.workspace.is_empty() {
        return Err(AnalyzerError::AtLeastOneFileOrFolderMustBeIncluded);
    }

    let path_start_points = if options.path_start_points.is_empty() {
        None
    } else {
        let mut points = Vec::new();
        for start_point in &options.path_start_points {
            points.extend(parse_path_start_point(start_point)?);
        }
        validate_path_start_points_are_inside_workspace(&points, &options.workspace)?;
        Some(points)
    };

    Ok(engine_api::RunOptions {
        workspace: options.workspace.clone(),
        path_start_points,
    })
}
