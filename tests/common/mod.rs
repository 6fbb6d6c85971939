//! Stub plugins and engines shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use code_analyzer::engine_api::{
    self, CodeLocation, ConfigObject, DescribeOptions, Engine, EngineEventEmitter,
    EngineEventListener, EngineEventType, EnginePlugin, EngineRunResults, RuleDescription,
    RuleType, SeverityLevel, Violation,
};
use code_analyzer::{CodeAnalyzer, Event, EventType, LogLevel};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn rule(name: &str, severity: SeverityLevel, tags: &[&str]) -> RuleDescription {
    RuleDescription {
        name: name.to_string(),
        severity_level: severity,
        rule_type: RuleType::Standard,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: format!("Some description for {}", name),
        resource_urls: vec![format!("https://example.com/{}", name)],
    }
}

pub fn violation(rule_name: &str, file: &Path, start_line: usize) -> Violation {
    Violation {
        rule_name: rule_name.to_string(),
        message: format!("{} was violated", rule_name),
        code_locations: vec![CodeLocation {
            file: file.to_path_buf(),
            start_line,
            start_column: 1,
            end_line: None,
            end_column: None,
        }],
        primary_location_index: 0,
        resource_urls: vec![],
    }
}

/// Engine with a fixed rule list that records how it is called
pub struct StubEngine {
    name: String,
    rules: Vec<RuleDescription>,
    violations: Vec<Violation>,
    describe_error: Option<String>,
    run_error: Option<String>,
    describe_progress: Vec<f64>,
    emitter: EngineEventEmitter,
    describe_calls: AtomicUsize,
    run_calls: Mutex<Vec<(Vec<String>, engine_api::RunOptions)>>,
}

impl StubEngine {
    pub fn new(name: &str, rules: Vec<RuleDescription>) -> Self {
        Self {
            name: name.to_string(),
            rules,
            violations: Vec::new(),
            describe_error: None,
            run_error: None,
            describe_progress: Vec::new(),
            emitter: EngineEventEmitter::new(),
            describe_calls: AtomicUsize::new(0),
            run_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn failing_describe(mut self, message: &str) -> Self {
        self.describe_error = Some(message.to_string());
        self
    }

    pub fn failing_run(mut self, message: &str) -> Self {
        self.run_error = Some(message.to_string());
        self
    }

    /// Report these discovery percentages while describing rules
    pub fn with_describe_progress(mut self, percentages: &[f64]) -> Self {
        self.describe_progress = percentages.to_vec();
        self
    }

    pub fn describe_call_count(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn run_call_count(&self) -> usize {
        self.run_calls.lock().unwrap().len()
    }

    pub fn last_run(&self) -> Option<(Vec<String>, engine_api::RunOptions)> {
        self.run_calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Engine for StubEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn describe_rules(&self, _options: &DescribeOptions) -> anyhow::Result<Vec<RuleDescription>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.emitter
            .emit_log(LogLevel::Fine, format!("{} describing rules", self.name));
        for percent in &self.describe_progress {
            self.emitter.emit_describe_rules_progress(*percent);
        }
        if let Some(message) = &self.describe_error {
            anyhow::bail!("{}", message);
        }
        Ok(self.rules.clone())
    }

    async fn run_rules(
        &self,
        rule_names: &[String],
        options: &engine_api::RunOptions,
    ) -> anyhow::Result<EngineRunResults> {
        self.run_calls
            .lock()
            .unwrap()
            .push((rule_names.to_vec(), options.clone()));
        self.emitter.emit_run_rules_progress(50.0);
        if let Some(message) = &self.run_error {
            anyhow::bail!("{}", message);
        }
        Ok(EngineRunResults {
            violations: self.violations.clone(),
        })
    }

    fn on_event(&self, event_type: EngineEventType, listener: EngineEventListener) {
        self.emitter.on(event_type, listener);
    }
}

/// Plugin handing out pre-built stub engines
pub struct StubPlugin {
    api_version: u32,
    declared: Vec<(String, Arc<StubEngine>)>,
    create_errors: HashMap<String, String>,
    received_configs: Mutex<HashMap<String, ConfigObject>>,
}

impl StubPlugin {
    pub fn new(engines: Vec<Arc<StubEngine>>) -> Self {
        Self {
            api_version: engine_api::ENGINE_API_VERSION,
            declared: engines
                .into_iter()
                .map(|e| (e.name().to_string(), e))
                .collect(),
            create_errors: HashMap::new(),
            received_configs: Mutex::new(HashMap::new()),
        }
    }

    /// Declare `name` but hand out `engine` (which may be named differently)
    pub fn declaring(mut self, name: &str, engine: Arc<StubEngine>) -> Self {
        self.declared.push((name.to_string(), engine));
        self
    }

    pub fn failing_create(mut self, name: &str, message: &str) -> Self {
        self.create_errors
            .insert(name.to_string(), message.to_string());
        self
    }

    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn received_config(&self, engine_name: &str) -> Option<ConfigObject> {
        self.received_configs
            .lock()
            .unwrap()
            .get(engine_name)
            .cloned()
    }
}

#[async_trait]
impl EnginePlugin for StubPlugin {
    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn available_engine_names(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.declared.iter().map(|(name, _)| name.clone()).collect())
    }

    fn describe_engine_config(&self, engine_name: &str) -> Option<String> {
        Some(format!("Configuration for {}", engine_name))
    }

    async fn create_engine(&self, engine_name: &str, config: &ConfigObject) -> anyhow::Result<Arc<dyn Engine>> {
        self.received_configs
            .lock()
            .unwrap()
            .insert(engine_name.to_string(), config.clone());
        if let Some(message) = self.create_errors.get(engine_name) {
            anyhow::bail!("{}", message);
        }
        let (_, engine) = self
            .declared
            .iter()
            .find(|(name, _)| name == engine_name)
            .ok_or_else(|| anyhow::anyhow!("unsupported engine name: {}", engine_name))?;
        Ok(Arc::clone(engine) as Arc<dyn Engine>)
    }
}

/// Plugin whose engine list itself cannot be produced
pub struct BrokenPlugin;

#[async_trait]
impl EnginePlugin for BrokenPlugin {
    fn available_engine_names(&self) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("cannot list engines")
    }

    async fn create_engine(&self, _engine_name: &str, _config: &ConfigObject) -> anyhow::Result<Arc<dyn Engine>> {
        anyhow::bail!("unreachable")
    }
}

/// Collects every event of one type the analyzer emits
pub fn capture(analyzer: &CodeAnalyzer, event_type: EventType) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    analyzer.on_event(event_type, move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

/// (level, message) of captured analyzer log events
pub fn log_lines(events: &Arc<Mutex<Vec<Event>>>) -> Vec<(LogLevel, String)> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            Event::Log(log) => Some((log.log_level, log.message.clone())),
            _ => None,
        })
        .collect()
}

pub fn error_logs(events: &Arc<Mutex<Vec<Event>>>) -> Vec<String> {
    log_lines(events)
        .into_iter()
        .filter(|(level, _)| *level == LogLevel::Error)
        .map(|(_, message)| message)
        .collect()
}

/// The two-engine setup most tests start from
pub fn eslint_and_pmd() -> (Arc<StubEngine>, Arc<StubEngine>) {
    let eslint = Arc::new(StubEngine::new(
        "eslint",
        vec![
            rule("no-eval", SeverityLevel::High, &["Recommended", "Security"]),
            rule("semi", SeverityLevel::Info, &["CodeStyle"]),
        ],
    ));
    let pmd = Arc::new(StubEngine::new(
        "pmd",
        vec![
            rule("ApexCRUDViolation", SeverityLevel::Critical, &["Recommended", "Security"]),
            rule("ApexDoc", SeverityLevel::Low, &["Documentation"]),
        ],
    ));
    (eslint, pmd)
}
