//! Events that engines publish to the analyzer

use crate::events::LogLevel;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEventType {
    Log,
    DescribeRulesProgress,
    RunRulesProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Log { level: LogLevel, message: String },
    /// Percent (0-100) of rule discovery completed
    DescribeRulesProgress { percent_complete: f64 },
    /// Percent (0-100) of rule execution completed
    RunRulesProgress { percent_complete: f64 },
}

impl EngineEvent {
    pub fn event_type(&self) -> EngineEventType {
        match self {
            EngineEvent::Log { .. } => EngineEventType::Log,
            EngineEvent::DescribeRulesProgress { .. } => EngineEventType::DescribeRulesProgress,
            EngineEvent::RunRulesProgress { .. } => EngineEventType::RunRulesProgress,
        }
    }
}

pub type EngineEventListener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Listener storage an engine can embed to implement `Engine::on_event`
#[derive(Default)]
pub struct EngineEventEmitter {
    listeners: Mutex<Vec<(EngineEventType, EngineEventListener)>>,
}

impl EngineEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event_type: EngineEventType, listener: EngineEventListener) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push((event_type, listener));
    }

    /// Deliver `event` to every listener registered for its type
    pub fn emit(&self, event: EngineEvent) {
        let event_type = event.event_type();
        let matching: Vec<EngineEventListener> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners
                .iter()
                .filter(|(t, _)| *t == event_type)
                .map(|(_, l)| Arc::clone(l))
                .collect()
        };
        for listener in matching {
            listener(&event);
        }
    }

    pub fn emit_log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(EngineEvent::Log {
            level,
            message: message.into(),
        });
    }

    pub fn emit_describe_rules_progress(&self, percent_complete: f64) {
        self.emit(EngineEvent::DescribeRulesProgress { percent_complete });
    }

    pub fn emit_run_rules_progress(&self, percent_complete: f64) {
        self.emit(EngineEvent::RunRulesProgress { percent_complete });
    }
}

impl std::fmt::Debug for EngineEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .listeners
            .lock()
            .map(|l| l.len())
            .unwrap_or_default();
        f.debug_struct("EngineEventEmitter")
            .field("listeners", &count)
            .finish()
    }
}
