//! Combines per-engine completion percentages into one number

use std::collections::HashMap;

/// Tracks the last reported percentage (0-100) for each engine.
///
/// The aggregate is a plain mean; engines are not weighted because their
/// relative cost is unknown up front.
#[derive(Debug, Clone, Default)]
pub struct EngineProgressAggregator {
    progress: HashMap<String, f64>,
}

impl EngineProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track exactly `engine_names`, each at 0%
    pub fn reset<S: AsRef<str>>(&mut self, engine_names: &[S]) {
        self.progress = engine_names
            .iter()
            .map(|name| (name.as_ref().to_string(), 0.0))
            .collect();
    }

    pub fn set_progress_for(&mut self, engine_name: &str, percent_complete: f64) {
        self.progress.insert(engine_name.to_string(), percent_complete);
    }

    /// Mean of all tracked percentages; 0 when nothing is tracked
    pub fn aggregated_progress_percentage(&self) -> f64 {
        if self.progress.is_empty() {
            return 0.0;
        }
        self.progress.values().sum::<f64>() / self.progress.len() as f64
    }
}
