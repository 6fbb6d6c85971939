//! Analyzer module - engine orchestration

mod code_analyzer;
mod start_points;
mod validation;

pub use code_analyzer::{CodeAnalyzer, RunOptions, SelectOptions};
