//! Small shared helpers: clock, id generation, path normalization

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

/// Source of event timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant (useful in tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Generator of identifiers that are unique per analyzer instance
pub trait UniqueIdGenerator: Send + Sync {
    fn unique_id(&self, prefix: &str) -> String;
}

/// Yields `<prefix><n>` with an independent counter per prefix, starting at 0
#[derive(Debug, Default)]
pub struct SimpleUniqueIdGenerator {
    counters: Mutex<HashMap<String, u64>>,
}

impl UniqueIdGenerator for SimpleUniqueIdGenerator {
    fn unique_id(&self, prefix: &str) -> String {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        let id = format!("{}{}", prefix, counter);
        *counter += 1;
        id
    }
}

/// Make a path absolute against the current directory and drop `.`/`..` components.
///
/// Purely lexical: symlinks are not resolved and the path need not exist.
pub fn to_absolute_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
