//! Typed publish/subscribe for log, progress and result notifications

use crate::results::EngineRunResults;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Log severity (1 = most severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    /// Finer than debug; mirrored to `log::Level::Trace`
    Fine = 5,
}

impl LogLevel {
    pub fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Fine => log::Level::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Fine => write!(f, "fine"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Log,
    EngineLog,
    RuleSelectionProgress,
    EngineRunProgress,
    EngineResults,
}

/// A log line from the analyzer itself
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub log_level: LogLevel,
    pub message: String,
}

/// A log line forwarded from an engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLogEvent {
    pub timestamp: DateTime<Utc>,
    pub engine_name: String,
    pub log_level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSelectionProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineRunProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub engine_name: String,
    pub percent_complete: f64,
}

#[derive(Debug, Clone)]
pub struct EngineResultsEvent {
    pub timestamp: DateTime<Utc>,
    pub results: Arc<EngineRunResults>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Log(LogEvent),
    EngineLog(EngineLogEvent),
    RuleSelectionProgress(RuleSelectionProgressEvent),
    EngineRunProgress(EngineRunProgressEvent),
    EngineResults(EngineResultsEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Log(_) => EventType::Log,
            Event::EngineLog(_) => EventType::EngineLog,
            Event::RuleSelectionProgress(_) => EventType::RuleSelectionProgress,
            Event::EngineRunProgress(_) => EventType::EngineRunProgress,
            Event::EngineResults(_) => EventType::EngineResults,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Log(e) => e.timestamp,
            Event::EngineLog(e) => e.timestamp,
            Event::RuleSelectionProgress(e) => e.timestamp,
            Event::EngineRunProgress(e) => e.timestamp,
            Event::EngineResults(e) => e.timestamp,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by `EventBus::subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    event_type: EventType,
    handler: EventHandler,
}

/// In-process, synchronous event bus.
///
/// Handlers run on the emitting task in subscription order. The
/// subscriber list is snapshotted before delivery, so handlers may
/// subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event_type: EventType, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subs = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        subs.push(Subscription {
            id,
            event_type,
            handler,
        });
        id
    }

    /// Returns false if the id was not (or no longer) subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn emit(&self, event: &Event) {
        let event_type = event.event_type();
        let handlers: Vec<EventHandler> = {
            let subs = self.subscriptions.read().unwrap_or_else(|e| e.into_inner());
            subs.iter()
                .filter(|s| s.event_type == event_type)
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .read()
            .map(|s| s.len())
            .unwrap_or_default()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn log_event(message: &str) -> Event {
        Event::Log(LogEvent {
            timestamp: Utc::now(),
            log_level: LogLevel::Info,
            message: message.to_string(),
        })
    }

    #[test]
    fn test_handlers_receive_only_their_event_type() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        bus.subscribe(
            EventType::Log,
            Arc::new(move |e: &Event| {
                if let Event::Log(l) = e {
                    s.lock().unwrap().push(l.message.clone());
                }
            }),
        );

        bus.emit(&log_event("one"));
        bus.emit(&Event::RuleSelectionProgress(RuleSelectionProgressEvent {
            timestamp: Utc::now(),
            percent_complete: 50.0,
        }));
        bus.emit(&log_event("two"));

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        let id = bus.subscribe(EventType::Log, Arc::new(move |_: &Event| *c.lock().unwrap() += 1));

        bus.emit(&log_event("a"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&log_event("b"));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_subscribe_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let inner_bus = Arc::clone(&bus);
        bus.subscribe(
            EventType::Log,
            Arc::new(move |_: &Event| {
                inner_bus.subscribe(EventType::EngineLog, Arc::new(|_: &Event| {}));
            }),
        );
        bus.emit(&log_event("x"));
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_log_level_ordering_and_mapping() {
        assert!(LogLevel::Error < LogLevel::Fine);
        assert_eq!(LogLevel::Fine.to_log_level(), log::Level::Trace);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
