//! Capture of `tracing` events so tests can assert on log output.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{
    Event,
    Level,
    Metadata,
    Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};

/// One event seen by the capture subscriber.
#[derive(Debug)]
pub(crate) struct RecordedEvent {
    level: Level,
    fields: HashMap<String, String>,
    message: Option<String>,
}

impl RecordedEvent {
    pub(crate) const fn level(&self) -> Level { self.level }

    /// Formatted value of field `name`, if the event carried it.
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub(crate) fn message(&self) -> Option<&str> { self.message.as_deref() }
}

impl Visit for RecordedEvent {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }

    fn record_i64(&mut self, field: &Field, value: i64) { self.store(field, value.to_string()); }

    fn record_u64(&mut self, field: &Field, value: u64) { self.store(field, value.to_string()); }

    fn record_bool(&mut self, field: &Field, value: bool) { self.store(field, value.to_string()); }

    fn record_str(&mut self, field: &Field, value: &str) { self.store(field, value.to_owned()); }
}

impl RecordedEvent {
    fn new(level: Level) -> Self {
        Self {
            level,
            fields: HashMap::new(),
            message: None,
        }
    }

    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

#[derive(Clone, Default)]
struct EventLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventLog {
    fn lock(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Subscriber for EventLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool { true }

    fn new_span(&self, _attrs: &Attributes<'_>) -> Id { Id::from_u64(1) }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut recorded = RecordedEvent::new(*event.metadata().level());
        event.record(&mut recorded);
        self.lock().push(recorded);
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Run `f` with a capturing subscriber and return every event it emitted.
pub(crate) fn capture_events(f: impl FnOnce()) -> Vec<RecordedEvent> {
    let log = EventLog::default();
    tracing::dispatcher::with_default(&tracing::Dispatch::new(log.clone()), f);
    std::mem::take(&mut *log.lock())
}

/// Run `f` and return the single event it emitted.
///
/// # Panics
///
/// Panics when `f` emits no event or more than one.
pub(crate) fn capture_single_event(f: impl FnOnce()) -> RecordedEvent {
    let mut events = capture_events(f);
    assert_eq!(events.len(), 1, "expected exactly one tracing event");
    events.remove(0)
}
