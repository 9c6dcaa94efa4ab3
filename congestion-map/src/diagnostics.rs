//! # Diagnostics ring buffer
//!
//! A [`tracing_subscriber::Layer`] that keeps the most recent log events in memory,
//! so a front end can show them in an on-screen debug panel.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt::{Debug, Display, Formatter, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub at: DateTime<Local>,
    pub level: Level,
    /// The event message followed by its fields, rendered as `key=value`.
    pub message: String,
}

impl Display for DiagnosticEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {:>5} {}",
            self.at.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Bounded, shareable log of recent events. Cloning shares the buffer.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: Arc<Mutex<VecDeque<DiagnosticEntry>>>,
    capacity: usize,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock can't leave the buffer in a bad state
    fn lock(&self) -> MutexGuard<'_, VecDeque<DiagnosticEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retained entries, newest first.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn push(&self, level: Level, message: String) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        entries.truncate(self.capacity - 1);
        entries.push_front(DiagnosticEntry {
            at: Local::now(),
            level,
            message,
        });
    }

    /// Installs this log as part of the global subscriber,
    /// next to a `fmt` layer filtered by `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber was already set.
    pub fn try_init(&self) -> Result<(), TryInitError> {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_filter(filter))
            .with(self.clone())
            .try_init()
    }
}

/// Rendered fields of an open span, appended to every event inside it.
struct SpanFields(String);

impl<S> Layer<S> for DiagnosticLog
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = MessageVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields));
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    visitor.fields.push_str(&fields.0);
                }
            }
        }
        self.push(*event.metadata().level(), visitor.finish());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            // Writing to a String can't fail
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}
