//! Recording spans and log records for assertions.
//!
//! [`Capture`] installs a `tracing` subscriber for the current thread and
//! keeps every span (with all fields recorded on it, including those filled
//! in late through `Span::record`) and every event.
//!
//! Request tasks must run on the thread holding the guard, so pair it with
//! the default single-threaded `#[tokio::test]` runtime.
//!
//! ```rust
//! use mcpmod_testing::capture::Capture;
//!
//! let capture = Capture::new();
//! let _guard = capture.install();
//!
//! let span = tracing::info_span!("MCP", otel.name = tracing::field::Empty);
//! span.record("otel.name", "MCP ping");
//! tracing::info!(parent: &span, mcpMethod = "ping", "MCP request success");
//!
//! let event = &capture.events_with_message("MCP request success")[0];
//! assert_eq!(event.field("mcpMethod"), Some("ping"));
//! assert_eq!(capture.event_span(event).unwrap().field("otel.name"), Some("MCP ping"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A recorded span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSpan {
    /// Static span name.
    pub name: &'static str,
    /// Every field recorded so far, formatted.
    pub fields: BTreeMap<String, String>,
}

impl CapturedSpan {
    /// A field value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The exported name: `otel.name` when recorded, the static name
    /// otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.field("otel.name").unwrap_or(self.name)
    }
}

/// A recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Severity.
    pub level: Level,
    /// The message.
    pub message: String,
    /// Fields other than the message, formatted.
    pub fields: BTreeMap<String, String>,
    span: Option<usize>,
}

impl CapturedEvent {
    /// A field value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct State {
    spans: Vec<CapturedSpan>,
    live: HashMap<u64, usize>,
    events: Vec<CapturedEvent>,
}

/// Shared handle to everything recorded.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    state: Arc<Mutex<State>>,
}

impl Capture {
    /// An empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer feeding this capture.
    #[must_use]
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer {
            state: Arc::clone(&self.state),
        }
    }

    /// Make a subscriber feeding this capture the default for the current
    /// thread until the guard drops.
    #[must_use]
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.layer()))
    }

    /// Every span, in creation order.
    #[must_use]
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.lock().spans.clone()
    }

    /// Spans whose [display name](CapturedSpan::display_name) is `name`.
    #[must_use]
    pub fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.lock()
            .spans
            .iter()
            .filter(|span| span.display_name() == name)
            .cloned()
            .collect()
    }

    /// Every event, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    /// Events with the given message.
    #[must_use]
    pub fn events_with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.message == message)
            .cloned()
            .collect()
    }

    /// The span an event was emitted in, as it looks now.
    #[must_use]
    pub fn event_span(&self, event: &CapturedEvent) -> Option<CapturedSpan> {
        let state = self.lock();
        event.span.and_then(|index| state.spans.get(index).cloned())
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.spans.clear();
        state.live.clear();
        state.events.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The `tracing-subscriber` layer behind a [`Capture`].
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    state: Arc<Mutex<State>>,
}

impl CaptureLayer {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));

        let mut state = self.lock();
        let index = state.spans.len();
        state.spans.push(CapturedSpan {
            name: attrs.metadata().name(),
            fields,
        });
        // span ids are reused once closed, the newest span wins
        state.live.insert(id.into_u64(), index);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut state = self.lock();
        if let Some(&index) = state.live.get(&id.into_u64()) {
            values.record(&mut FieldVisitor(&mut state.spans[index].fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = fields.remove("message").unwrap_or_default();

        let parent = if event.is_contextual() {
            ctx.current_span().id().cloned()
        } else {
            event.parent().cloned()
        };

        let mut state = self.lock();
        let span = parent.and_then(|id| state.live.get(&id.into_u64()).copied());
        state.events.push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            span,
        });
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_late_records_are_kept() {
        let capture = Capture::new();
        let _guard = capture.install();

        let span = tracing::info_span!("MCP", otel.status_code = tracing::field::Empty);
        span.record("otel.status_code", "ok");

        let spans = capture.spans_named("MCP");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field("otel.status_code"), Some("ok"));
    }

    #[test]
    fn test_contextual_event_parent() {
        let capture = Capture::new();
        let _guard = capture.install();

        let span = tracing::info_span!("outer");
        span.in_scope(|| tracing::warn!(count = 3, "inside"));
        tracing::info!("outside");

        let inside = &capture.events_with_message("inside")[0];
        assert_eq!(inside.level, Level::WARN);
        assert_eq!(inside.field("count"), Some("3"));
        assert_eq!(capture.event_span(inside).unwrap().name, "outer");

        let outside = &capture.events_with_message("outside")[0];
        assert!(capture.event_span(outside).is_none());
    }

    #[test]
    fn test_clear() {
        let capture = Capture::new();
        let _guard = capture.install();
        tracing::info!("one");
        capture.clear();
        assert!(capture.events().is_empty());
    }
}
